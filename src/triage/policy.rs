//! Escalation policy constants.
//!
//! Thresholds, critical symptoms and follow-up delays are clinical policy,
//! tuned per deployment. They live here, in one serde-loadable struct, and
//! nowhere else.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config;
use crate::models::UrgencyTier;

use super::types::{FollowUpDelay, TriageError};

/// Follow-up delay per urgency tier, in minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowUpDelays {
    /// Nurse rings back within minutes.
    pub urgent_minutes: u32,
    /// Nurse rings back within the hour.
    pub moderate_minutes: u32,
    /// Next scheduled check-in.
    pub routine_minutes: u32,
}

impl Default for FollowUpDelays {
    fn default() -> Self {
        Self {
            urgent_minutes: 10,
            moderate_minutes: 60,
            routine_minutes: 7 * 24 * 60,
        }
    }
}

impl FollowUpDelays {
    pub fn for_tier(&self, tier: UrgencyTier) -> FollowUpDelay {
        FollowUpDelay::from_minutes(match tier {
            UrgencyTier::Urgent => self.urgent_minutes,
            UrgencyTier::Moderate => self.moderate_minutes,
            UrgencyTier::Routine => self.routine_minutes,
        })
    }
}

/// Escalation policy applied by the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriagePolicy {
    /// Severity at or above which a symptom is urgent (0-10 scale).
    pub urgent_severity: f64,
    /// Severity at or above which a symptom is moderate.
    pub moderate_severity: f64,
    /// Yes/no symptoms that escalate to urgent whenever answered yes.
    pub critical_symptoms: Vec<String>,
    pub follow_up_delays: FollowUpDelays,
}

impl Default for TriagePolicy {
    fn default() -> Self {
        Self {
            urgent_severity: 7.0,
            moderate_severity: 3.0,
            critical_symptoms: ["chest_pain", "confusion", "dyspnea_rest", "seizure", "unresponsive"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            follow_up_delays: FollowUpDelays::default(),
        }
    }
}

impl TriagePolicy {
    /// Parse and check a policy document.
    pub fn from_json_str(json: &str) -> Result<Self, TriageError> {
        let policy: TriagePolicy = serde_json::from_str(json)
            .map_err(|e| TriageError::PolicyParse("policy".into(), e.to_string()))?;
        policy.validate()?;
        Ok(policy)
    }

    /// Load a policy file.
    pub fn load(path: &Path) -> Result<Self, TriageError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| TriageError::PolicyLoad(path.display().to_string(), e.to_string()))?;
        let policy: TriagePolicy = serde_json::from_str(&json)
            .map_err(|e| TriageError::PolicyParse(path.display().to_string(), e.to_string()))?;
        policy.validate()?;
        tracing::info!(path = %path.display(), "Triage policy loaded");
        Ok(policy)
    }

    /// Load the configured policy file, or the defaults when there is none.
    /// A file that exists but does not parse is an error, not a fallback.
    pub fn load_or_default() -> Result<Self, TriageError> {
        match config::policy_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                tracing::debug!("No triage policy file, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn validate(&self) -> Result<(), TriageError> {
        if !self.urgent_severity.is_finite() || !self.moderate_severity.is_finite() {
            return Err(TriageError::InvalidPolicy(
                "severity thresholds must be finite".into(),
            ));
        }
        if self.moderate_severity > self.urgent_severity {
            return Err(TriageError::InvalidPolicy(format!(
                "moderate threshold {} is above urgent threshold {}",
                self.moderate_severity, self.urgent_severity
            )));
        }
        Ok(())
    }

    pub fn is_critical(&self, symptom_key: &str) -> bool {
        self.critical_symptoms.iter().any(|k| k == symptom_key)
    }
}
