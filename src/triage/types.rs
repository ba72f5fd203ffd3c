use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{
    FollowUpPriority, Id, Intervention, Protocol, ProtocolCategory, ProtocolError,
    ProtocolVersion, Responses, SymptomMap, UrgencyTier,
};
use crate::protocols::ProtocolStore;

// ---------------------------------------------------------------------------
// FollowUp
// ---------------------------------------------------------------------------

/// Suggested wait before the next contact, in whole minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FollowUpDelay(u32);

impl FollowUpDelay {
    pub fn from_minutes(minutes: u32) -> Self {
        Self(minutes)
    }

    pub fn minutes(&self) -> u32 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.0))
    }
}

/// Whether, how urgently, and how soon a nurse should follow up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUp {
    pub needed: bool,
    /// Set only when a follow-up is needed.
    pub priority: Option<FollowUpPriority>,
    pub suggested_delay: FollowUpDelay,
}

impl FollowUp {
    /// When the follow-up falls due, counted from the assessment time.
    /// `None` when no follow-up is needed.
    pub fn due_at(&self, from: NaiveDateTime) -> Option<NaiveDateTime> {
        self.needed.then(|| from + self.suggested_delay.as_duration())
    }
}

// ---------------------------------------------------------------------------
// Escalation
// ---------------------------------------------------------------------------

/// Which escalation rule fired, and on what.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum EscalationReason {
    /// A triggered intervention is flagged urgent.
    UrgentIntervention { intervention_id: Id },
    /// A symptom scored at or above the urgent threshold.
    SevereSymptom { symptom_key: String, severity: f64 },
    /// A critical yes/no symptom was answered yes.
    CriticalSymptom { symptom_key: String },
    /// A triggered intervention is flagged high priority.
    HighPriorityIntervention { intervention_id: Id },
    /// A symptom scored in the moderate band.
    ModerateSymptom { symptom_key: String, severity: f64 },
}

impl EscalationReason {
    pub fn tier(&self) -> UrgencyTier {
        match self {
            Self::UrgentIntervention { .. }
            | Self::SevereSymptom { .. }
            | Self::CriticalSymptom { .. } => UrgencyTier::Urgent,
            Self::HighPriorityIntervention { .. } | Self::ModerateSymptom { .. } => {
                UrgencyTier::Moderate
            }
        }
    }
}

/// Output of the escalation classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationVerdict {
    pub urgency_tier: UrgencyTier,
    pub follow_up: FollowUp,
    /// Rules of the winning tier that fired. Empty for routine.
    pub reasons: Vec<EscalationReason>,
}

// ---------------------------------------------------------------------------
// TriageResult
// ---------------------------------------------------------------------------

/// Outcome of one protocol evaluation. Deterministic for a given protocol,
/// response set and policy: no ids, no timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageResult {
    pub matched_interventions: Vec<Intervention>,
    pub urgency_tier: UrgencyTier,
    pub follow_up: FollowUp,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<EscalationReason>,
}

impl TriageResult {
    /// Clinician override: follow up even though the classifier did not ask
    /// for it. The tier is left untouched.
    pub fn with_follow_up_forced(mut self) -> Self {
        if !self.follow_up.needed {
            self.follow_up.needed = true;
            self.follow_up.priority = Some(FollowUpPriority::Low);
        }
        self
    }

    /// Fields written onto the assessment record by the persistence layer.
    pub fn assessment_fields(&self, assessed_at: NaiveDateTime) -> AssessmentFields {
        AssessmentFields {
            interventions: self.matched_interventions.clone(),
            follow_up_needed: self.follow_up.needed,
            follow_up_priority: self.follow_up.priority,
            follow_up_date: self.follow_up.due_at(assessed_at),
        }
    }
}

/// Assessment-record projection of a [`TriageResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentFields {
    pub interventions: Vec<Intervention>,
    pub follow_up_needed: bool,
    pub follow_up_priority: Option<FollowUpPriority>,
    pub follow_up_date: Option<NaiveDateTime>,
}

/// A triage result together with the inputs a caller needs to persist it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageAssessment {
    pub protocol_id: Id,
    pub protocol_version: ProtocolVersion,
    pub symptoms: SymptomMap,
    pub result: TriageResult,
}

// ---------------------------------------------------------------------------
// TriageError
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("No protocol supplied for evaluation")]
    NoProtocol,

    #[error("No active protocol for category {0}")]
    NoActiveProtocol(ProtocolCategory),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Policy load failed ({0}): {1}")]
    PolicyLoad(String, String),

    #[error("Policy parse failed ({0}): {1}")]
    PolicyParse(String, String),

    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),
}

// ---------------------------------------------------------------------------
// TriageEngine trait
// ---------------------------------------------------------------------------

/// Evaluates patient responses against a clinical protocol.
pub trait TriageEngine {
    /// Normalize, run the decision tree, classify and assemble.
    fn assess(&self, protocol: &Protocol, responses: &Responses) -> TriageAssessment;

    /// Triage result only.
    fn evaluate(&self, protocol: &Protocol, responses: &Responses) -> TriageResult {
        self.assess(protocol, responses).result
    }

    /// Assess against a protocol that may not have been found.
    fn assess_selected(
        &self,
        protocol: Option<&Protocol>,
        responses: &Responses,
    ) -> Result<TriageAssessment, TriageError> {
        let protocol = protocol.ok_or(TriageError::NoProtocol)?;
        Ok(self.assess(protocol, responses))
    }

    /// Assess against the latest active protocol of a category.
    fn assess_active(
        &self,
        store: &dyn ProtocolStore,
        category: ProtocolCategory,
        responses: &Responses,
    ) -> Result<TriageAssessment, TriageError> {
        match store.latest_active(category)? {
            Some(protocol) => Ok(self.assess(&protocol, responses)),
            None => {
                tracing::warn!(category = category.as_str(), "No active protocol for category");
                Err(TriageError::NoActiveProtocol(category))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn routine() -> TriageResult {
        TriageResult {
            matched_interventions: Vec::new(),
            urgency_tier: UrgencyTier::Routine,
            follow_up: FollowUp {
                needed: false,
                priority: None,
                suggested_delay: FollowUpDelay::from_minutes(10_080),
            },
            reasons: Vec::new(),
        }
    }

    #[test]
    fn due_at_adds_delay_only_when_needed() {
        let mut follow_up = FollowUp {
            needed: true,
            priority: Some(FollowUpPriority::High),
            suggested_delay: FollowUpDelay::from_minutes(10),
        };
        assert_eq!(follow_up.due_at(at(9, 0)), Some(at(9, 10)));

        follow_up.needed = false;
        assert_eq!(follow_up.due_at(at(9, 0)), None);
    }

    #[test]
    fn forced_follow_up_keeps_tier() {
        let result = routine().with_follow_up_forced();
        assert!(result.follow_up.needed);
        assert_eq!(result.follow_up.priority, Some(FollowUpPriority::Low));
        assert_eq!(result.urgency_tier, UrgencyTier::Routine);
    }

    #[test]
    fn forcing_does_not_downgrade_priority() {
        let mut result = routine();
        result.follow_up.needed = true;
        result.follow_up.priority = Some(FollowUpPriority::High);
        let result = result.with_follow_up_forced();
        assert_eq!(result.follow_up.priority, Some(FollowUpPriority::High));
    }

    #[test]
    fn assessment_fields_for_routine_have_no_date() {
        let fields = routine().assessment_fields(at(12, 0));
        assert!(!fields.follow_up_needed);
        assert_eq!(fields.follow_up_priority, None);
        assert_eq!(fields.follow_up_date, None);
    }

    #[test]
    fn reasons_map_to_tiers() {
        let severe = EscalationReason::SevereSymptom { symptom_key: "pain".into(), severity: 8.0 };
        let high = EscalationReason::HighPriorityIntervention { intervention_id: Id::from(2) };
        assert_eq!(severe.tier(), UrgencyTier::Urgent);
        assert_eq!(high.tier(), UrgencyTier::Moderate);
    }

    #[test]
    fn reason_serializes_with_rule_tag() {
        let reason = EscalationReason::CriticalSymptom { symptom_key: "chest_pain".into() };
        let json = serde_json::to_value(&reason).unwrap();
        assert_eq!(json["rule"], "critical_symptom");
        assert_eq!(json["symptom_key"], "chest_pain");
    }
}
