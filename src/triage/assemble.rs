use crate::models::Intervention;

use super::types::{EscalationVerdict, TriageResult};

/// Combine the resolved interventions and the classifier verdict.
/// A missing intervention list is treated as empty.
pub fn assemble(interventions: Option<Vec<Intervention>>, verdict: EscalationVerdict) -> TriageResult {
    TriageResult {
        matched_interventions: interventions.unwrap_or_default(),
        urgency_tier: verdict.urgency_tier,
        follow_up: verdict.follow_up,
        reasons: verdict.reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FollowUpPriority, UrgencyTier};
    use crate::triage::types::{FollowUp, FollowUpDelay};

    #[test]
    fn absent_interventions_become_empty() {
        let verdict = EscalationVerdict {
            urgency_tier: UrgencyTier::Moderate,
            follow_up: FollowUp {
                needed: true,
                priority: Some(FollowUpPriority::Medium),
                suggested_delay: FollowUpDelay::from_minutes(60),
            },
            reasons: Vec::new(),
        };

        let result = assemble(None, verdict);
        assert!(result.matched_interventions.is_empty());
        assert_eq!(result.urgency_tier, UrgencyTier::Moderate);
        assert_eq!(result.follow_up.priority, Some(FollowUpPriority::Medium));
    }
}
