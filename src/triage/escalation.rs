//! Escalation classification.
//!
//! Rules are checked by tier, most severe first; the first tier with any
//! firing rule wins:
//!
//! - urgent: an urgent intervention, a severity at or above the urgent
//!   threshold, or a critical yes/no symptom answered yes
//! - moderate: a high-priority intervention, or a severity in the moderate band
//! - routine: otherwise

use crate::models::{Intervention, InterventionPriority, SymptomMap, SymptomValue, UrgencyTier};

use super::policy::TriagePolicy;
use super::types::{EscalationReason, EscalationVerdict, FollowUp};

/// Classify a triggered intervention set and symptom map into an urgency tier
/// and follow-up recommendation. Never fails; an empty symptom map is routine.
pub fn classify(
    interventions: &[Intervention],
    symptoms: &SymptomMap,
    policy: &TriagePolicy,
) -> EscalationVerdict {
    if symptoms.is_empty() {
        return routine(policy);
    }

    let urgent = urgent_reasons(interventions, symptoms, policy);
    if !urgent.is_empty() {
        return verdict(UrgencyTier::Urgent, urgent, policy);
    }

    let moderate = moderate_reasons(interventions, symptoms, policy);
    if !moderate.is_empty() {
        return verdict(UrgencyTier::Moderate, moderate, policy);
    }

    routine(policy)
}

/// Routine verdict with the policy's routine delay and no follow-up.
pub fn routine(policy: &TriagePolicy) -> EscalationVerdict {
    verdict(UrgencyTier::Routine, Vec::new(), policy)
}

fn urgent_reasons(
    interventions: &[Intervention],
    symptoms: &SymptomMap,
    policy: &TriagePolicy,
) -> Vec<EscalationReason> {
    let flagged = interventions
        .iter()
        .filter(|i| i.priority == Some(InterventionPriority::Urgent))
        .map(|i| EscalationReason::UrgentIntervention { intervention_id: i.id.clone() });

    let severe = symptoms
        .severities()
        .filter(|(_, s)| *s >= policy.urgent_severity)
        .map(|(key, severity)| EscalationReason::SevereSymptom {
            symptom_key: key.to_string(),
            severity,
        });

    let critical = symptoms
        .iter()
        .filter(|(key, value)| **value == SymptomValue::Flag(true) && policy.is_critical(key))
        .map(|(key, _)| EscalationReason::CriticalSymptom { symptom_key: key.to_string() });

    flagged.chain(severe).chain(critical).collect()
}

fn moderate_reasons(
    interventions: &[Intervention],
    symptoms: &SymptomMap,
    policy: &TriagePolicy,
) -> Vec<EscalationReason> {
    let flagged = interventions
        .iter()
        .filter(|i| i.priority == Some(InterventionPriority::High))
        .map(|i| EscalationReason::HighPriorityIntervention { intervention_id: i.id.clone() });

    let banded = symptoms
        .severities()
        .filter(|(_, s)| *s >= policy.moderate_severity && *s < policy.urgent_severity)
        .map(|(key, severity)| EscalationReason::ModerateSymptom {
            symptom_key: key.to_string(),
            severity,
        });

    flagged.chain(banded).collect()
}

fn verdict(tier: UrgencyTier, reasons: Vec<EscalationReason>, policy: &TriagePolicy) -> EscalationVerdict {
    EscalationVerdict {
        urgency_tier: tier,
        follow_up: FollowUp {
            needed: tier != UrgencyTier::Routine,
            priority: tier.follow_up_priority(),
            suggested_delay: policy.follow_up_delays.for_tier(tier),
        },
        reasons,
    }
}
