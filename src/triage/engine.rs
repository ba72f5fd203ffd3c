use std::time::Instant;

use crate::models::{Protocol, Responses};

use super::assemble::assemble;
use super::decision_tree::{evaluate_nodes, resolve_interventions};
use super::escalation::{classify, routine};
use super::normalize::normalize_responses;
use super::policy::TriagePolicy;
use super::types::{TriageAssessment, TriageEngine, TriageResult};

/// Default implementation of the triage engine.
/// Stateless apart from its policy; safe to share across threads.
#[derive(Debug, Clone, Default)]
pub struct DefaultTriageEngine {
    policy: TriagePolicy,
}

impl DefaultTriageEngine {
    pub fn new(policy: TriagePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &TriagePolicy {
        &self.policy
    }
}

impl TriageEngine for DefaultTriageEngine {
    fn assess(&self, protocol: &Protocol, responses: &Responses) -> TriageAssessment {
        let start = Instant::now();

        if !protocol.active {
            tracing::warn!(protocol_id = %protocol.id, "Evaluating against an inactive protocol");
        }

        let symptoms = normalize_responses(responses, &protocol.questions);
        let triggered = evaluate_nodes(&protocol.decision_nodes, &symptoms);
        let interventions = resolve_interventions(protocol, &triggered);

        // A protocol without a decision tree carries no triage rules to act on.
        let verdict = if protocol.decision_nodes.is_empty() {
            tracing::debug!(protocol_id = %protocol.id, "Protocol has no decision nodes");
            routine(&self.policy)
        } else {
            classify(&interventions, &symptoms, &self.policy)
        };
        let result = assemble(Some(interventions), verdict);

        tracing::info!(
            protocol_id = %protocol.id,
            version = %protocol.version,
            answered = responses.len(),
            symptoms = symptoms.len(),
            interventions = result.matched_interventions.len(),
            tier = result.urgency_tier.as_str(),
            processing_us = start.elapsed().as_micros() as u64,
            "Triage evaluation complete"
        );

        TriageAssessment {
            protocol_id: protocol.id.clone(),
            protocol_version: protocol.version.clone(),
            symptoms,
            result,
        }
    }
}

/// Evaluate responses against a protocol under the default policy.
pub fn evaluate(protocol: &Protocol, responses: &Responses) -> TriageResult {
    DefaultTriageEngine::default().evaluate(protocol, responses)
}
