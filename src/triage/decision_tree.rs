//! Decision tree evaluation.
//!
//! Nodes are evaluated flat, in declared order. `next_node_id` is kept on the
//! node for authoring tools but does not steer evaluation. Default nodes are
//! a baseline: they fire only when the patient answered something and no
//! specific node matched.

use std::collections::HashSet;

use crate::models::{Condition, ConditionValue, DecisionNode, Id, Intervention, Protocol, SymptomMap, SymptomValue};

/// Intervention ids triggered by the symptom map, de-duplicated in
/// first-match order.
pub fn evaluate_nodes(nodes: &[DecisionNode], symptoms: &SymptomMap) -> Vec<Id> {
    let mut triggered = TriggeredIds::default();
    let mut specific_match = false;

    for node in nodes.iter().filter(|n| !n.condition.is_default()) {
        let Some(key) = node.symptom_key.as_deref() else {
            tracing::debug!(node_id = %node.id, "Node without symptom key skipped");
            continue;
        };
        let Some(value) = symptoms.get(key) else {
            continue;
        };
        if condition_matches(&node.condition, value) {
            specific_match = true;
            triggered.extend(&node.intervention_ids);
        }
    }

    if !specific_match && !symptoms.is_empty() {
        for node in nodes.iter().filter(|n| n.condition.is_default()) {
            triggered.extend(&node.intervention_ids);
        }
    }

    triggered.ids
}

/// Resolve triggered ids to the protocol's interventions, preserving order.
/// Ids the protocol does not define are dropped.
pub fn resolve_interventions(protocol: &Protocol, ids: &[Id]) -> Vec<Intervention> {
    ids.iter()
        .filter_map(|id| {
            let found = protocol.intervention(id);
            if found.is_none() {
                tracing::debug!(
                    protocol_id = %protocol.id,
                    intervention_id = %id,
                    "Triggered intervention not defined by protocol"
                );
            }
            found.cloned()
        })
        .collect()
}

/// Whether a node's condition holds for a symptom value.
///
/// Ordering comparisons need a numeric reading; a value that has none never
/// matches. Equality follows the type of the condition value.
pub fn condition_matches(condition: &Condition, value: &SymptomValue) -> bool {
    match condition {
        Condition::GreaterThan(t) => value.as_number().is_some_and(|v| v > *t),
        Condition::AtLeast(t) => value.as_number().is_some_and(|v| v >= *t),
        Condition::LessThan(t) => value.as_number().is_some_and(|v| v < *t),
        Condition::AtMost(t) => value.as_number().is_some_and(|v| v <= *t),
        Condition::Equals(expected) => values_equal(value, expected),
        Condition::NotEquals(expected) => !values_equal(value, expected),
        Condition::In(members) => members.iter().any(|m| values_equal(value, m)),
        Condition::Default => true,
    }
}

fn values_equal(value: &SymptomValue, expected: &ConditionValue) -> bool {
    match expected {
        ConditionValue::Bool(b) => value.as_bool() == Some(*b),
        ConditionValue::Number(n) => value.as_number() == Some(*n),
        ConditionValue::Text(t) => match value {
            SymptomValue::Text(s) => s == t,
            SymptomValue::Flag(b) => SymptomValue::Text(t.clone()).as_bool() == Some(*b),
            SymptomValue::Severity(v) => t.trim().parse::<f64>().ok() == Some(*v),
        },
    }
}

#[derive(Default)]
struct TriggeredIds {
    ids: Vec<Id>,
    seen: HashSet<Id>,
}

impl TriggeredIds {
    fn extend(&mut self, ids: &[Id]) {
        for id in ids {
            if self.seen.insert(id.clone()) {
                self.ids.push(id.clone());
            }
        }
    }
}
