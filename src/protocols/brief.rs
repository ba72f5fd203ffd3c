//! Call brief: the part of a protocol a caller needs during a check-in call.
//!
//! Lists the questions in asking order with their answer hints, and sorts
//! decision nodes into the conditions that will escalate to urgent or
//! moderate under a policy. Rendering into a script is left to the caller.

use serde::{Deserialize, Serialize};

use crate::models::{
    AnswerType, Condition, ConditionValue, DecisionNode, Id, InterventionPriority, Protocol,
    ProtocolCategory, UrgencyTier,
};
use crate::triage::{FollowUpDelays, TriagePolicy};

/// How a question expects to be answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerHint {
    Scale { min: f64, max: f64 },
    Options { choices: Vec<String> },
    YesNo,
    FreeText,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BriefQuestion {
    /// 1-based asking order.
    pub order: usize,
    pub question_id: Id,
    pub text: String,
    pub hint: AnswerHint,
}

/// A decision node condition that escalates when met.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationCondition {
    pub node_id: Id,
    pub symptom_key: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallBrief {
    pub protocol_id: Id,
    pub protocol_name: String,
    pub category: ProtocolCategory,
    pub questions: Vec<BriefQuestion>,
    pub urgent_conditions: Vec<EscalationCondition>,
    pub moderate_conditions: Vec<EscalationCondition>,
    /// Any score at or above this is urgent, whatever the tree says.
    pub urgent_severity: f64,
    pub moderate_severity: f64,
    pub follow_up_delays: FollowUpDelays,
}

impl CallBrief {
    pub fn from_protocol(protocol: &Protocol, policy: &TriagePolicy) -> Self {
        let questions = protocol
            .questions
            .iter()
            .enumerate()
            .map(|(i, q)| BriefQuestion {
                order: i + 1,
                question_id: q.id.clone(),
                text: q.text.clone(),
                hint: match q.answer_type {
                    AnswerType::Numeric => AnswerHint::Scale {
                        min: q.min.unwrap_or(0.0),
                        max: q.max.unwrap_or(10.0),
                    },
                    AnswerType::Choice if !q.choices.is_empty() => AnswerHint::Options {
                        choices: q.choices.clone(),
                    },
                    AnswerType::Boolean => AnswerHint::YesNo,
                    AnswerType::Choice | AnswerType::Text => AnswerHint::FreeText,
                },
            })
            .collect();

        let mut urgent_conditions = Vec::new();
        let mut moderate_conditions = Vec::new();
        for node in &protocol.decision_nodes {
            let Some(key) = node.symptom_key.as_deref() else {
                continue;
            };
            if node.condition.is_default() {
                continue;
            }
            let entry = EscalationCondition {
                node_id: node.id.clone(),
                symptom_key: key.to_string(),
                description: describe(key, &node.condition),
            };
            match node_tier(protocol, node, key, policy) {
                UrgencyTier::Urgent => urgent_conditions.push(entry),
                UrgencyTier::Moderate => moderate_conditions.push(entry),
                UrgencyTier::Routine => {}
            }
        }

        Self {
            protocol_id: protocol.id.clone(),
            protocol_name: protocol.name.clone(),
            category: protocol.category,
            questions,
            urgent_conditions,
            moderate_conditions,
            urgent_severity: policy.urgent_severity,
            moderate_severity: policy.moderate_severity,
            follow_up_delays: policy.follow_up_delays.clone(),
        }
    }
}

/// The tier a node escalates to: from its threshold, a yes-answer test on a
/// critical symptom, or the priority of the interventions it triggers,
/// whichever is highest. Mirrors the rules the classifier applies.
fn node_tier(
    protocol: &Protocol,
    node: &DecisionNode,
    key: &str,
    policy: &TriagePolicy,
) -> UrgencyTier {
    let by_condition = match &node.condition {
        Condition::GreaterThan(t) | Condition::AtLeast(t) if *t >= policy.urgent_severity => {
            UrgencyTier::Urgent
        }
        Condition::GreaterThan(t) | Condition::AtLeast(t) if *t >= policy.moderate_severity => {
            UrgencyTier::Moderate
        }
        Condition::Equals(ConditionValue::Bool(true)) if policy.is_critical(key) => {
            UrgencyTier::Urgent
        }
        _ => UrgencyTier::Routine,
    };

    let by_intervention = node
        .intervention_ids
        .iter()
        .filter_map(|id| protocol.intervention(id).and_then(|i| i.priority))
        .map(|priority| match priority {
            InterventionPriority::Urgent => UrgencyTier::Urgent,
            InterventionPriority::High => UrgencyTier::Moderate,
            InterventionPriority::Medium | InterventionPriority::Low => UrgencyTier::Routine,
        })
        .max()
        .unwrap_or(UrgencyTier::Routine);

    by_condition.max(by_intervention)
}

fn describe(key: &str, condition: &Condition) -> String {
    match condition {
        Condition::GreaterThan(t) => format!("{key} above {t}"),
        Condition::AtLeast(t) => format!("{key} at or above {t}"),
        Condition::LessThan(t) => format!("{key} below {t}"),
        Condition::AtMost(t) => format!("{key} at or below {t}"),
        Condition::Equals(ConditionValue::Bool(true)) => format!("{key} is present"),
        Condition::Equals(ConditionValue::Bool(false)) => format!("{key} is absent"),
        Condition::Equals(v) => format!("{key} is {}", literal(v)),
        Condition::NotEquals(v) => format!("{key} is not {}", literal(v)),
        Condition::In(members) => format!(
            "{key} is one of {}",
            members.iter().map(literal).collect::<Vec<_>>().join(", ")
        ),
        Condition::Default => format!("{key} baseline"),
    }
}

fn literal(value: &ConditionValue) -> String {
    match value {
        ConditionValue::Bool(b) => b.to_string(),
        ConditionValue::Number(n) => n.to_string(),
        ConditionValue::Text(t) => t.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::models::{AnswerType, Question, Responses};
    use crate::protocols::builtin_protocol;
    use crate::triage::evaluate;

    fn brief(category: ProtocolCategory) -> CallBrief {
        let protocol = builtin_protocol(category).unwrap().unwrap();
        CallBrief::from_protocol(&protocol, &TriagePolicy::default())
    }

    fn keys(conditions: &[EscalationCondition]) -> Vec<&str> {
        conditions.iter().map(|c| c.symptom_key.as_str()).collect()
    }

    #[test]
    fn questions_keep_asking_order_and_hints() {
        let b = brief(ProtocolCategory::Copd);
        assert_eq!(b.questions.len(), 15);
        assert_eq!(b.questions[0].order, 1);
        assert_eq!(b.questions[0].hint, AnswerHint::Scale { min: 0.0, max: 10.0 });
        assert!(matches!(&b.questions[1].hint, AnswerHint::Options { choices } if choices.contains(&"Green".to_string())));
        assert_eq!(b.questions[4].hint, AnswerHint::YesNo);
    }

    #[test]
    fn copd_conditions_are_sorted_by_tier() {
        let b = brief(ProtocolCategory::Copd);
        assert_eq!(keys(&b.urgent_conditions), vec!["dyspnea", "edema"]);
        assert_eq!(keys(&b.moderate_conditions), vec!["sputum", "fever", "rescue_inhaler"]);
        assert_eq!(b.moderate_conditions[0].description, "sputum is one of Green, Blood-tinged");
    }

    #[test]
    fn threshold_only_protocol_uses_policy_bands() {
        let b = brief(ProtocolCategory::Cancer);
        assert_eq!(keys(&b.urgent_conditions), vec!["pain", "nausea", "fatigue"]);
        assert_eq!(keys(&b.moderate_conditions), vec!["pain"]);
        assert_eq!(b.urgent_conditions[0].description, "pain at or above 7");
        assert_eq!(b.follow_up_delays.urgent_minutes, 10);
    }

    #[test]
    fn text_question_gets_free_text_hint() {
        let b = brief(ProtocolCategory::Cancer);
        assert_eq!(b.questions[1].hint, AnswerHint::FreeText);
    }

    #[test]
    fn yes_answer_is_urgent_only_for_critical_symptoms() {
        let b = brief(ProtocolCategory::HeartFailure);
        assert_eq!(keys(&b.urgent_conditions), vec!["dyspnea_rest", "chest_pain"]);
        assert!(keys(&b.moderate_conditions).contains(&"edema"));

        let mut hf = builtin_protocol(ProtocolCategory::HeartFailure).unwrap().unwrap();
        for intervention in &mut hf.interventions {
            intervention.priority = None;
        }
        let b = CallBrief::from_protocol(&hf, &TriagePolicy::default());
        assert_eq!(keys(&b.urgent_conditions), vec!["dyspnea_rest", "chest_pain"]);
        assert!(b.moderate_conditions.is_empty());
    }

    /// First keyed question able to carry a scored, yes/no or choice answer.
    fn question_for<'a>(protocol: &'a Protocol, key: &str) -> &'a Question {
        protocol
            .questions
            .iter()
            .filter(|q| q.symptom_key.as_deref() == Some(key))
            .find(|q| q.answer_type != AnswerType::Text)
            .unwrap()
    }

    fn satisfying_answer(question: &Question, condition: &Condition) -> Value {
        match condition {
            Condition::GreaterThan(t) => json!(t + 1.0),
            Condition::LessThan(t) => json!(t - 1.0),
            Condition::AtLeast(t) | Condition::AtMost(t) => json!(t),
            Condition::Equals(v) => v.to_json(),
            Condition::In(members) => members[0].to_json(),
            Condition::NotEquals(v) => question
                .choices
                .iter()
                .map(|c| json!(c))
                .find(|c| *c != v.to_json())
                .unwrap_or_else(|| json!("something else")),
            Condition::Default => Value::Null,
        }
    }

    #[test]
    fn brief_tiers_agree_with_evaluation() {
        for category in [
            ProtocolCategory::Cancer,
            ProtocolCategory::HeartFailure,
            ProtocolCategory::Copd,
            ProtocolCategory::Fit,
        ] {
            let protocol = builtin_protocol(category).unwrap().unwrap();
            let b = CallBrief::from_protocol(&protocol, &TriagePolicy::default());

            let tiers = [
                (&b.urgent_conditions, UrgencyTier::Urgent),
                (&b.moderate_conditions, UrgencyTier::Moderate),
            ];
            for (conditions, expected) in tiers {
                for entry in conditions.iter() {
                    let node = protocol.node(&entry.node_id).unwrap();
                    let question = question_for(&protocol, &entry.symptom_key);
                    let answer = satisfying_answer(question, &node.condition);
                    let responses = Responses::new().with(question.id.clone(), answer);

                    let result = evaluate(&protocol, &responses);
                    assert_eq!(
                        result.urgency_tier, expected,
                        "{category} node {} ({})",
                        entry.node_id, entry.description
                    );
                }
            }
        }
    }
}
