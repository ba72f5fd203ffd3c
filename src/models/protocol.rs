use std::cmp::Ordering;
use std::fmt;
use std::path::Path;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::condition::Condition;
use super::enums::{AnswerType, InterventionPriority, ProtocolCategory};
use super::ids::Id;
use super::ProtocolError;

// ---------------------------------------------------------------------------
// ProtocolVersion
// ---------------------------------------------------------------------------

/// Protocol version string, ordered segment by segment ("1.10" > "1.9").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProtocolVersion(String);

impl ProtocolVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn segments(&self) -> impl Iterator<Item = &str> {
        let trimmed = self.0.trim();
        let trimmed = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);
        trimmed.split('.')
    }
}

impl Ord for ProtocolVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let mut a = self.segments();
        let mut b = other.segments();
        loop {
            let ordering = match (a.next(), b.next()) {
                (None, None) => break,
                (x, y) => compare_segment(x.unwrap_or("0"), y.unwrap_or("0")),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        // "1.0" and "1.0.0" sort together; raw text keeps the order total.
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for ProtocolVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Numeric segments sort before textual ones ("1.10" < "1.rc").
fn compare_segment(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProtocolVersion {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Serialize for ProtocolVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ProtocolVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(Self(s)),
            Value::Number(n) => Ok(Self(n.to_string())),
            other => Err(D::Error::custom(format!("invalid protocol version: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Question
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: Id,
    pub text: String,
    #[serde(alias = "type")]
    pub answer_type: AnswerType,
    /// Symptom dimension the answer feeds. Unkeyed questions are recorded
    /// with the responses but never reach the decision tree.
    #[serde(default, alias = "symptom_type", skip_serializing_if = "Option::is_none")]
    pub symptom_key: Option<String>,
    #[serde(default, alias = "min_value", skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, alias = "max_value", skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub required: bool,
}

// ---------------------------------------------------------------------------
// DecisionNode
// ---------------------------------------------------------------------------

/// One rule of a protocol's decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDecisionNode", into = "RawDecisionNode")]
pub struct DecisionNode {
    pub id: Id,
    pub symptom_key: Option<String>,
    pub condition: Condition,
    /// Documentation-only chaining hint; evaluation does not follow it.
    pub next_node_id: Option<Id>,
    pub intervention_ids: Vec<Id>,
}

/// Wire shape of a decision node, before the condition is parsed.
#[derive(Serialize, Deserialize)]
struct RawDecisionNode {
    id: Id,
    #[serde(default, alias = "symptom_type", skip_serializing_if = "Option::is_none")]
    symptom_key: Option<String>,
    condition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(default)]
    next_node_id: Option<Id>,
    #[serde(default)]
    intervention_ids: Vec<Id>,
}

impl TryFrom<RawDecisionNode> for DecisionNode {
    type Error = ProtocolError;

    fn try_from(raw: RawDecisionNode) -> Result<Self, Self::Error> {
        let condition = Condition::parse(&raw.condition, raw.value.as_ref()).map_err(|e| {
            ProtocolError::InvalidNode {
                node_id: raw.id.to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            id: raw.id,
            symptom_key: raw.symptom_key,
            condition,
            next_node_id: raw.next_node_id,
            intervention_ids: raw.intervention_ids,
        })
    }
}

impl From<DecisionNode> for RawDecisionNode {
    fn from(node: DecisionNode) -> Self {
        Self {
            value: node.condition.value_json(),
            condition: node.condition.operator().as_str().to_string(),
            id: node.id,
            symptom_key: node.symptom_key,
            next_node_id: node.next_node_id,
            intervention_ids: node.intervention_ids,
        }
    }
}

// ---------------------------------------------------------------------------
// Intervention
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intervention {
    pub id: Id,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<InterventionPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity_threshold: Option<f64>,
    #[serde(default, alias = "symptom_type", skip_serializing_if = "Option::is_none")]
    pub symptom_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// Interventions are authored either as a list of objects carrying their
/// own `id`, or as an object keyed by id.
fn deserialize_interventions<'de, D>(deserializer: D) -> Result<Vec<Intervention>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(D::Error::custom))
            .collect(),
        Value::Object(entries) => entries
            .into_iter()
            .map(|(key, mut body)| {
                if let Value::Object(fields) = &mut body {
                    fields.entry("id").or_insert(Value::String(key));
                }
                serde_json::from_value(body).map_err(D::Error::custom)
            })
            .collect(),
        other => Err(D::Error::custom(format!(
            "interventions must be a list or an object, got {other}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Protocol
// ---------------------------------------------------------------------------

/// A versioned clinical questionnaire plus its triage rules.
/// Read-only once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Protocol {
    #[serde(default)]
    pub id: Id,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(alias = "protocol_type")]
    pub category: ProtocolCategory,
    pub version: ProtocolVersion,
    #[serde(default = "default_active", alias = "is_active")]
    pub active: bool,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default, alias = "decision_tree")]
    pub decision_nodes: Vec<DecisionNode>,
    #[serde(default, deserialize_with = "deserialize_interventions")]
    pub interventions: Vec<Intervention>,
}

fn default_active() -> bool {
    true
}

impl Protocol {
    /// Parse a protocol document. Missing ids and names are derived from
    /// category and version.
    pub fn from_json_str(json: &str) -> Result<Self, ProtocolError> {
        let mut protocol: Protocol = serde_json::from_str(json)
            .map_err(|e| ProtocolError::Parse("protocol".into(), e.to_string()))?;
        protocol.fill_defaults();
        Ok(protocol)
    }

    /// Load a protocol document from disk.
    pub fn load(path: &Path) -> Result<Self, ProtocolError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ProtocolError::Load(path.display().to_string(), e.to_string()))?;
        let mut protocol: Protocol = serde_json::from_str(&json)
            .map_err(|e| ProtocolError::Parse(path.display().to_string(), e.to_string()))?;
        protocol.fill_defaults();
        Ok(protocol)
    }

    fn fill_defaults(&mut self) {
        if self.id.as_str().is_empty() {
            self.id = Id::new(format!("{}-{}", self.category.as_str(), self.version));
        }
        if self.name.is_empty() {
            self.name = self.category.standard_name().to_string();
        }
    }

    pub fn question(&self, id: &Id) -> Option<&Question> {
        self.questions.iter().find(|q| &q.id == id)
    }

    pub fn node(&self, id: &Id) -> Option<&DecisionNode> {
        self.decision_nodes.iter().find(|n| &n.id == id)
    }

    pub fn intervention(&self, id: &Id) -> Option<&Intervention> {
        self.interventions.iter().find(|i| &i.id == id)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::condition::ConditionValue;

    fn version(v: &str) -> ProtocolVersion {
        ProtocolVersion::new(v)
    }

    #[test]
    fn versions_compare_numerically() {
        assert!(version("1.10") > version("1.9"));
        assert!(version("2.0") > version("1.99"));
        assert!(version("v1.2") > version("1.1"));
        assert!(version("1.0.1") > version("1.0"));
        assert_eq!(version("1.0").cmp(&version("1.0")), Ordering::Equal);
    }

    #[test]
    fn mixed_segments_order_transitively() {
        let (two, ten, lettered) = (version("2"), version("10"), version("1a"));
        assert!(two < ten);
        assert!(ten < lettered);
        assert!(two < lettered);

        let mut versions = vec![version("1a"), version("10"), version("2"), version("1.b"), version("1.3")];
        versions.sort();
        let sorted: Vec<&str> = versions.iter().map(ProtocolVersion::as_str).collect();
        assert_eq!(sorted, vec!["1.3", "1.b", "2", "10", "1a"]);
    }

    #[test]
    fn numeric_version_is_accepted() {
        let v: ProtocolVersion = serde_json::from_value(json!(2)).unwrap();
        assert_eq!(v.as_str(), "2");
    }

    #[test]
    fn parses_structured_protocol_shape() {
        let protocol = Protocol::from_json_str(
            &json!({
                "protocol_type": "COPD",
                "version": "1.0",
                "is_active": true,
                "questions": [
                    {"id": 2, "text": "What color is your sputum today?", "type": "choice",
                     "choices": ["Clear/White", "Green"], "symptom_type": "sputum"}
                ],
                "decision_tree": [
                    {"id": 2, "symptom_type": "sputum", "condition": "in",
                     "value": ["Green", "Blood-tinged"], "next_node_id": 3, "intervention_ids": [2]}
                ],
                "interventions": [
                    {"id": 2, "title": "Infection Protocol", "description": "Antibiotic therapy",
                     "priority": "high", "symptom_type": "infection"}
                ]
            })
            .to_string(),
        )
        .unwrap();

        assert_eq!(protocol.category, ProtocolCategory::Copd);
        assert_eq!(protocol.id.as_str(), "copd-1.0");
        assert_eq!(protocol.name, "COPD Palliative Care Protocol");
        assert_eq!(protocol.questions[0].symptom_key.as_deref(), Some("sputum"));
        assert_eq!(protocol.questions[0].answer_type, AnswerType::Choice);
        let node = &protocol.decision_nodes[0];
        assert_eq!(
            node.condition,
            Condition::In(vec![
                ConditionValue::Text("Green".into()),
                ConditionValue::Text("Blood-tinged".into())
            ])
        );
        assert_eq!(node.next_node_id, Some(Id::from(3)));
        assert_eq!(
            protocol.intervention(&Id::from(2)).unwrap().priority,
            Some(InterventionPriority::High)
        );
    }

    #[test]
    fn parses_keyed_interventions() {
        let protocol = Protocol::from_json_str(
            &json!({
                "category": "cancer",
                "version": "1.0",
                "interventions": {
                    "severe_pain": {"title": "Severe Pain Management", "severity_threshold": 7}
                }
            })
            .to_string(),
        )
        .unwrap();

        let intervention = protocol.intervention(&Id::from("severe_pain")).unwrap();
        assert_eq!(intervention.title, "Severe Pain Management");
        assert_eq!(intervention.severity_threshold, Some(7.0));
        assert_eq!(intervention.priority, None);
    }

    #[test]
    fn invalid_condition_fails_load_with_node_id() {
        let err = Protocol::from_json_str(
            &json!({
                "category": "cancer",
                "version": "1.0",
                "decision_tree": [
                    {"id": "pain_severe", "symptom_type": "pain", "condition": ">=severe"}
                ]
            })
            .to_string(),
        )
        .unwrap_err();

        assert!(err.to_string().contains("pain_severe"), "{err}");
    }

    #[test]
    fn decision_node_serializes_structured_condition() {
        let node: DecisionNode = serde_json::from_value(json!({
            "id": "pain_assessment", "symptom_type": "pain", "condition": ">=7",
            "intervention_ids": ["severe_pain"]
        }))
        .unwrap();

        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["condition"], json!(">="));
        assert_eq!(json["value"], json!(7.0));
        assert_eq!(json["symptom_key"], json!("pain"));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Protocol::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ProtocolError::Load(_, _)));
    }
}
