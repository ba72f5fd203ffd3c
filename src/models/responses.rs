use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ids::Id;

/// Raw answers of one assessment, keyed by question id.
///
/// Answers arrive either bare (`"3": 8`) or wrapped the way the call
/// transcript analyzer emits them (`"3": {"value": 8, "notes": "..."}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Responses(BTreeMap<String, Value>);

impl Responses {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and fixtures.
    pub fn with(mut self, question_id: impl Into<Id>, answer: impl Into<Value>) -> Self {
        self.insert(question_id, answer);
        self
    }

    pub fn insert(&mut self, question_id: impl Into<Id>, answer: impl Into<Value>) {
        self.0.insert(question_id.into().to_string(), answer.into());
    }

    /// The answer value for a question, unwrapped from `{"value": ...}`.
    /// `null` answers count as unanswered.
    pub fn answer(&self, question_id: &Id) -> Option<&Value> {
        let raw = self.0.get(question_id.as_str())?;
        let value = match raw {
            Value::Object(fields) => fields.get("value")?,
            other => other,
        };
        (!value.is_null()).then_some(value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<Id>, V: Into<Value>> FromIterator<(K, V)> for Responses {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut responses = Self::new();
        for (k, v) in iter {
            responses.insert(k, v);
        }
        responses
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn unwraps_value_objects() {
        let responses: Responses =
            serde_json::from_value(json!({"1": {"value": 8}, "2": "Green"})).unwrap();
        assert_eq!(responses.answer(&Id::from("1")), Some(&json!(8)));
        assert_eq!(responses.answer(&Id::from("2")), Some(&json!("Green")));
    }

    #[test]
    fn null_and_missing_answers_are_unanswered() {
        let responses: Responses =
            serde_json::from_value(json!({"1": null, "2": {"value": null}, "3": {"notes": "x"}}))
                .unwrap();
        assert!(responses.answer(&Id::from("1")).is_none());
        assert!(responses.answer(&Id::from("2")).is_none());
        assert!(responses.answer(&Id::from("3")).is_none());
        assert!(responses.answer(&Id::from("4")).is_none());
    }

    #[test]
    fn integer_question_ids_match_string_keys() {
        let responses = Responses::new().with(Id::from(5), true);
        assert_eq!(responses.answer(&Id::from("5")), Some(&json!(true)));
    }
}
