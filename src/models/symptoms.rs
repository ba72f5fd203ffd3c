use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Normalized value of one symptom dimension.
#[derive(Debug, Clone, PartialEq)]
pub enum SymptomValue {
    /// Numeric severity, nominally on a 0-10 scale.
    Severity(f64),
    /// Yes/no symptom. Compares numerically as 1/0.
    Flag(bool),
    /// Choice or free-text answer, kept verbatim.
    Text(String),
}

impl SymptomValue {
    /// Numeric reading used by ordering comparisons.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Severity(v) => Some(*v),
            Self::Flag(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Text(t) => t.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        }
    }

    /// Boolean reading used by `== true` / `== false` comparisons.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            Self::Severity(v) => Some(*v != 0.0),
            Self::Text(t) => {
                let t = t.trim();
                if t.eq_ignore_ascii_case("true") {
                    Some(true)
                } else if t.eq_ignore_ascii_case("false") {
                    Some(false)
                } else {
                    None
                }
            }
        }
    }

    /// Severity score, only for numeric answers.
    pub fn severity(&self) -> Option<f64> {
        match self {
            Self::Severity(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

// Flags are stored as 1/0, the shape assessment records have always used.
impl Serialize for SymptomValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Severity(v) => serializer.serialize_f64(*v),
            Self::Flag(b) => serializer.serialize_u8(u8::from(*b)),
            Self::Text(t) => serializer.serialize_str(t),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSymptomValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for SymptomValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawSymptomValue::deserialize(deserializer)? {
            RawSymptomValue::Bool(b) => Self::Flag(b),
            RawSymptomValue::Number(n) => Self::Severity(n),
            RawSymptomValue::Text(t) => Self::Text(t),
        })
    }
}

/// Symptom key to normalized value. Derived per assessment, never shared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymptomMap(BTreeMap<String, SymptomValue>);

impl SymptomMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&SymptomValue> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: SymptomValue) -> Option<SymptomValue> {
        self.0.insert(key.into(), value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SymptomValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Numeric severities, in key order.
    pub fn severities(&self) -> impl Iterator<Item = (&str, f64)> {
        self.iter().filter_map(|(k, v)| v.severity().map(|s| (k, s)))
    }

    /// Symptoms whose severity is at or above `threshold`.
    pub fn urgent_symptoms(&self, threshold: f64) -> Vec<(&str, f64)> {
        self.severities().filter(|(_, s)| *s >= threshold).collect()
    }

    /// Keys worth raising in guidance: scores at or above `threshold` and
    /// yes-answers. Choice and text answers are left to the reader.
    pub fn notable_symptoms(&self, threshold: f64) -> Vec<&str> {
        self.iter()
            .filter(|(_, v)| match v {
                SymptomValue::Severity(s) => *s >= threshold,
                SymptomValue::Flag(b) => *b,
                SymptomValue::Text(_) => false,
            })
            .map(|(k, _)| k)
            .collect()
    }
}

impl<K: Into<String>> FromIterator<(K, SymptomValue)> for SymptomMap {
    fn from_iter<I: IntoIterator<Item = (K, SymptomValue)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
