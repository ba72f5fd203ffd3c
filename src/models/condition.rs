//! Decision-node conditions.
//!
//! Protocol authors have written conditions two ways: a structured operator
//! with a separate comparison value (`"condition": "greater_than", "value": 7`)
//! and an operator with the value embedded (`"condition": ">=7"`). Both are
//! parsed once, when the protocol is loaded, into [`Condition`]. Evaluation
//! never looks at the original string again.

use serde_json::Value;

use super::ProtocolError;

/// Comparison operator of a decision node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    GreaterThan,
    AtLeast,
    LessThan,
    AtMost,
    Equals,
    NotEquals,
    In,
    Default,
}

/// Embedded operator prefixes, longest first so `>=` is never read as `>`.
const EMBEDDED_OPERATORS: &[(&str, Operator)] = &[
    (">=", Operator::AtLeast),
    ("<=", Operator::AtMost),
    ("==", Operator::Equals),
    ("!=", Operator::NotEquals),
    (">", Operator::GreaterThan),
    ("<", Operator::LessThan),
];

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GreaterThan => ">",
            Self::AtLeast => ">=",
            Self::LessThan => "<",
            Self::AtMost => "<=",
            Self::Equals => "==",
            Self::NotEquals => "!=",
            Self::In => "in",
            Self::Default => "default",
        }
    }

    /// Resolve a standalone operator token, symbolic or named.
    fn from_token(token: &str) -> Option<Self> {
        let op = match token.to_ascii_lowercase().as_str() {
            ">" | "greater_than" | "gt" => Self::GreaterThan,
            ">=" | "greater_than_or_equal" | "greater_or_equal" | "gte" => Self::AtLeast,
            "<" | "less_than" | "lt" => Self::LessThan,
            "<=" | "less_than_or_equal" | "less_or_equal" | "lte" => Self::AtMost,
            "==" | "=" | "equals" | "eq" => Self::Equals,
            "!=" | "not_equals" | "ne" => Self::NotEquals,
            "in" => Self::In,
            "default" => Self::Default,
            _ => return None,
        };
        Some(op)
    }
}

/// A scalar a decision node compares a symptom against.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl ConditionValue {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).map(Self::Number),
            Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    /// Interpret an embedded literal such as the `true` in `==true`.
    fn from_literal(literal: &str) -> Self {
        if literal.eq_ignore_ascii_case("true") {
            return Self::Bool(true);
        }
        if literal.eq_ignore_ascii_case("false") {
            return Self::Bool(false);
        }
        match literal.parse::<f64>() {
            Ok(n) if n.is_finite() => Self::Number(n),
            _ => Self::Text(literal.to_string()),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::Text(s) => Value::String(s.clone()),
        }
    }
}

/// Parsed condition of a decision node.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    GreaterThan(f64),
    AtLeast(f64),
    LessThan(f64),
    AtMost(f64),
    Equals(ConditionValue),
    NotEquals(ConditionValue),
    In(Vec<ConditionValue>),
    /// Catch-all baseline node; ignores its symptom key.
    Default,
}

impl Condition {
    /// Parse a condition from its operator text and optional separate value.
    pub fn parse(condition: &str, value: Option<&Value>) -> Result<Self, ProtocolError> {
        let text = condition.trim();
        let invalid = |reason: &str| ProtocolError::InvalidCondition {
            condition: text.to_string(),
            reason: reason.to_string(),
        };

        if let Some(op) = Operator::from_token(text) {
            return Self::with_value(op, value).map_err(|reason| invalid(&reason));
        }

        for (symbol, op) in EMBEDDED_OPERATORS {
            if let Some(rest) = text.strip_prefix(symbol) {
                let literal = rest.trim();
                if literal.is_empty() {
                    return Self::with_value(*op, value).map_err(|reason| invalid(&reason));
                }
                return Self::with_literal(*op, literal).map_err(|reason| invalid(&reason));
            }
        }

        Err(invalid("unknown operator"))
    }

    fn with_value(op: Operator, value: Option<&Value>) -> Result<Self, String> {
        if op == Operator::Default {
            return Ok(Self::Default);
        }
        let value = value
            .filter(|v| !v.is_null())
            .ok_or_else(|| format!("operator '{}' needs a comparison value", op.as_str()))?;

        match op {
            Operator::GreaterThan
            | Operator::AtLeast
            | Operator::LessThan
            | Operator::AtMost => {
                let threshold = numeric_threshold(value)
                    .ok_or_else(|| format!("'{value}' is not a numeric threshold"))?;
                Ok(Self::threshold(op, threshold))
            }
            Operator::Equals | Operator::NotEquals => {
                let scalar = ConditionValue::from_json(value)
                    .ok_or_else(|| format!("'{value}' is not a scalar value"))?;
                Ok(if op == Operator::Equals {
                    Self::Equals(scalar)
                } else {
                    Self::NotEquals(scalar)
                })
            }
            Operator::In => {
                let Value::Array(items) = value else {
                    return Err(format!("'in' expects a list, got '{value}'"));
                };
                items
                    .iter()
                    .map(|item| {
                        ConditionValue::from_json(item)
                            .ok_or_else(|| format!("'{item}' is not a scalar list member"))
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Self::In)
            }
            Operator::Default => Ok(Self::Default),
        }
    }

    fn with_literal(op: Operator, literal: &str) -> Result<Self, String> {
        match op {
            Operator::Equals => Ok(Self::Equals(ConditionValue::from_literal(literal))),
            Operator::NotEquals => Ok(Self::NotEquals(ConditionValue::from_literal(literal))),
            _ => {
                let threshold = literal
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| format!("'{literal}' is not a numeric threshold"))?;
                Ok(Self::threshold(op, threshold))
            }
        }
    }

    fn threshold(op: Operator, threshold: f64) -> Self {
        match op {
            Operator::GreaterThan => Self::GreaterThan(threshold),
            Operator::AtLeast => Self::AtLeast(threshold),
            Operator::LessThan => Self::LessThan(threshold),
            _ => Self::AtMost(threshold),
        }
    }

    pub fn operator(&self) -> Operator {
        match self {
            Self::GreaterThan(_) => Operator::GreaterThan,
            Self::AtLeast(_) => Operator::AtLeast,
            Self::LessThan(_) => Operator::LessThan,
            Self::AtMost(_) => Operator::AtMost,
            Self::Equals(_) => Operator::Equals,
            Self::NotEquals(_) => Operator::NotEquals,
            Self::In(_) => Operator::In,
            Self::Default => Operator::Default,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }

    /// Numeric threshold for ordering comparisons.
    pub fn threshold_value(&self) -> Option<f64> {
        match self {
            Self::GreaterThan(t) | Self::AtLeast(t) | Self::LessThan(t) | Self::AtMost(t) => {
                Some(*t)
            }
            _ => None,
        }
    }

    /// The comparison value in structured JSON form.
    pub fn value_json(&self) -> Option<Value> {
        match self {
            Self::GreaterThan(t) | Self::AtLeast(t) | Self::LessThan(t) | Self::AtMost(t) => {
                serde_json::Number::from_f64(*t).map(Value::Number)
            }
            Self::Equals(v) | Self::NotEquals(v) => Some(v.to_json()),
            Self::In(items) => Some(Value::Array(items.iter().map(|v| v.to_json()).collect())),
            Self::Default => None,
        }
    }
}

fn numeric_threshold(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    n.filter(|v| v.is_finite())
}
