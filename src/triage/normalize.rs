//! Response normalization.
//!
//! Raw answers arrive keyed by question id, in whatever shape the client
//! sent. Each keyed question contributes at most one normalized value to the
//! symptom map; unparseable answers are skipped, never guessed.

use serde_json::Value;

use crate::models::{AnswerType, Question, Responses, SymptomMap, SymptomValue};

/// Turn raw responses into a symptom map, walking questions in protocol order.
///
/// When several questions feed the same symptom key, the later one wins,
/// except that a choice or text answer never displaces a numeric or yes/no
/// reading already recorded for that key.
pub fn normalize_responses(responses: &Responses, questions: &[Question]) -> SymptomMap {
    let mut symptoms = SymptomMap::new();

    for question in questions {
        let Some(key) = question.symptom_key.as_deref() else {
            continue;
        };
        let Some(answer) = responses.answer(&question.id) else {
            continue;
        };

        match normalize_answer(question, answer) {
            Some(value) => record(&mut symptoms, key, value),
            None => tracing::debug!(
                question_id = %question.id,
                symptom = key,
                answer_type = question.answer_type.as_str(),
                "Unparseable answer skipped"
            ),
        }
    }

    symptoms
}

/// Normalize one answer according to the question's answer type.
pub fn normalize_answer(question: &Question, answer: &Value) -> Option<SymptomValue> {
    match question.answer_type {
        AnswerType::Numeric => {
            let value = parse_numeric(answer)?;
            if out_of_range(question, value) {
                tracing::debug!(
                    question_id = %question.id,
                    value,
                    "Numeric answer outside question range"
                );
            }
            Some(SymptomValue::Severity(value))
        }
        AnswerType::Boolean => parse_boolean(answer).map(SymptomValue::Flag),
        AnswerType::Choice => {
            let text = answer.as_str()?;
            if !question.choices.is_empty() && !question.choices.iter().any(|c| c == text) {
                tracing::debug!(question_id = %question.id, "Choice answer not among listed choices");
            }
            Some(SymptomValue::Text(text.to_string()))
        }
        AnswerType::Text => answer.as_str().map(|t| SymptomValue::Text(t.to_string())),
    }
}

fn record(symptoms: &mut SymptomMap, key: &str, value: SymptomValue) {
    if value.is_text() && symptoms.get(key).is_some_and(|existing| !existing.is_text()) {
        tracing::debug!(symptom = key, "Text answer kept out of scored symptom");
        return;
    }
    symptoms.insert(key, value);
}

fn parse_numeric(answer: &Value) -> Option<f64> {
    let value = match answer {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

fn parse_boolean(answer: &Value) -> Option<bool> {
    match answer {
        Value::Bool(b) => Some(*b),
        Value::String(s) => {
            let s = s.trim();
            if s.eq_ignore_ascii_case("true") {
                Some(true)
            } else if s.eq_ignore_ascii_case("false") {
                Some(false)
            } else {
                None
            }
        }
        _ => None,
    }
}

// Values are not clamped; the range only informs logging.
fn out_of_range(question: &Question, value: f64) -> bool {
    question.min.is_some_and(|min| value < min) || question.max.is_some_and(|max| value > max)
}
