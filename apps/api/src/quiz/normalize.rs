//! Maps loosely-typed model questions onto the canonical `Question` schema.
//!
//! Every field has a default, so a single malformed item never fails the batch:
//! N raw questions always produce N questions in the same order.

use serde_json::Value;
use tracing::warn;

use super::extract::MalformedResponse;
use crate::models::question::{Question, QuestionKind, RawQuestion};

/// Pulls the `questions` array out of a parsed model payload.
///
/// A missing key is an empty batch; a non-array or a non-object item is a
/// malformed response.
pub fn raw_questions(payload: &Value) -> Result<Vec<RawQuestion>, MalformedResponse> {
    let Some(questions) = payload.get("questions") else {
        return Ok(Vec::new());
    };
    let Value::Array(items) = questions else {
        return Err(MalformedResponse::Shape(
            "`questions` must be an array of objects".to_string(),
        ));
    };

    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            // Derived struct deserializers also accept sequences; only objects count.
            if !item.is_object() {
                return Err(MalformedResponse::Shape(format!(
                    "question {} is not a JSON object",
                    idx + 1
                )));
            }
            serde_json::from_value(item.clone()).map_err(|e| {
                MalformedResponse::Shape(format!("question {} is malformed ({e})", idx + 1))
            })
        })
        .collect()
}

pub fn normalize_questions(raw: Vec<RawQuestion>) -> Vec<Question> {
    raw.into_iter()
        .enumerate()
        .map(|(idx, q)| normalize_question(q, idx + 1))
        .collect()
}

fn normalize_question(raw: RawQuestion, position: usize) -> Question {
    let id = raw
        .id
        .as_ref()
        .and_then(Value::as_u64)
        .filter(|id| *id > 0)
        .unwrap_or(position as u64);

    let question = raw.question.map(value_to_text).unwrap_or_default();

    let kind = raw
        .kind
        .as_ref()
        .and_then(Value::as_str)
        .map(QuestionKind::from)
        .unwrap_or_default();

    let (options, correct_answer) = match kind {
        QuestionKind::MultipleChoice => {
            let options = normalize_options(raw.options);
            let answer = answer_index(raw.correct_answer.as_ref(), true);
            if answer >= options.len() && !options.is_empty() {
                warn!(
                    "Question {id}: correct_answer {answer} is outside its {} options",
                    options.len()
                );
            }
            (Some(options), answer)
        }
        QuestionKind::Other(_) => (None, answer_index(raw.correct_answer.as_ref(), false)),
    };

    Question {
        id,
        question,
        kind,
        options,
        correct_answer,
    }
}

fn normalize_options(options: Option<Value>) -> Vec<String> {
    match options {
        Some(Value::Array(items)) => items.into_iter().map(value_to_text).collect(),
        _ => Vec::new(),
    }
}

/// Integer answers pass through; `A`-`D` map to 0-3 for multiple choice;
/// everything else falls back to the first option.
fn answer_index(answer: Option<&Value>, map_letters: bool) -> usize {
    match answer {
        Some(Value::Number(n)) => n.as_u64().map(|n| n as usize).unwrap_or(0),
        Some(Value::String(s)) if map_letters => letter_index(s).unwrap_or(0),
        _ => 0,
    }
}

fn letter_index(answer: &str) -> Option<usize> {
    match answer {
        "A" | "a" => Some(0),
        "B" | "b" => Some(1),
        "C" | "c" => Some(2),
        "D" | "d" => Some(3),
        _ => None,
    }
}

fn value_to_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
