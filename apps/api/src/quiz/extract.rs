//! Recovers the JSON object hidden in free-form model output.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

const PREVIEW_CHARS: usize = 500;

/// Widest `{ ... }` span, newlines included. Not nesting-aware.
static JSON_OBJECT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

#[derive(Debug, Error)]
pub enum MalformedResponse {
    #[error("no JSON object found in model output. Response: {preview}")]
    NoJson { preview: String },

    #[error("unexpected quiz payload: {0}")]
    Shape(String),
}

/// Returns the JSON object text inside `text`.
///
/// Strips surrounding whitespace and markdown code fences first; when the
/// remainder still does not parse, falls back to the widest brace-delimited
/// span. Applying it to its own output is a no-op.
pub fn extract_json(text: &str) -> Result<&str, MalformedResponse> {
    let cleaned = strip_code_fences(text);
    if is_json_object(cleaned) {
        return Ok(cleaned);
    }

    if let Some(found) = JSON_OBJECT_RE.find(cleaned) {
        if is_json_object(found.as_str()) {
            return Ok(found.as_str());
        }
    }

    Err(MalformedResponse::NoJson {
        preview: cleaned.chars().take(PREVIEW_CHARS).collect(),
    })
}

/// Parses the object returned by `extract_json`.
pub fn parse_json_object(text: &str) -> Result<Value, MalformedResponse> {
    let json = extract_json(text)?;
    serde_json::from_str(json).map_err(|_| MalformedResponse::NoJson {
        preview: json.chars().take(PREVIEW_CHARS).collect(),
    })
}

fn strip_code_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```") {
        // Optional language tag such as `json`; JSON itself never starts with one.
        let tag_len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(rest.len());
        text = &rest[tag_len..];
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

fn is_json_object(text: &str) -> bool {
    matches!(serde_json::from_str::<Value>(text), Ok(Value::Object(_)))
}
