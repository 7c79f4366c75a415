//! Response Normalizer — turns untrusted model output into a `ScoreResult` or charter text.
//!
//! Structural failure is fatal: if no JSON object can be decoded, the scoring
//! response is `MalformedResponse`. Field-level failure is not: each field falls
//! back to its default through `field_or`, and the table in `normalize_score`
//! is the complete tolerance policy.

use serde_json::{Map, Value};

use crate::llm_client::{strip_json_fences, LlmError, RawModelResponse};
use crate::scoring::{ScoreResult, SubScores};

/// Longest excerpt of an undecodable response quoted in the error.
const EXCERPT_LIMIT: usize = 120;

/// Normalizes a scoring response.
pub fn normalize_score(raw: RawModelResponse) -> Result<ScoreResult, LlmError> {
    let raw = decode_object(raw)?;

    let scores = SubScores {
        business_impact: field_or(&raw, "bi", as_int, 0),
        risk: field_or(&raw, "risk", as_int, 0),
        alignment: field_or(&raw, "align", as_int, 0),
        urgency: field_or(&raw, "urgency", as_int, 0),
        complexity: field_or(&raw, "complexity", as_int, 0),
        cost: field_or(&raw, "cost", as_int, 0),
    };

    Ok(ScoreResult::new(
        scores,
        field_or(&raw, "rationale", as_text, String::new()),
        field_or(&raw, "lenses", as_text_list, Vec::new()),
        field_or(&raw, "recommended_priority", as_int, 1).into(),
    ))
}

/// Normalizes a charter response: text passes through unmodified, structured
/// content is rendered to its direct string form. Blank content is `EmptyContent`.
pub fn normalize_charter(raw: RawModelResponse) -> Result<String, LlmError> {
    let text = match raw {
        RawModelResponse::Text(text) => text,
        RawModelResponse::Structured(Value::String(text)) => text,
        RawModelResponse::Structured(value) => value.to_string(),
    };

    if text.trim().is_empty() {
        return Err(LlmError::EmptyContent);
    }
    Ok(text)
}

/// The per-field combinator: parse the value under `key`, or fall back to `default`
/// when the key is absent or the parser rejects the value.
fn field_or<T>(
    raw: &Map<String, Value>,
    key: &str,
    parse: fn(&Value) -> Option<T>,
    default: T,
) -> T {
    raw.get(key).and_then(parse).unwrap_or(default)
}

/// Integers, finite floats (truncated toward zero), booleans, and strings holding an
/// integer literal. Values outside `i32` are rejected.
fn as_int(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i32::try_from(i).ok()
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite())
                    .map(f64::trunc)
                    .filter(|f| *f >= f64::from(i32::MIN) && *f <= f64::from(i32::MAX))
                    .map(|f| f as i32)
            }
        }
        Value::Bool(b) => Some(i32::from(*b)),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

/// Lists only; non-string elements are dropped, order is kept.
fn as_text_list(value: &Value) -> Option<Vec<String>> {
    value.as_array().map(|items| {
        items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect()
    })
}

fn decode_object(raw: RawModelResponse) -> Result<Map<String, Value>, LlmError> {
    let value = match raw {
        RawModelResponse::Structured(value) => value,
        RawModelResponse::Text(text) => decode_text(&text)?,
    };

    match value {
        Value::Object(map) => Ok(map),
        other => Err(LlmError::MalformedResponse(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Decodes a text payload as JSON, after stripping code fences. Falls back to the
/// outermost `{...}` block when the model wrapped the object in prose.
fn decode_text(text: &str) -> Result<Value, LlmError> {
    let text = strip_json_fences(text);

    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Ok(value);
    }

    let embedded = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => {
            serde_json::from_str::<Value>(&text[start..=end]).ok()
        }
        _ => None,
    };

    embedded.ok_or_else(|| {
        LlmError::MalformedResponse(format!(
            "response is not valid JSON: {:?}",
            excerpt(text)
        ))
    })
}

fn excerpt(text: &str) -> &str {
    match text.char_indices().nth(EXCERPT_LIMIT) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
