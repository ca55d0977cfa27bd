//! Validation of structured scoring payloads returned by the upstream.
//!
//! The upstream is untrusted: every entry must carry a non-empty `full_name`,
//! a non-empty `explanation` and a finite `score` (number or numeric string).

use serde_json::Value;
use tracing::warn;

use crate::errors::AppError;
use crate::llm_client::strip_code_fences;
use crate::models::ranking::{clamp_score, ScoredCandidate};

/// Parses a batch payload: a JSON array of scored entries.
///
/// Invalid entries are dropped. An unparseable payload, a non-array top level,
/// or a non-empty array with no valid entry is a `MalformedResponse`.
pub fn parse_batch(raw: &str) -> Result<Vec<ScoredCandidate>, AppError> {
    let entries = match parse_json(raw)? {
        Value::Array(entries) => entries,
        other => {
            return Err(AppError::MalformedResponse(format!(
                "expected a JSON array, got {}",
                kind(&other)
            )))
        }
    };

    let total = entries.len();
    let scored: Vec<ScoredCandidate> = entries
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| match validate_entry(entry) {
            Ok(s) => Some(s),
            Err(reason) => {
                warn!("Dropping batch entry {i}: {reason}");
                None
            }
        })
        .collect();

    if total > 0 && scored.is_empty() {
        return Err(AppError::MalformedResponse(format!(
            "none of the {total} batch entries passed validation"
        )));
    }

    Ok(scored)
}

/// Parses a per-candidate payload: a single JSON object.
pub fn parse_single(raw: &str) -> Result<ScoredCandidate, AppError> {
    let value = parse_json(raw)?;
    if !value.is_object() {
        return Err(AppError::MalformedResponse(format!(
            "expected a JSON object, got {}",
            kind(&value)
        )));
    }
    validate_entry(&value).map_err(AppError::MalformedResponse)
}

fn parse_json(raw: &str) -> Result<Value, AppError> {
    serde_json::from_str(strip_code_fences(raw))
        .map_err(|e| AppError::MalformedResponse(format!("invalid JSON: {e}")))
}

fn validate_entry(entry: &Value) -> Result<ScoredCandidate, String> {
    let Value::Object(fields) = entry else {
        return Err(format!("expected an object, got {}", kind(entry)));
    };

    let full_name = required_text(fields.get("full_name"), "full_name")?;
    let explanation = required_text(fields.get("explanation"), "explanation")?;
    let score = fields
        .get("score")
        .ok_or_else(|| "missing field 'score'".to_string())
        .and_then(coerce_score)?;

    Ok(ScoredCandidate {
        full_name,
        score: clamp_score(score),
        explanation,
    })
}

fn required_text(value: Option<&Value>, field: &str) -> Result<String, String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::String(_)) => Err(format!("field '{field}' is empty")),
        Some(other) => Err(format!("field '{field}' must be a string, got {}", kind(other))),
        None => Err(format!("missing field '{field}'")),
    }
}

fn coerce_score(value: &Value) -> Result<f64, String> {
    let score = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    score
        .filter(|s| s.is_finite())
        .ok_or_else(|| format!("field 'score' is not a finite number: {value}"))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
