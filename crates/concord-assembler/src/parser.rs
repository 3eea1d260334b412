//! Parse oracle answers into resolution results
//!
//! The oracle is a free-text generator, so the JSON object may be wrapped
//! in a code fence, surrounded by prose, or missing altogether.

use crate::error::ParseError;
use concord_domain::ResolutionResult;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;

static FENCED_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json|python)?\s*(\{.*?\})\s*```").unwrap());

static BARE_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)(\{.*\})").unwrap());

/// Find the JSON object text inside `answer`
///
/// A fenced block tagged `json` (or untagged) wins; otherwise the span from
/// the first `{` to the last `}` is taken.
pub fn extract_json_object(answer: &str) -> Option<&str> {
    FENCED_OBJECT
        .captures(answer)
        .or_else(|| BARE_OBJECT.captures(answer))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Parse `answer` into a JSON object
///
/// Never panics; every failure is returned as a [`ParseError`].
pub fn parse_object(answer: &str) -> Result<Map<String, Value>, ParseError> {
    if answer.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    let candidate = extract_json_object(answer).ok_or(ParseError::NoJsonFound)?;
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ParseError::InvalidShape("not an object".to_string())),
        Err(e) => Err(ParseError::InvalidJson(e.to_string())),
    }
}

/// Parse `answer` into a [`ResolutionResult`]
///
/// Every failure is logged once at `warn` level and returned; callers
/// decide whether an unparsable answer is recorded.
pub fn parse_result(answer: &str) -> Result<ResolutionResult, ParseError> {
    let parsed = parse_object(answer)
        .and_then(|map| {
            serde_json::from_value::<ResolutionResult>(Value::Object(map))
                .map_err(|e| ParseError::InvalidShape(e.to_string()))
        });
    if let Err(e) = &parsed {
        warn!("Could not parse oracle answer: {}", e);
    }
    parsed
}
