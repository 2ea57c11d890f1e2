//! Request body decoding with DoS protection

use en_events::{EventError, Fact};
use serde_json::Value;

/// Maximum JSON nesting depth
pub const MAX_JSON_DEPTH: usize = 32;

/// Decode errors, all surfaced as 400
#[derive(Debug)]
pub enum DecodeError {
    /// Body is not valid JSON
    Parse(String),

    /// JSON nesting exceeds the depth limit
    TooDeep,

    /// Valid JSON but not an event object
    Event(EventError),
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Parse(message) => write!(f, "failed to parse body: {message}"),
            DecodeError::TooDeep => {
                write!(f, "JSON nesting exceeds maximum depth of {MAX_JSON_DEPTH}")
            }
            DecodeError::Event(err) => err.fmt(f),
        }
    }
}

/// Decode a request body into a fact
///
/// Nesting is bounded after the parse: serde_json's own recursion cap keeps
/// the parse itself safe, and anything deeper than [`MAX_JSON_DEPTH`] is
/// rejected before the fact enters the pipeline.
pub fn decode_fact(body: &[u8]) -> Result<Fact, DecodeError> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(DecodeError::Event(EventError::NilFact));
    }

    let value: Value =
        serde_json::from_slice(body).map_err(|e| DecodeError::Parse(e.to_string()))?;
    if !fits_within_depth(&value, MAX_JSON_DEPTH) {
        return Err(DecodeError::TooDeep);
    }

    Fact::from_value(value).map_err(DecodeError::Event)
}

/// True iff every container in `value` sits within `budget` nesting levels
fn fits_within_depth(value: &Value, budget: usize) -> bool {
    match value {
        Value::Array(items) => {
            budget > 0 && items.iter().all(|item| fits_within_depth(item, budget - 1))
        }
        Value::Object(fields) => {
            budget > 0 && fields.values().all(|field| fits_within_depth(field, budget - 1))
        }
        _ => true,
    }
}
