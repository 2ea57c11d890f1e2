//! Fact type and reserved enrichment keys

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Reserved nested object holding server-assigned fields
pub const EVENTN_CTX_KEY: &str = "eventn_ctx";
/// Client IP, set at the fact root
pub const SOURCE_IP_KEY: &str = "source_ip";
/// Raw user agent string, supplied by the client
pub const UA_KEY: &str = "user_agent";
/// Parsed user agent structure
pub const PARSED_UA_KEY: &str = "parsed_ua";
/// Geo resolution result
pub const LOCATION_KEY: &str = "location";
/// Server-assigned event identifier
pub const EVENT_ID_KEY: &str = "event_id";

/// Errors surfaced to the HTTP boundary as 400
#[derive(Debug, Error)]
pub enum EventError {
    /// Input fact was JSON null / absent
    #[error("input fact can't be nil")]
    NilFact,

    /// Input was valid JSON but not an object
    #[error("input fact must be a JSON object")]
    NotAnObject,

    /// `eventn_ctx` is missing or not an object
    #[error("unable to get {EVENTN_CTX_KEY} object from fact")]
    MissingContext,
}

/// A single enrichable event payload
///
/// Facts are created by the HTTP handler, mutated only by a preprocessor,
/// and immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fact(Map<String, Value>);

impl Fact {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fact from a decoded JSON value
    ///
    /// `null` is a nil fact; any other non-object is rejected.
    pub fn from_value(value: Value) -> Result<Self, EventError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Err(EventError::NilFact),
            _ => Err(EventError::NotAnObject),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// The reserved context object, if present and an object
    pub fn eventn_ctx_mut(&mut self) -> Option<&mut Map<String, Value>> {
        match self.0.get_mut(EVENTN_CTX_KEY) {
            Some(Value::Object(ctx)) => Some(ctx),
            _ => None,
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    /// Compact single-line JSON, the log file wire form
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.0)
    }
}

impl From<Map<String, Value>> for Fact {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
