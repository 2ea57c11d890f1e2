//! Event timestamp key and format

use chrono::{DateTime, Utc};

/// Default key of the event timestamp
pub const KEY: &str = "_timestamp";

/// ISO-8601 with microsecond precision, always UTC
pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

pub fn now_utc() -> String {
    to_iso_format(Utc::now())
}

pub fn to_iso_format(t: DateTime<Utc>) -> String {
    t.format(FORMAT).to_string()
}
