//! Log file naming protocol shared by the writer and the uploader
//!
//! Layout under the buffer directory:
//!
//! ```text
//! events-<token>-<YYYYMMDD_HHMMSS>-<seq>.log.open   writer-owned, appending
//! events-<token>-<YYYYMMDD_HHMMSS>-<seq>.log        closed, uploader-eligible
//! events-<token>-<YYYYMMDD_HHMMSS>-<seq>.log.status delivery sidecar
//! ```
//!
//! The `.open` suffix is what keeps the writer and the uploader off each
//! other's files: the uploader only ever matches closed names.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Suffix of a file still owned by the writer
pub const OPEN_SUFFIX: &str = ".open";

/// Suffix of a delivery status sidecar
pub const STATUS_SUFFIX: &str = ".status";

/// Rotation timestamp format embedded in file names
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Canonical closed log file name pattern; the token capture is the only
/// group consumed.
static LOG_NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"events-(?P<token>[^-]+)-\d{8}_\d{6}-\d+\.log$").expect("invalid log name regex")
});

/// Closed log file name for `(token, rotation timestamp, sequence)`
pub fn format_log_name(token: &str, rotated_at: DateTime<Utc>, seq: u64) -> String {
    format!(
        "events-{}-{}-{}.log",
        token,
        rotated_at.format(TIMESTAMP_FORMAT),
        seq
    )
}

/// Writer-owned name: the closed name plus the `.open` suffix
pub fn format_open_log_name(token: &str, rotated_at: DateTime<Utc>, seq: u64) -> String {
    format!("{}{}", format_log_name(token, rotated_at, seq), OPEN_SUFFIX)
}

/// Status sidecar name for a closed log file
pub fn status_file_name(log_file_name: &str) -> String {
    format!("{log_file_name}{STATUS_SUFFIX}")
}

/// Extract the token from a closed log file name
pub fn token_from_log_name(file_name: &str) -> Option<&str> {
    LOG_NAME_REGEX
        .captures(file_name)
        .and_then(|captures| captures.name("token"))
        .map(|m| m.as_str())
}

/// True for names the uploader may consume
pub fn is_closed_log_name(file_name: &str) -> bool {
    LOG_NAME_REGEX.is_match(file_name)
}

/// True for names still owned by the writer
pub fn is_open_log_name(file_name: &str) -> bool {
    file_name.ends_with(OPEN_SUFFIX)
        && is_closed_log_name(file_name.trim_end_matches(OPEN_SUFFIX))
}
