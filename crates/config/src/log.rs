//! Event buffer configuration

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Event log buffer settings
///
/// # Example
///
/// ```toml
/// [log]
/// path = "./events"
/// rotation_min = 60
/// flush_ms = 1000
/// queue_max = 10000
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Directory for buffer files
    pub path: PathBuf,

    /// Rotation period in minutes
    pub rotation_min: u64,

    /// Flush interval in milliseconds
    pub flush_ms: u64,

    /// Per-token queue depth; a full queue blocks producers
    pub queue_max: usize,

    /// Size-threshold rotation in megabytes
    pub max_file_mb: u64,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./events"),
            rotation_min: 60,
            flush_ms: 1000,
            queue_max: 10_000,
            max_file_mb: 100,
        }
    }
}

impl LogConfig {
    pub fn rotation_period(&self) -> Duration {
        Duration::from_secs(self.rotation_min * 60)
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_ms)
    }

    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_mb * 1024 * 1024
    }
}

/// Uploader settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploaderConfig {
    /// Scan period in seconds
    pub every_sec: u64,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self { every_sec: 60 }
    }
}

impl UploaderConfig {
    pub fn upload_every(&self) -> Duration {
        Duration::from_secs(self.every_sec)
    }
}

/// Destination registry settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DestinationsConfig {
    /// Reload poll interval in seconds
    pub reload_sec: u64,
}

impl Default for DestinationsConfig {
    fn default() -> Self {
        Self { reload_sec: 30 }
    }
}

impl DestinationsConfig {
    pub fn reload_every(&self) -> Duration {
        Duration::from_secs(self.reload_sec)
    }
}
