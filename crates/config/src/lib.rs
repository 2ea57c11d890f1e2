//! EventNative configuration
//!
//! TOML-based configuration loading with sensible defaults. A minimal
//! config should just work - only specify what you need to change.
//!
//! # Example Minimal Config
//!
//! ```toml
//! [log]
//! path = "/var/lib/eventnative/events"
//!
//! [[server.tokens]]
//! id = "project1"
//! client_secret = "c2stoken"
//! ```

mod error;
mod log;
mod server;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use log::{DestinationsConfig, LogConfig, UploaderConfig};
pub use server::{ServerConfig, TokenConfig};

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Event log buffer settings
    pub log: LogConfig,

    /// Uploader settings
    pub uploader: UploaderConfig,

    /// Destination registry settings
    pub destinations: DestinationsConfig,

    /// HTTP server and tokens
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, contains invalid TOML or
    /// fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        validation::validate_config(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_loads_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.log.rotation_min, 60);
        assert_eq!(config.uploader.every_sec, 60);
        assert_eq!(config.destinations.reload_sec, 30);
        assert_eq!(config.server.port, 8001);
    }

    #[test]
    fn test_full_config() {
        let toml = r#"
[log]
path = "/tmp/buffer"
rotation_min = 5
flush_ms = 200
queue_max = 500

[uploader]
every_sec = 10

[destinations]
reload_sec = 15

[server]
port = 9000

[[server.tokens]]
id = "project1"
client_secret = "c2stoken"
server_secret = "s2stoken"
"#;
        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.log.path.to_str().unwrap(), "/tmp/buffer");
        assert_eq!(config.log.queue_max, 500);
        assert_eq!(config.uploader.every_sec, 10);
        assert_eq!(config.server.tokens.len(), 1);
    }

    #[test]
    fn test_zero_rotation_rejected() {
        let err = Config::from_str("[log]\nrotation_min = 0").unwrap_err();
        assert!(err.to_string().contains("rotation_min"));
    }

    #[test]
    fn test_duplicate_token_rejected() {
        let toml = r#"
[[server.tokens]]
id = "project1"

[[server.tokens]]
id = "project1"
"#;
        let err = Config::from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateToken { .. }));
    }
}
