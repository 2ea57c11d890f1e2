//! Configuration validation

use std::collections::HashSet;

use crate::error::{ConfigError, Result};
use crate::Config;

/// Validate a parsed configuration
///
/// Checks value ranges and token uniqueness; an empty token list is legal
/// (the server then rejects every request) so bootstrap configs still load.
pub fn validate_config(config: &Config) -> Result<()> {
    if config.log.rotation_min == 0 {
        return Err(ConfigError::invalid_value(
            "log",
            "rotation_min",
            "must be greater than zero",
        ));
    }
    if config.log.flush_ms == 0 {
        return Err(ConfigError::invalid_value(
            "log",
            "flush_ms",
            "must be greater than zero",
        ));
    }
    if config.log.queue_max == 0 {
        return Err(ConfigError::invalid_value(
            "log",
            "queue_max",
            "must be greater than zero",
        ));
    }
    if config.uploader.every_sec == 0 {
        return Err(ConfigError::invalid_value(
            "uploader",
            "every_sec",
            "must be greater than zero",
        ));
    }
    if config.server.port == 0 {
        return Err(ConfigError::invalid_value(
            "server",
            "port",
            "must be greater than zero",
        ));
    }

    let mut seen = HashSet::new();
    for token in &config.server.tokens {
        if token.id.is_empty() {
            return Err(ConfigError::invalid_value(
                "server.tokens",
                "id",
                "must not be empty",
            ));
        }
        if !seen.insert(token.id.as_str()) {
            return Err(ConfigError::DuplicateToken {
                id: token.id.clone(),
            });
        }
    }

    Ok(())
}
