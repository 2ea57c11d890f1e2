//! HTTP source error types

use thiserror::Error;

/// HTTP source errors
#[derive(Debug, Error)]
pub enum IngestError {
    /// Failed to bind to address
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Server error
    #[error("HTTP server error: {0}")]
    Serve(String),
}
