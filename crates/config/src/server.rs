//! HTTP server and token configuration

use serde::Deserialize;

const DEFAULT_PORT: u16 = 8001;
const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// HTTP server settings plus the authorized token list
///
/// # Example
///
/// ```toml
/// [server]
/// address = "0.0.0.0"
/// port = 8001
///
/// [[server.tokens]]
/// id = "project1"
/// client_secret = "c2stoken"
/// server_secret = "s2stoken"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub address: String,

    /// Listen port
    pub port: u16,

    /// Maximum request payload size in bytes
    pub max_payload_bytes: usize,

    /// Authorized tokens
    pub tokens: Vec<TokenConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".into(),
            port: DEFAULT_PORT,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD,
            tokens: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// One project token with its client/server secrets
#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    /// Project identifier; buffer files and destinations are partitioned
    /// by this id
    pub id: String,

    /// Secret accepted on the client (c2s) endpoint
    #[serde(default)]
    pub client_secret: Option<String>,

    /// Secret accepted on the server (s2s) endpoint
    #[serde(default)]
    pub server_secret: Option<String>,
}
