//! Token secret resolution

use std::collections::HashMap;

use en_config::TokenConfig;

/// Maps inbound secrets to project token ids
///
/// Client and server secrets live in separate namespaces: a server secret
/// presented on the client endpoint is rejected, and vice versa.
pub struct TokenStore {
    client_secrets: HashMap<String, String>,
    server_secrets: HashMap<String, String>,
}

impl TokenStore {
    pub fn new(tokens: &[TokenConfig]) -> Self {
        let mut client_secrets = HashMap::new();
        let mut server_secrets = HashMap::new();
        for token in tokens {
            if let Some(secret) = &token.client_secret {
                client_secrets.insert(secret.clone(), token.id.clone());
            }
            if let Some(secret) = &token.server_secret {
                server_secrets.insert(secret.clone(), token.id.clone());
            }
        }
        Self {
            client_secrets,
            server_secrets,
        }
    }

    /// Resolve a client (c2s) secret to its token id
    pub fn resolve_client(&self, secret: &str) -> Option<&str> {
        self.client_secrets.get(secret).map(String::as_str)
    }

    /// Resolve a server (s2s) secret to its token id
    pub fn resolve_server(&self, secret: &str) -> Option<&str> {
        self.server_secrets.get(secret).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> TokenStore {
        TokenStore::new(&[TokenConfig {
            id: "project1".into(),
            client_secret: Some("c2stoken".into()),
            server_secret: Some("s2stoken".into()),
        }])
    }

    #[test]
    fn test_resolve_client() {
        assert_eq!(store().resolve_client("c2stoken"), Some("project1"));
        assert_eq!(store().resolve_client("wrong"), None);
    }

    #[test]
    fn test_secrets_are_namespaced() {
        // a server secret is not a client secret
        assert_eq!(store().resolve_client("s2stoken"), None);
        assert_eq!(store().resolve_server("c2stoken"), None);
        assert_eq!(store().resolve_server("s2stoken"), Some("project1"));
    }
}
