//! User agent parsing seam

use serde::{Deserialize, Serialize};

/// Parsed user agent structure stored under `parsed_ua`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedUa {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ua_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ua_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_family: Option<String>,
}

/// Parse a raw user agent string
///
/// Parsing is best-effort; unrecognized agents yield an empty structure.
pub trait UaResolver: Send + Sync {
    fn resolve(&self, user_agent: &str) -> ParsedUa;
}

/// Token-scanning parser covering the common browser and OS families
///
/// Deliberately small: deployments that need full UA intelligence plug in
/// their own resolver.
#[derive(Debug, Default)]
pub struct BasicUaResolver;

impl UaResolver for BasicUaResolver {
    fn resolve(&self, user_agent: &str) -> ParsedUa {
        ParsedUa {
            ua_family: browser_family(user_agent).map(|(family, _)| family.to_string()),
            ua_version: browser_family(user_agent).and_then(|(_, version)| version),
            os_family: os_family(user_agent).map(str::to_string),
            device_family: device_family(user_agent).map(str::to_string),
        }
    }
}

/// Browser detection; order matters because Chrome UAs contain "Safari"
/// and Edge UAs contain "Chrome".
fn browser_family(ua: &str) -> Option<(&'static str, Option<String>)> {
    for (token, family) in [
        ("Edg/", "Edge"),
        ("OPR/", "Opera"),
        ("Firefox/", "Firefox"),
        ("Chrome/", "Chrome"),
        ("Safari/", "Safari"),
    ] {
        if let Some(idx) = ua.find(token) {
            let version = if family == "Safari" {
                // Safari reports its version in a separate token
                version_after(ua, "Version/")
            } else {
                version_at(ua, idx + token.len())
            };
            return Some((family, version));
        }
    }
    None
}

fn version_after(ua: &str, token: &str) -> Option<String> {
    ua.find(token).and_then(|idx| version_at(ua, idx + token.len()))
}

fn version_at(ua: &str, start: usize) -> Option<String> {
    let version: String = ua[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if version.is_empty() { None } else { Some(version) }
}

fn os_family(ua: &str) -> Option<&'static str> {
    // Android UAs contain "Linux", iOS UAs contain "Mac OS X"
    for (token, family) in [
        ("Android", "Android"),
        ("iPhone OS", "iOS"),
        ("iPad", "iOS"),
        ("Windows", "Windows"),
        ("Mac OS X", "Mac OS X"),
        ("Linux", "Linux"),
    ] {
        if ua.contains(token) {
            return Some(family);
        }
    }
    None
}

fn device_family(ua: &str) -> Option<&'static str> {
    for (token, family) in [("iPhone", "iPhone"), ("iPad", "iPad"), ("Android", "Android")] {
        if ua.contains(token) {
            return Some(family);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chrome_on_mac() {
        let ua = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                  (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
        let parsed = BasicUaResolver.resolve(ua);
        assert_eq!(parsed.ua_family.as_deref(), Some("Chrome"));
        assert_eq!(parsed.ua_version.as_deref(), Some("120.0.0.0"));
        assert_eq!(parsed.os_family.as_deref(), Some("Mac OS X"));
    }

    #[test]
    fn test_firefox_on_linux() {
        let ua = "Mozilla/5.0 (X11; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/119.0";
        let parsed = BasicUaResolver.resolve(ua);
        assert_eq!(parsed.ua_family.as_deref(), Some("Firefox"));
        assert_eq!(parsed.os_family.as_deref(), Some("Linux"));
    }

    #[test]
    fn test_unrecognized_agent() {
        let parsed = BasicUaResolver.resolve("curl/8.4.0");
        assert_eq!(parsed, ParsedUa::default());
    }

    #[test]
    fn test_parse_is_deterministic() {
        let ua = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)";
        assert_eq!(BasicUaResolver.resolve(ua), BasicUaResolver.resolve(ua));
    }
}
