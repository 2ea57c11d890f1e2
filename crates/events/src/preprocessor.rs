//! Fact preprocessors: IP, geo and user agent enrichment

use std::hash::{DefaultHasher, Hash, Hasher};
use std::net::SocketAddr;
use std::sync::Arc;

use http::HeaderMap;
use serde_json::Value;

use crate::fact::{
    EVENT_ID_KEY, EVENTN_CTX_KEY, EventError, Fact, LOCATION_KEY, PARSED_UA_KEY, SOURCE_IP_KEY,
    UA_KEY,
};
use crate::geo::GeoResolver;
use crate::timestamp;
use crate::useragent::UaResolver;

/// HTTP metadata accompanying an inbound fact
pub struct RequestContext<'a> {
    pub headers: &'a HeaderMap,
    pub remote_addr: Option<SocketAddr>,
}

/// Enrich an inbound fact in place
pub trait Preprocessor: Send + Sync {
    fn preprocess(&self, fact: &mut Fact, request: &RequestContext<'_>) -> Result<(), EventError>;
}

/// Client IP: first non-empty of `X-Real-IP`, `X-Forwarded-For` (first
/// element for proxy chains), then the peer address.
fn extract_ip(request: &RequestContext<'_>) -> String {
    for header in ["x-real-ip", "x-forwarded-for"] {
        let Some(value) = request.headers.get(header) else {
            continue;
        };
        let Ok(value) = value.to_str() else {
            continue;
        };
        let ip = value.split(',').next().unwrap_or("").trim();
        if !ip.is_empty() {
            return ip.to_string();
        }
    }
    request
        .remote_addr
        .map(|addr| addr.ip().to_string())
        .unwrap_or_default()
}

/// Preprocessor for client (c2s) events
///
/// Enrichment lands inside the reserved `eventn_ctx` object; a fact
/// without one is rejected.
pub struct ClientPreprocessor {
    geo_resolver: Arc<dyn GeoResolver>,
    ua_resolver: Arc<dyn UaResolver>,
}

impl ClientPreprocessor {
    pub fn new(geo_resolver: Arc<dyn GeoResolver>, ua_resolver: Arc<dyn UaResolver>) -> Self {
        Self {
            geo_resolver,
            ua_resolver,
        }
    }
}

impl Preprocessor for ClientPreprocessor {
    fn preprocess(&self, fact: &mut Fact, request: &RequestContext<'_>) -> Result<(), EventError> {
        let ip = extract_ip(request);
        if !ip.is_empty() {
            fact.insert(SOURCE_IP_KEY, Value::String(ip.clone()));
        }

        if !matches!(fact.get(EVENTN_CTX_KEY), Some(Value::Object(_))) {
            return Err(EventError::MissingContext);
        }

        let location = resolve_location(self.geo_resolver.as_ref(), &ip);

        let Some(ctx) = fact.eventn_ctx_mut() else {
            return Err(EventError::MissingContext);
        };

        ctx.insert(LOCATION_KEY.to_string(), location);

        let user_agent = match ctx.get(UA_KEY) {
            Some(Value::String(ua)) => Some(ua.clone()),
            _ => None,
        };
        if let Some(ua) = user_agent {
            let parsed = self.ua_resolver.resolve(&ua);
            ctx.insert(
                PARSED_UA_KEY.to_string(),
                serde_json::to_value(parsed).unwrap_or(Value::Null),
            );
        }

        if !fact.contains_key(timestamp::KEY) {
            fact.insert(timestamp::KEY, Value::String(timestamp::now_utc()));
        }

        Ok(())
    }
}

/// Preprocessor for server (s2s) events
///
/// The whole fact is the enrichment scope; `event_id` is stamped when
/// absent, derived from the payload digest and the receipt timestamp.
pub struct ServerPreprocessor {
    geo_resolver: Arc<dyn GeoResolver>,
    ua_resolver: Arc<dyn UaResolver>,
}

impl ServerPreprocessor {
    pub fn new(geo_resolver: Arc<dyn GeoResolver>, ua_resolver: Arc<dyn UaResolver>) -> Self {
        Self {
            geo_resolver,
            ua_resolver,
        }
    }
}

impl Preprocessor for ServerPreprocessor {
    fn preprocess(&self, fact: &mut Fact, request: &RequestContext<'_>) -> Result<(), EventError> {
        let ip = extract_ip(request);
        if !ip.is_empty() {
            fact.insert(SOURCE_IP_KEY, Value::String(ip.clone()));
        }

        let location = resolve_location(self.geo_resolver.as_ref(), &ip);
        fact.insert(LOCATION_KEY, location);

        let user_agent = match fact.get(UA_KEY) {
            Some(Value::String(ua)) => Some(ua.clone()),
            _ => None,
        };
        if let Some(ua) = user_agent {
            let parsed = self.ua_resolver.resolve(&ua);
            fact.insert(
                PARSED_UA_KEY,
                serde_json::to_value(parsed).unwrap_or(Value::Null),
            );
        }

        if !fact.contains_key(timestamp::KEY) {
            fact.insert(timestamp::KEY, Value::String(timestamp::now_utc()));
        }

        if !fact.contains_key(EVENT_ID_KEY) {
            let received_at = match fact.get(timestamp::KEY) {
                Some(Value::String(ts)) => ts.clone(),
                _ => timestamp::now_utc(),
            };
            let event_id = generate_event_id(fact, &received_at);
            fact.insert(EVENT_ID_KEY, Value::String(event_id));
        }

        Ok(())
    }
}

/// Geo failure is never fatal: log and continue with an empty result
fn resolve_location(resolver: &dyn GeoResolver, ip: &str) -> Value {
    match resolver.resolve(ip) {
        Ok(data) => serde_json::to_value(data).unwrap_or(Value::Null),
        Err(err) => {
            tracing::warn!(ip, error = %err, "geo resolution failed");
            Value::Null
        }
    }
}

/// Deterministic event id: digest of the canonical payload bytes and the
/// receipt timestamp
fn generate_event_id(fact: &Fact, received_at: &str) -> String {
    let payload = serde_json::to_vec(fact.as_map()).unwrap_or_default();
    let mut hasher = DefaultHasher::new();
    payload.hash(&mut hasher);
    received_at.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

#[cfg(test)]
#[path = "preprocessor_test.rs"]
mod preprocessor_test;
