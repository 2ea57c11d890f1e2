//! Tests for client and server preprocessors

use std::net::SocketAddr;
use std::sync::Arc;

use http::HeaderMap;
use serde_json::{Value, json};

use crate::fact::{EVENT_ID_KEY, EventError, Fact, PARSED_UA_KEY, SOURCE_IP_KEY};
use crate::geo::{GeoData, GeoError, GeoResolver, NoopGeoResolver};
use crate::preprocessor::{ClientPreprocessor, Preprocessor, RequestContext, ServerPreprocessor};
use crate::timestamp;
use crate::useragent::BasicUaResolver;

const TEST_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                       (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

struct FixedGeoResolver;

impl GeoResolver for FixedGeoResolver {
    fn resolve(&self, _ip: &str) -> Result<GeoData, GeoError> {
        Ok(GeoData {
            country: Some("US".into()),
            city: Some("New York".into()),
            ..Default::default()
        })
    }
}

struct FailingGeoResolver;

impl GeoResolver for FailingGeoResolver {
    fn resolve(&self, ip: &str) -> Result<GeoData, GeoError> {
        Err(GeoError::Resolve {
            ip: ip.to_string(),
            message: "database unavailable".into(),
        })
    }
}

fn client_preprocessor() -> ClientPreprocessor {
    ClientPreprocessor::new(Arc::new(FixedGeoResolver), Arc::new(BasicUaResolver))
}

fn server_preprocessor() -> ServerPreprocessor {
    ServerPreprocessor::new(Arc::new(NoopGeoResolver), Arc::new(BasicUaResolver))
}

fn fact(value: Value) -> Fact {
    Fact::from_value(value).unwrap()
}

fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        headers.insert(
            http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
            value.parse().unwrap(),
        );
    }
    headers
}

#[test]
fn test_client_happy_path() {
    let mut fact = fact(json!({
        "eventn_ctx": {"event_id": "e1", "user_agent": TEST_UA},
        "action": "page_view",
    }));
    let headers = headers(&[("x-real-ip", "95.82.232.185")]);
    let request = RequestContext {
        headers: &headers,
        remote_addr: None,
    };

    client_preprocessor().preprocess(&mut fact, &request).unwrap();

    assert_eq!(fact.get(SOURCE_IP_KEY), Some(&json!("95.82.232.185")));
    assert!(fact.contains_key(timestamp::KEY));

    let ctx = fact.get("eventn_ctx").unwrap().as_object().unwrap();
    assert_eq!(ctx.get("event_id"), Some(&json!("e1")));
    assert_eq!(
        ctx.get("location").unwrap().get("country"),
        Some(&json!("US"))
    );
    assert_eq!(
        ctx.get(PARSED_UA_KEY).unwrap().get("ua_family"),
        Some(&json!("Chrome"))
    );

    // the original payload survives untouched
    assert_eq!(fact.get("action"), Some(&json!("page_view")));
}

#[test]
fn test_client_missing_context() {
    let mut fact = fact(json!({"action": "page_view"}));
    let headers = HeaderMap::new();
    let request = RequestContext {
        headers: &headers,
        remote_addr: None,
    };

    let err = client_preprocessor()
        .preprocess(&mut fact, &request)
        .unwrap_err();
    assert!(matches!(err, EventError::MissingContext));
}

#[test]
fn test_client_context_not_an_object() {
    let mut fact = fact(json!({"eventn_ctx": "not an object"}));
    let headers = HeaderMap::new();
    let request = RequestContext {
        headers: &headers,
        remote_addr: None,
    };

    let err = client_preprocessor()
        .preprocess(&mut fact, &request)
        .unwrap_err();
    assert!(matches!(err, EventError::MissingContext));
}

#[test]
fn test_client_idempotent_after_first_call() {
    let mut fact = fact(json!({
        "eventn_ctx": {"user_agent": TEST_UA},
    }));
    let headers = headers(&[("x-real-ip", "10.0.0.1")]);
    let request = RequestContext {
        headers: &headers,
        remote_addr: None,
    };

    let preprocessor = client_preprocessor();
    preprocessor.preprocess(&mut fact, &request).unwrap();
    let first = fact.clone();
    preprocessor.preprocess(&mut fact, &request).unwrap();

    assert_eq!(first, fact);
}

#[test]
fn test_geo_failure_is_not_fatal() {
    let preprocessor =
        ClientPreprocessor::new(Arc::new(FailingGeoResolver), Arc::new(BasicUaResolver));
    let mut fact = fact(json!({"eventn_ctx": {}}));
    let headers = headers(&[("x-real-ip", "10.0.0.1")]);
    let request = RequestContext {
        headers: &headers,
        remote_addr: None,
    };

    preprocessor.preprocess(&mut fact, &request).unwrap();

    let ctx = fact.get("eventn_ctx").unwrap().as_object().unwrap();
    assert_eq!(ctx.get("location"), Some(&Value::Null));
}

#[test]
fn test_ip_extraction_precedence() {
    let preprocessor = client_preprocessor();
    let remote_addr: SocketAddr = "192.168.1.50:43210".parse().unwrap();

    // X-Real-IP wins
    let both = headers(&[("x-real-ip", "1.1.1.1"), ("x-forwarded-for", "2.2.2.2")]);
    let mut f = fact(json!({"eventn_ctx": {}}));
    preprocessor
        .preprocess(
            &mut f,
            &RequestContext {
                headers: &both,
                remote_addr: Some(remote_addr),
            },
        )
        .unwrap();
    assert_eq!(f.get(SOURCE_IP_KEY), Some(&json!("1.1.1.1")));

    // then the first X-Forwarded-For entry
    let xff = headers(&[("x-forwarded-for", "2.2.2.2, 3.3.3.3")]);
    let mut f = fact(json!({"eventn_ctx": {}}));
    preprocessor
        .preprocess(
            &mut f,
            &RequestContext {
                headers: &xff,
                remote_addr: Some(remote_addr),
            },
        )
        .unwrap();
    assert_eq!(f.get(SOURCE_IP_KEY), Some(&json!("2.2.2.2")));

    // then the peer address
    let empty = HeaderMap::new();
    let mut f = fact(json!({"eventn_ctx": {}}));
    preprocessor
        .preprocess(
            &mut f,
            &RequestContext {
                headers: &empty,
                remote_addr: Some(remote_addr),
            },
        )
        .unwrap();
    assert_eq!(f.get(SOURCE_IP_KEY), Some(&json!("192.168.1.50")));
}

#[test]
fn test_server_stamps_event_id() {
    let mut fact = fact(json!({"user_agent": TEST_UA, "action": "signup"}));
    let headers = headers(&[("x-real-ip", "10.0.0.1")]);
    let request = RequestContext {
        headers: &headers,
        remote_addr: None,
    };

    server_preprocessor().preprocess(&mut fact, &request).unwrap();

    let event_id = fact.get(EVENT_ID_KEY).unwrap().as_str().unwrap();
    assert!(!event_id.is_empty());

    // enrichment scope is the fact root
    assert!(fact.get(PARSED_UA_KEY).is_some());
    assert!(fact.get("location").is_some());
    assert!(fact.get("eventn_ctx").is_none());
}

#[test]
fn test_server_keeps_existing_event_id() {
    let mut fact = fact(json!({"event_id": "supplied"}));
    let headers = HeaderMap::new();
    let request = RequestContext {
        headers: &headers,
        remote_addr: None,
    };

    server_preprocessor().preprocess(&mut fact, &request).unwrap();

    assert_eq!(fact.get(EVENT_ID_KEY), Some(&json!("supplied")));
}

#[test]
fn test_server_idempotent_after_first_call() {
    let mut fact = fact(json!({"user_agent": TEST_UA}));
    let headers = headers(&[("x-real-ip", "10.0.0.1")]);
    let request = RequestContext {
        headers: &headers,
        remote_addr: None,
    };

    let preprocessor = server_preprocessor();
    preprocessor.preprocess(&mut fact, &request).unwrap();
    let first = fact.clone();
    preprocessor.preprocess(&mut fact, &request).unwrap();

    assert_eq!(first, fact);
}
