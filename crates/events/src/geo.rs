//! Geo resolution seam
//!
//! Real deployments plug in a MaxMind-style resolver; the pipeline only
//! depends on this trait. Resolution failures are never fatal — the
//! preprocessor logs and stores an empty result.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Geo resolution errors
#[derive(Debug, Error)]
pub enum GeoError {
    /// No geo database is configured
    #[error("geo resolver isn't configured")]
    NotConfigured,

    /// IP could not be resolved
    #[error("unable to resolve ip {ip}: {message}")]
    Resolve { ip: String, message: String },
}

/// Resolved geo data; unknown fields stay absent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

/// Resolve an IP address to geo data
pub trait GeoResolver: Send + Sync {
    fn resolve(&self, ip: &str) -> Result<GeoData, GeoError>;
}

/// Resolver used when no geo database is configured; always returns an
/// empty result so enrichment stays total.
#[derive(Debug, Default)]
pub struct NoopGeoResolver;

impl GeoResolver for NoopGeoResolver {
    fn resolve(&self, _ip: &str) -> Result<GeoData, GeoError> {
        Ok(GeoData::default())
    }
}
