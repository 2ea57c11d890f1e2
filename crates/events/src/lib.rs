//! Event facts and ingest-side enrichment
//!
//! A [`Fact`] is a semi-structured JSON event. The preprocessors turn an
//! inbound fact plus HTTP metadata into a normalized record: client IP,
//! geo lookup, parsed user agent and server-assigned identifiers. After
//! preprocessing a fact is immutable and flows to the log writer as-is.
//!
//! Two enrichment scopes exist:
//!
//! - [`ClientPreprocessor`] — browser (c2s) events carry a reserved
//!   `eventn_ctx` object; enrichment lands inside it.
//! - [`ServerPreprocessor`] — server (s2s) events are flat; the whole fact
//!   is the enrichment scope and `event_id` is stamped when absent.

mod fact;
mod geo;
mod preprocessor;
pub mod timestamp;
mod useragent;

pub use fact::{
    EVENT_ID_KEY, EVENTN_CTX_KEY, EventError, Fact, LOCATION_KEY, PARSED_UA_KEY, SOURCE_IP_KEY,
    UA_KEY,
};
pub use geo::{GeoData, GeoError, GeoResolver, NoopGeoResolver};
pub use preprocessor::{ClientPreprocessor, Preprocessor, RequestContext, ServerPreprocessor};
pub use useragent::{BasicUaResolver, ParsedUa, UaResolver};
