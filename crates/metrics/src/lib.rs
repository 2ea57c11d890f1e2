//! In-process delivery counters
//!
//! The uploader records the outcome of every `(token, destination)` store
//! call here. Exporters are out of scope; this registry is what an admin
//! endpoint or a test inspects.

mod token_events;

pub use token_events::{MetricsRegistry, TokenEventsCounter, TokenEventsSnapshot};
