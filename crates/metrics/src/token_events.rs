//! Per-(token, destination) delivery counters

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::Serialize;

/// Counters for one (token, destination) pair
#[derive(Debug, Default)]
pub struct TokenEventsCounter {
    /// Events delivered successfully
    pub events_success: AtomicU64,

    /// Events in failed store calls
    pub events_errors: AtomicU64,

    /// Files delivered successfully
    pub files_success: AtomicU64,

    /// Failed store calls
    pub files_errors: AtomicU64,
}

impl TokenEventsCounter {
    pub const fn new() -> Self {
        Self {
            events_success: AtomicU64::new(0),
            events_errors: AtomicU64::new(0),
            files_success: AtomicU64::new(0),
            files_errors: AtomicU64::new(0),
        }
    }

    #[inline]
    fn record_success(&self, rows: u64) {
        self.events_success.fetch_add(rows, Ordering::Relaxed);
        self.files_success.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_error(&self, rows: u64) {
        self.events_errors.fetch_add(rows, Ordering::Relaxed);
        self.files_errors.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time view of one counter pair
#[derive(Debug, Clone, Serialize)]
pub struct TokenEventsSnapshot {
    pub token: String,
    pub destination: String,
    pub events_success: u64,
    pub events_errors: u64,
    pub files_success: u64,
    pub files_errors: u64,
}

/// Registry of delivery counters
#[derive(Default)]
pub struct MetricsRegistry {
    counters: DashMap<(String, String), Arc<TokenEventsCounter>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful store of `rows` events
    pub fn success_token_events(&self, token: &str, destination: &str, rows: usize) {
        self.counter(token, destination).record_success(rows as u64);
    }

    /// Record a failed store call
    pub fn error_token_events(&self, token: &str, destination: &str, rows: usize) {
        self.counter(token, destination).record_error(rows as u64);
    }

    fn counter(&self, token: &str, destination: &str) -> Arc<TokenEventsCounter> {
        self.counters
            .entry((token.to_string(), destination.to_string()))
            .or_default()
            .clone()
    }

    /// Snapshot of every counter pair, sorted for stable output
    pub fn snapshot(&self) -> Vec<TokenEventsSnapshot> {
        let mut snapshots: Vec<TokenEventsSnapshot> = self
            .counters
            .iter()
            .map(|entry| {
                let (token, destination) = entry.key();
                let counter = entry.value();
                TokenEventsSnapshot {
                    token: token.clone(),
                    destination: destination.clone(),
                    events_success: counter.events_success.load(Ordering::Relaxed),
                    events_errors: counter.events_errors.load(Ordering::Relaxed),
                    files_success: counter.files_success.load(Ordering::Relaxed),
                    files_errors: counter.files_errors.load(Ordering::Relaxed),
                }
            })
            .collect();
        snapshots.sort_by(|a, b| (&a.token, &a.destination).cmp(&(&b.token, &b.destination)));
        snapshots
    }
}
