//! Per-token destination registry

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;

use crate::storage::StorageProxy;

/// Maps tokens to their destination storages
///
/// The `reloading` flag is raised around configuration swaps; readers
/// (the uploader) must back off while it is set instead of observing a
/// half-registered destination set.
#[derive(Default)]
pub struct Service {
    storages: DashMap<String, Vec<Arc<StorageProxy>>>,
    reloading: AtomicBool,
}

impl Service {
    pub fn new() -> Self {
        Self::default()
    }

    /// Destination storages configured for a token; empty when none
    pub fn get_storages(&self, token: &str) -> Vec<Arc<StorageProxy>> {
        self.storages
            .get(token)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Register an additional destination for a token
    pub fn register(&self, token: impl Into<String>, proxy: Arc<StorageProxy>) {
        self.storages.entry(token.into()).or_default().push(proxy);
    }

    /// True while a configuration swap is in flight
    pub fn reloading(&self) -> bool {
        self.reloading.load(Ordering::Acquire)
    }

    /// Raise the reloading flag and clear the registry for re-registration
    pub fn begin_reload(&self) {
        self.reloading.store(true, Ordering::Release);
        self.storages.clear();
        tracing::info!("destination reload started");
    }

    /// Drop the reloading flag after re-registration completes
    pub fn finish_reload(&self) {
        self.reloading.store(false, Ordering::Release);
        tracing::info!("destination reload finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RecordingStorage;

    #[test]
    fn test_get_storages_unknown_token() {
        let service = Service::new();
        assert!(service.get_storages("missing").is_empty());
    }

    #[test]
    fn test_register_and_lookup() {
        let service = Service::new();
        let storage = Arc::new(RecordingStorage::new("pg"));
        service.register("token1", Arc::new(StorageProxy::ready(storage)));

        assert_eq!(service.get_storages("token1").len(), 1);
        assert!(service.get_storages("token2").is_empty());
    }

    #[test]
    fn test_reload_flag_and_clear() {
        let service = Service::new();
        let storage = Arc::new(RecordingStorage::new("pg"));
        service.register("token1", Arc::new(StorageProxy::ready(storage)));

        service.begin_reload();
        assert!(service.reloading());
        assert!(service.get_storages("token1").is_empty());

        service.finish_reload();
        assert!(!service.reloading());
    }
}
