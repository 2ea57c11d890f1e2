//! Storage trait and readiness proxy

use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use thiserror::Error;

/// Destination storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// The destination rejected or failed to persist the file
    #[error("store failed: {0}")]
    Store(String),

    /// Destination is unreachable
    #[error("connection error: {0}")]
    Connection(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }
}

/// A destination consuming whole log files
///
/// `store` must be idempotent per `(destination, file_name)`: the uploader
/// never calls it again after a success but may retry after a failure.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Destination name used as the status file key
    fn name(&self) -> &str;

    /// Persist the file's contents
    ///
    /// Returns the number of rows processed alongside the outcome. The
    /// count is meaningful on both paths: a driver that fails partway
    /// through a file reports how many rows it got through before the
    /// error, and delivery metrics are attributed accordingly.
    async fn store(&self, file_name: &str, payload: &[u8]) -> (usize, Result<(), StorageError>);
}

/// Readiness indirection over a storage
///
/// Drivers may initialize asynchronously (connection pools, migrations);
/// until they publish themselves the proxy yields `None` and the uploader
/// keeps the file for a later pass.
pub struct StorageProxy {
    inner: ArcSwap<Option<Arc<dyn Storage>>>,
}

impl StorageProxy {
    /// Proxy with no live storage yet
    pub fn pending() -> Self {
        Self {
            inner: ArcSwap::new(Arc::new(None)),
        }
    }

    /// Proxy wrapping an already-initialized storage
    pub fn ready(storage: Arc<dyn Storage>) -> Self {
        Self {
            inner: ArcSwap::new(Arc::new(Some(storage))),
        }
    }

    /// Publish the initialized storage
    pub fn set(&self, storage: Arc<dyn Storage>) {
        self.inner.store(Arc::new(Some(storage)));
    }

    /// The live storage, or `None` while the driver initializes
    pub fn get(&self) -> Option<Arc<dyn Storage>> {
        self.inner.load().as_ref().clone()
    }
}
