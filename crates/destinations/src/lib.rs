//! Destination storage seam
//!
//! A destination (Postgres, S3, ...) consumes whole log files through the
//! [`Storage`] trait. The driver implementations live outside this
//! repository; the pipeline only depends on the trait, the readiness
//! indirection of [`StorageProxy`] and the per-token registry in
//! [`Service`].

mod service;
mod storage;
pub mod test_utils;

pub use service::Service;
pub use storage::{Storage, StorageError, StorageProxy};
