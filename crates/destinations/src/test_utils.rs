//! In-memory storage double for pipeline tests

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::storage::{Storage, StorageError};

/// Records every `store` call and can be scripted to fail the first N
/// attempts, which is how upload-retry behavior is exercised.
pub struct RecordingStorage {
    name: String,
    fail_remaining: AtomicUsize,
    partial_rows_on_failure: AtomicUsize,
    stored_files: Mutex<Vec<String>>,
}

impl RecordingStorage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fail_remaining: AtomicUsize::new(0),
            partial_rows_on_failure: AtomicUsize::new(0),
            stored_files: Mutex::new(Vec::new()),
        }
    }

    /// Fail the next `n` store calls before succeeding
    pub fn fail_next(self, n: usize) -> Self {
        self.fail_remaining.store(n, Ordering::SeqCst);
        self
    }

    /// Report `rows` as already processed when a scripted failure fires,
    /// imitating a driver that dies partway through a file
    pub fn with_partial_rows(self, rows: usize) -> Self {
        self.partial_rows_on_failure.store(rows, Ordering::SeqCst);
        self
    }

    /// File names stored so far, in call order
    pub fn stored_files(&self) -> Vec<String> {
        self.stored_files.lock().unwrap().clone()
    }

    pub fn store_count(&self) -> usize {
        self.stored_files.lock().unwrap().len()
    }
}

#[async_trait]
impl Storage for RecordingStorage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn store(&self, file_name: &str, payload: &[u8]) -> (usize, Result<(), StorageError>) {
        let remaining = self.fail_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_remaining.store(remaining - 1, Ordering::SeqCst);
            let partial = self.partial_rows_on_failure.load(Ordering::SeqCst);
            return (partial, Err(StorageError::store("scripted failure")));
        }

        self.stored_files
            .lock()
            .unwrap()
            .push(file_name.to_string());
        let rows = payload.split(|&b| b == b'\n').filter(|l| !l.is_empty()).count();
        (rows, Ok(()))
    }
}
