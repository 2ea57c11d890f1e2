//! Persisted per-file per-destination delivery state

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::naming::{STATUS_SUFFIX, status_file_name};

/// Delivery state of one destination for one log file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationStatus {
    pub uploaded: bool,
    pub error: Option<String>,
}

/// Status sidecar contents: destination name to delivery state.
/// BTreeMap keeps the on-disk form stable.
type FileStatuses = BTreeMap<String, DestinationStatus>;

/// Owns the `<logfile>.status` sidecars in the buffer directory
///
/// All mutations go through the single uploader task, so the manager keeps
/// an in-memory cache and persists with write-temp-then-rename for
/// atomicity. A log file may be deleted only after its sidecar shows
/// `uploaded: true` for every configured destination.
pub struct StatusManager {
    dir: PathBuf,
    cache: HashMap<String, FileStatuses>,
}

impl StatusManager {
    /// Load existing sidecars and sweep orphans whose log file is gone
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let mut cache = HashMap::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            let Some(log_file_name) = file_name.strip_suffix(STATUS_SUFFIX) else {
                continue;
            };

            if !dir.join(log_file_name).exists() {
                tracing::info!(status_file = file_name, "removing orphan status file");
                if let Err(err) = fs::remove_file(entry.path()) {
                    tracing::error!(status_file = file_name, error = %err, "orphan removal failed");
                }
                continue;
            }

            match load_statuses(&entry.path()) {
                Ok(statuses) => {
                    cache.insert(log_file_name.to_string(), statuses);
                }
                Err(err) => {
                    tracing::error!(status_file = file_name, error = %err, "unreadable status file");
                }
            }
        }

        Ok(Self { dir, cache })
    }

    /// True iff `destination` has acknowledged `file_name`
    pub fn is_uploaded(&self, file_name: &str, destination: &str) -> bool {
        self.cache
            .get(file_name)
            .and_then(|statuses| statuses.get(destination))
            .map(|status| status.uploaded)
            .unwrap_or(false)
    }

    /// Record the outcome of a store call and persist the sidecar
    pub fn update_status(&mut self, file_name: &str, destination: &str, error: Option<String>) {
        let statuses = self.cache.entry(file_name.to_string()).or_default();
        statuses.insert(
            destination.to_string(),
            DestinationStatus {
                uploaded: error.is_none(),
                error,
            },
        );

        let path = self.dir.join(status_file_name(file_name));
        if let Err(err) = persist_statuses(&path, statuses) {
            // delivery state survives in memory; the next update retries the write
            tracing::error!(
                log_file = file_name,
                destination,
                error = %err,
                "status file write failed"
            );
        }
    }

    /// Drop the sidecar after its log file has been deleted
    pub fn clean_up(&mut self, file_name: &str) {
        self.cache.remove(file_name);
        let path = self.dir.join(status_file_name(file_name));
        if path.exists() {
            if let Err(err) = fs::remove_file(&path) {
                tracing::error!(log_file = file_name, error = %err, "status file removal failed");
            }
        }
    }
}

fn load_statuses(path: &Path) -> io::Result<FileStatuses> {
    let bytes = fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(io::Error::other)
}

/// Write-temp-then-rename so a crash never leaves a torn sidecar
fn persist_statuses(path: &Path, statuses: &FileStatuses) -> io::Result<()> {
    let payload = serde_json::to_vec_pretty(statuses).map_err(io::Error::other)?;
    let tmp_path = path.with_extension("status.tmp");
    fs::write(&tmp_path, payload)?;
    fs::rename(&tmp_path, path)
}

#[cfg(test)]
#[path = "status_test.rs"]
mod status_test;
