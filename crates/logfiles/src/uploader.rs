//! Periodic uploader: ship closed log files to destinations

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use en_destinations::Service;
use en_metrics::MetricsRegistry;
use thiserror::Error;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::naming;
use crate::status::StatusManager;

/// Backoff while the destination registry is being swapped
const RELOAD_BACKOFF: Duration = Duration::from_secs(2);

/// Uploader errors that end the loop (the supervisor restarts it)
#[derive(Debug, Error)]
pub enum UploaderError {
    /// Buffer directory scan failed
    #[error("error scanning {path}: {source}")]
    Scan {
        path: String,
        #[source]
        source: io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Uploader configuration
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    /// Buffer directory holding closed log files
    pub log_path: PathBuf,

    /// Scan period between passes
    pub upload_every: Duration,
}

/// Ships closed log files to every destination configured for their token
///
/// Runs as a single task: serialized uploads bound destination concurrency
/// and keep status bookkeeping contention-free. A file stays on disk until
/// every destination acknowledges; this task is the only component allowed
/// to delete closed log files.
pub struct PeriodicUploader {
    config: UploaderConfig,
    status_manager: StatusManager,
    destinations: Arc<Service>,
    metrics: Arc<MetricsRegistry>,
}

impl PeriodicUploader {
    pub fn new(
        config: UploaderConfig,
        destinations: Arc<Service>,
        metrics: Arc<MetricsRegistry>,
    ) -> io::Result<Self> {
        let status_manager = StatusManager::new(&config.log_path)?;
        Ok(Self {
            config,
            status_manager,
            destinations,
            metrics,
        })
    }

    /// Run upload passes until cancelled
    pub async fn run(mut self, cancel: CancellationToken) -> Result<(), UploaderError> {
        tracing::info!(
            path = %self.config.log_path.display(),
            every = ?self.config.upload_every,
            "uploader starting"
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }

            if self.destinations.reloading() {
                tracing::debug!("destinations reloading, backing off");
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = sleep(RELOAD_BACKOFF) => {}
                }
                continue;
            }

            self.process_pass().await?;

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(self.config.upload_every) => {}
            }
        }

        tracing::info!("uploader stopped");
        Ok(())
    }

    /// One scan over the buffer directory
    async fn process_pass(&mut self) -> Result<(), UploaderError> {
        let entries = fs::read_dir(&self.config.log_path).map_err(|source| UploaderError::Scan {
            path: self.config.log_path.display().to_string(),
            source,
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(OsStr::to_str)
                    .is_some_and(|name| name.ends_with(".log"))
            })
            .collect();
        files.sort();

        for path in files {
            self.process_file(&path).await;
        }

        Ok(())
    }

    /// Handle a single closed log file; per-file errors never end the pass
    async fn process_file(&mut self, path: &Path) {
        let Some(file_name) = path.file_name().and_then(OsStr::to_str) else {
            return;
        };

        let payload = match fs::read(path) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::error!(file = %path.display(), error = %err, "error reading log file");
                return;
            }
        };

        if payload.is_empty() {
            if let Err(err) = fs::remove_file(path) {
                tracing::error!(file = %path.display(), error = %err, "error deleting empty file");
            }
            return;
        }

        // a closed file with an unparseable name needs human intervention;
        // it is left in place so nothing is lost
        let Some(token) = naming::token_from_log_name(file_name) else {
            tracing::error!(file = %path.display(), "malformed log file name, skipping");
            return;
        };
        let token = token.to_string();

        let storage_proxies = self.destinations.get_storages(&token);
        if storage_proxies.is_empty() {
            tracing::warn!(
                file = %path.display(),
                token = %token,
                "no destination storages for token, keeping file"
            );
            return;
        }

        let mut delete_file = true;
        for proxy in storage_proxies {
            let Some(storage) = proxy.get() else {
                // destination still initializing; try again next pass
                delete_file = false;
                continue;
            };
            let destination = storage.name();

            if self.status_manager.is_uploaded(file_name, destination) {
                continue;
            }

            // rows is meaningful on both outcomes: a driver failing partway
            // through reports how far it got
            let (rows, result) = storage.store(file_name, &payload).await;
            match result {
                Ok(()) => {
                    self.metrics.success_token_events(&token, destination, rows);
                    self.status_manager.update_status(file_name, destination, None);
                }
                Err(err) => {
                    delete_file = false;
                    tracing::error!(
                        file = %path.display(),
                        destination,
                        error = %err,
                        "error storing file in destination"
                    );
                    self.metrics.error_token_events(&token, destination, rows);
                    self.status_manager
                        .update_status(file_name, destination, Some(err.to_string()));
                }
            }
        }

        if delete_file {
            match fs::remove_file(path) {
                Ok(()) => self.status_manager.clean_up(file_name),
                Err(err) => {
                    tracing::error!(file = %path.display(), error = %err, "error deleting log file");
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "uploader_test.rs"]
mod uploader_test;
