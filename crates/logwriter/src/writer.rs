//! Async per-token log writer with rotation

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use dashmap::DashMap;
use en_events::Fact;
use en_logfiles::naming;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::clock::Clock;

/// Log writer errors
#[derive(Debug, Error)]
pub enum LogWriterError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Writer task for the token has stopped
    #[error("log writer for token {token} has stopped")]
    WriterStopped { token: String },
}

/// Writer configuration
#[derive(Debug, Clone)]
pub struct LogWriterConfig {
    /// Buffer directory for `.open` and closed log files
    pub dir: PathBuf,

    /// Timer-driven rotation period
    pub rotation_period: Duration,

    /// How often buffered lines are written out
    pub flush_interval: Duration,

    /// Per-token queue depth; a full queue blocks the producer
    pub queue_size: usize,

    /// Size-threshold rotation
    pub max_file_bytes: u64,
}

impl Default for LogWriterConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./events"),
            rotation_period: Duration::from_secs(60 * 60),
            flush_interval: Duration::from_millis(1000),
            queue_size: 10_000,
            max_file_bytes: 100 * 1024 * 1024,
        }
    }
}

struct WriterHandle {
    sender: mpsc::Sender<Fact>,
    task: JoinHandle<()>,
}

/// Non-blocking fan-in point for enriched facts
///
/// One writer task per token, created on first use. The per-token queue is
/// FIFO with a single consumer, so facts land in log files in enqueue
/// order. When the queue is full `consume` awaits capacity — backpressure
/// reaches the HTTP handler instead of dropping events.
pub struct AsyncLogger {
    config: Arc<LogWriterConfig>,
    clock: Arc<dyn Clock>,
    writers: DashMap<String, WriterHandle>,
}

impl AsyncLogger {
    /// Create the logger, preparing the buffer directory
    ///
    /// Leftover `.open` files from a previous process are closed (renamed)
    /// first so the uploader can ship them.
    pub fn new(config: LogWriterConfig, clock: Arc<dyn Clock>) -> Result<Self, LogWriterError> {
        fs::create_dir_all(&config.dir)?;
        recover_open_files(&config.dir)?;

        Ok(Self {
            config: Arc::new(config),
            clock,
            writers: DashMap::new(),
        })
    }

    /// Queue a fact for the token's writer
    ///
    /// Returns once the fact is queued; durability follows at the next
    /// flush tick.
    pub async fn consume(&self, token: &str, fact: Fact) -> Result<(), LogWriterError> {
        let sender = self.sender_for(token);
        sender
            .send(fact)
            .await
            .map_err(|_| LogWriterError::WriterStopped {
                token: token.to_string(),
            })
    }

    fn sender_for(&self, token: &str) -> mpsc::Sender<Fact> {
        if let Some(handle) = self.writers.get(token) {
            return handle.sender.clone();
        }

        let handle = self
            .writers
            .entry(token.to_string())
            .or_insert_with(|| self.spawn_writer(token));
        handle.sender.clone()
    }

    fn spawn_writer(&self, token: &str) -> WriterHandle {
        let (sender, receiver) = mpsc::channel(self.config.queue_size);
        let writer = TokenWriter {
            token: token.to_string(),
            config: Arc::clone(&self.config),
            clock: Arc::clone(&self.clock),
            seq: 0,
            current: None,
            pending: BytesMut::new(),
        };

        tracing::info!(token, "starting log writer task");
        let task = tokio::spawn(writer.run(receiver));

        WriterHandle { sender, task }
    }

    /// Drain every writer: close channels, wait for final flush and close
    pub async fn close(&self) {
        let tokens: Vec<String> = self.writers.iter().map(|e| e.key().clone()).collect();
        for token in tokens {
            let Some((_, handle)) = self.writers.remove(&token) else {
                continue;
            };
            drop(handle.sender);
            if let Err(err) = handle.task.await {
                tracing::error!(token = %token, error = %err, "writer task join failed");
            }
        }
    }
}

/// Close leftover writer-owned files from a crashed process
fn recover_open_files(dir: &std::path::Path) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        if !naming::is_open_log_name(file_name) {
            continue;
        }

        let closed = dir.join(file_name.trim_end_matches(naming::OPEN_SUFFIX));
        match fs::rename(entry.path(), &closed) {
            Ok(()) => tracing::info!(file = file_name, "recovered orphan open log file"),
            Err(err) => {
                tracing::error!(file = file_name, error = %err, "orphan recovery failed");
            }
        }
    }
    Ok(())
}

struct OpenLogFile {
    /// On-disk path, carrying the `.open` suffix
    path: PathBuf,
    /// Name the file gets once closed
    closed_name: String,
    file: File,
    bytes_written: u64,
}

/// Single-task writer owning one token's open file
///
/// Appends, flushes and rotations all happen on this task, serialized by
/// construction. Write failures keep the pending buffer and retry on the
/// next tick; the task never tears down on I/O errors.
struct TokenWriter {
    token: String,
    config: Arc<LogWriterConfig>,
    clock: Arc<dyn Clock>,
    /// Next file sequence number
    seq: u64,
    current: Option<OpenLogFile>,
    /// Serialized lines awaiting a flush
    pending: BytesMut,
}

impl TokenWriter {
    async fn run(mut self, mut receiver: mpsc::Receiver<Fact>) {
        let mut flush_ticker = tokio::time::interval(self.config.flush_interval);
        flush_ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut rotation_ticker = tokio::time::interval(self.config.rotation_period);
        rotation_ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                fact = receiver.recv() => {
                    match fact {
                        Some(fact) => self.append(&fact),
                        // all senders dropped: drain is complete
                        None => break,
                    }
                }
                _ = flush_ticker.tick() => self.flush(),
                _ = rotation_ticker.tick() => self.rotate(),
            }
        }

        self.flush();
        self.close_current();
        tracing::info!(token = %self.token, "log writer task finished");
    }

    /// Serialize one fact into the pending buffer
    fn append(&mut self, fact: &Fact) {
        match fact.to_json_line() {
            Ok(line) => {
                self.pending.extend_from_slice(line.as_bytes());
                self.pending.extend_from_slice(b"\n");
            }
            Err(err) => {
                tracing::error!(token = %self.token, error = %err, "fact serialization failed");
                return;
            }
        }

        let written = self
            .current
            .as_ref()
            .map(|f| f.bytes_written)
            .unwrap_or(0);
        if written + self.pending.len() as u64 >= self.config.max_file_bytes {
            self.rotate();
        }
    }

    /// Write pending lines to the open file; failures keep the buffer for
    /// the next tick
    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }

        if self.current.is_none() {
            match self.open_file() {
                Ok(open) => self.current = Some(open),
                Err(err) => {
                    tracing::error!(token = %self.token, error = %err, "opening log file failed");
                    return;
                }
            }
        }

        let Some(current) = self.current.as_mut() else {
            return;
        };
        match current.file.write_all(&self.pending) {
            Ok(()) => {
                current.bytes_written += self.pending.len() as u64;
                self.pending.clear();
            }
            Err(err) => {
                tracing::error!(
                    token = %self.token,
                    file = %current.path.display(),
                    error = %err,
                    "log write failed, retrying next flush"
                );
            }
        }
    }

    /// Close and rename the current file, then start a fresh one lazily
    fn rotate(&mut self) {
        self.flush();
        if !self.pending.is_empty() {
            // flush failed; rotating now would strand the buffer
            return;
        }

        let Some(current) = self.current.take() else {
            return;
        };
        if current.bytes_written == 0 {
            self.current = Some(current);
            return;
        }

        let closed_path = self.config.dir.join(&current.closed_name);
        let open_path = current.path.clone();
        drop(current);

        match fs::rename(&open_path, &closed_path) {
            Ok(()) => {
                tracing::debug!(
                    token = %self.token,
                    file = %closed_path.display(),
                    "log file rotated"
                );
            }
            Err(err) => {
                // the stranded .open file is recovered at next startup
                tracing::error!(
                    token = %self.token,
                    file = %open_path.display(),
                    error = %err,
                    "log rotation rename failed"
                );
            }
        }
    }

    /// Final close at shutdown; an untouched file is removed instead of
    /// published
    fn close_current(&mut self) {
        let Some(current) = self.current.take() else {
            return;
        };
        let open_path = current.path.clone();
        let closed_path = self.config.dir.join(&current.closed_name);
        let publish = current.bytes_written > 0;
        drop(current);

        let result = if publish {
            fs::rename(&open_path, &closed_path)
        } else {
            fs::remove_file(&open_path)
        };
        if let Err(err) = result {
            tracing::error!(
                token = %self.token,
                file = %open_path.display(),
                error = %err,
                "closing log file failed"
            );
        }
    }

    fn open_file(&mut self) -> io::Result<OpenLogFile> {
        let now = self.clock.now();
        let closed_name = naming::format_log_name(&self.token, now, self.seq);
        let path = self
            .config
            .dir
            .join(naming::format_open_log_name(&self.token, now, self.seq));

        let file = File::options().create(true).append(true).open(&path)?;
        self.seq += 1;

        tracing::debug!(token = %self.token, file = %path.display(), "opened log file");
        Ok(OpenLogFile {
            path,
            closed_name,
            file,
            bytes_written: 0,
        })
    }
}

#[cfg(test)]
#[path = "writer_test.rs"]
mod writer_test;
