//! Restart-on-failure supervision
//!
//! Long-running loops (the uploader, destination reload polling) are
//! spawned through [`run_with_restart`]: a run that returns an error or
//! panics is logged and restarted with capped exponential backoff. A run
//! that completes cleanly, or cancellation, ends the supervision.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Backoff policy for restarts
#[derive(Debug, Clone, Copy)]
pub struct RestartPolicy {
    /// Delay before the first restart
    pub initial_backoff: Duration,

    /// Backoff cap; doubling stops here
    pub max_backoff: Duration,

    /// A run surviving this long resets the backoff
    pub healthy_after: Duration,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            healthy_after: Duration::from_secs(60),
        }
    }
}

/// Supervise a restartable task
///
/// `factory` produces a fresh run of the loop. Each run is spawned so a
/// panic is contained and observed as a `JoinError`. The returned handle
/// resolves when the task completes cleanly or the token is cancelled.
pub fn run_with_restart<F, Fut, E>(
    name: &'static str,
    cancel: CancellationToken,
    policy: RestartPolicy,
    factory: F,
) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: Display + Send + 'static,
{
    tokio::spawn(async move {
        let mut backoff = policy.initial_backoff;

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let started = Instant::now();
            let mut run = tokio::spawn(factory());

            let failed = tokio::select! {
                _ = cancel.cancelled() => {
                    // the run observes the same token; let it finish its
                    // current step instead of aborting mid-operation
                    if let Err(join_err) = (&mut run).await {
                        if join_err.is_panic() {
                            tracing::error!(task = name, error = %join_err, "task panicked during shutdown");
                        }
                    }
                    break;
                }
                result = &mut run => match result {
                    Ok(Ok(())) => {
                        tracing::info!(task = name, "task finished");
                        break;
                    }
                    Ok(Err(err)) => {
                        tracing::error!(task = name, error = %err, "task failed");
                        true
                    }
                    Err(join_err) if join_err.is_panic() => {
                        tracing::error!(task = name, error = %join_err, "task panicked");
                        true
                    }
                    Err(_) => break,
                },
            };

            if failed {
                if started.elapsed() >= policy.healthy_after {
                    backoff = policy.initial_backoff;
                }
                tracing::info!(task = name, backoff = ?backoff, "restarting task");
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(backoff) => {}
                }
                backoff = (backoff * 2).min(policy.max_backoff);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn quick_policy() -> RestartPolicy {
        RestartPolicy {
            initial_backoff: Duration::from_millis(5),
            max_backoff: Duration::from_millis(20),
            healthy_after: Duration::from_secs(60),
        }
    }

    #[tokio::test]
    async fn test_clean_finish_is_not_restarted() {
        let runs = Arc::new(AtomicUsize::new(0));
        let runs_clone = runs.clone();

        let handle = run_with_restart(
            "clean",
            CancellationToken::new(),
            quick_policy(),
            move || {
                let runs = runs_clone.clone();
                async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok::<(), std::io::Error>(())
                }
            },
        );

        handle.await.unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_run_is_restarted_until_success() {
        let runs = Arc::new(AtomicUsize::new(0));
        let runs_clone = runs.clone();

        let handle = run_with_restart(
            "flaky",
            CancellationToken::new(),
            quick_policy(),
            move || {
                let runs = runs_clone.clone();
                async move {
                    if runs.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(std::io::Error::other("transient"))
                    } else {
                        Ok(())
                    }
                }
            },
        );

        handle.await.unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_panicking_run_is_restarted() {
        let runs = Arc::new(AtomicUsize::new(0));
        let runs_clone = runs.clone();

        let handle = run_with_restart(
            "panicky",
            CancellationToken::new(),
            quick_policy(),
            move || {
                let runs = runs_clone.clone();
                async move {
                    if runs.fetch_add(1, Ordering::SeqCst) == 0 {
                        panic!("boom");
                    }
                    Ok::<(), std::io::Error>(())
                }
            },
        );

        handle.await.unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancellation_stops_supervision() {
        let cancel = CancellationToken::new();
        let handle = run_with_restart("stuck", cancel.clone(), quick_policy(), || async {
            Err::<(), std::io::Error>(std::io::Error::other("always fails"))
        });

        tokio::time::sleep(Duration::from_millis(30)).await;
        cancel.cancel();
        handle.await.unwrap();
    }
}
