//! Supervised fire-and-forget task runner
//!
//! Request handlers hand work off here instead of calling `tokio::spawn`
//! directly. Every task runs inside a `background_task` span, and its
//! outcome (error or panic included) is logged through the same subscriber
//! as the request path. Callers never await the task itself.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Notify;
use tracing::{Instrument, debug, error, info_span, warn};

use crate::domain::DomainError;

#[derive(Debug, Default)]
struct Counters {
    in_flight: AtomicUsize,
    spawned: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    idle: Notify,
}

/// Snapshot of task counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundStats {
    pub in_flight: usize,
    pub spawned: u64,
    pub completed: u64,
    pub failed: u64,
}

/// Cloneable handle to the background task supervisor
#[derive(Debug, Clone, Default)]
pub struct BackgroundTasks {
    counters: Arc<Counters>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `task` detached from the caller.
    ///
    /// There is no cancellation: once spawned, the task runs to completion
    /// or failure regardless of what happens to the originating request.
    pub fn spawn<F>(&self, name: &'static str, request_id: &str, task: F)
    where
        F: Future<Output = Result<(), DomainError>> + Send + 'static,
    {
        let counters = self.counters.clone();
        counters.in_flight.fetch_add(1, Ordering::SeqCst);
        counters.spawned.fetch_add(1, Ordering::Relaxed);

        let span = info_span!("background_task", task = name, request_id = %request_id);
        let handle = tokio::spawn(task.instrument(span.clone()));

        tokio::spawn(
            async move {
                match handle.await {
                    Ok(Ok(())) => {
                        counters.completed.fetch_add(1, Ordering::Relaxed);
                        debug!("Background task completed");
                    }
                    Ok(Err(e)) => {
                        counters.failed.fetch_add(1, Ordering::Relaxed);
                        warn!(error = %e, "Background task failed");
                    }
                    Err(join_error) => {
                        counters.failed.fetch_add(1, Ordering::Relaxed);
                        error!(error = %join_error, "Background task panicked");
                    }
                }

                if counters.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
                    counters.idle.notify_waiters();
                }
            }
            .instrument(span),
        );
    }

    pub fn stats(&self) -> BackgroundStats {
        BackgroundStats {
            in_flight: self.counters.in_flight.load(Ordering::SeqCst),
            spawned: self.counters.spawned.load(Ordering::Relaxed),
            completed: self.counters.completed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    /// Resolves once no task is in flight, including tasks spawned while waiting
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.counters.idle.notified();

            if self.counters.in_flight.load(Ordering::SeqCst) == 0 {
                return;
            }

            notified.await;
        }
    }

    /// Like `wait_idle`, bounded by `timeout`; returns false on timeout
    pub async fn wait_idle_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait_idle()).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counts_outcomes() {
        let tasks = BackgroundTasks::new();

        tasks.spawn("ok", "req-1", async { Ok(()) });
        tasks.spawn("err", "req-1", async {
            Err(DomainError::provider("mock", "boom"))
        });
        tasks.spawn("panic", "req-1", async {
            panic!("task exploded");
        });

        tasks.wait_idle().await;

        let stats = tasks.stats();
        assert_eq!(stats.spawned, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.in_flight, 0);
    }

    #[tokio::test]
    async fn test_wait_idle_waits_for_nested_tasks() {
        let tasks = BackgroundTasks::new();
        let inner = tasks.clone();

        tasks.spawn("outer", "req-2", async move {
            inner.spawn("inner", "req-2", async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(())
            });
            Ok(())
        });

        tasks.wait_idle().await;
        assert_eq!(tasks.stats().completed, 2);
    }

    #[tokio::test]
    async fn test_wait_idle_timeout() {
        let tasks = BackgroundTasks::new();

        tasks.spawn("slow", "req-3", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        });

        assert!(!tasks.wait_idle_timeout(Duration::from_millis(20)).await);
        assert_eq!(tasks.stats().in_flight, 1);
    }

    #[tokio::test]
    async fn test_idle_when_nothing_spawned() {
        let tasks = BackgroundTasks::new();
        assert!(tasks.wait_idle_timeout(Duration::from_millis(10)).await);
    }
}
