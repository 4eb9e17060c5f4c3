//! Execution modes and the background worker pool.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tokio::sync::{Notify, Semaphore};
use tracing::debug;

/// How submitted jobs are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// `add_job` runs the job before returning.
    #[default]
    Inline,
    /// `add_job` returns at once; the job runs on the worker pool.
    Background,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Inline => "inline",
            ExecutionMode::Background => "background",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inline" => Ok(ExecutionMode::Inline),
            "background" => Ok(ExecutionMode::Background),
            other => Err(format!("unknown execution mode '{}'", other)),
        }
    }
}

/// Worker pool for concurrent job execution.
///
/// At most `max_workers` submitted tasks run at the same time; the rest
/// wait for a permit inside their spawned task, so submission never
/// blocks the caller.
pub struct WorkerPool {
    max_workers: usize,
    semaphore: Arc<Semaphore>,
    pending: Arc<AtomicUsize>,
    idle: Arc<Notify>,
    total_processed: Arc<AtomicU64>,
}

impl WorkerPool {
    /// Create a new worker pool.
    pub fn new(max_workers: usize) -> Self {
        let max_workers = max_workers.max(1);
        debug!("Worker pool created with {} workers", max_workers);
        Self {
            max_workers,
            semaphore: Arc::new(Semaphore::new(max_workers)),
            pending: Arc::new(AtomicUsize::new(0)),
            idle: Arc::new(Notify::new()),
            total_processed: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Get number of available workers.
    pub fn available_workers(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Tasks submitted and not yet finished.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Get total processed task count.
    pub fn total_processed(&self) -> u64 {
        self.total_processed.load(Ordering::SeqCst)
    }

    /// Submit a task for execution.
    pub fn submit<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let semaphore = self.semaphore.clone();
        let pending = self.pending.clone();
        let idle = self.idle.clone();
        let total_processed = self.total_processed.clone();

        pending.fetch_add(1, Ordering::SeqCst);

        tokio::spawn(async move {
            // the semaphore is never closed
            if let Ok(_permit) = semaphore.acquire_owned().await {
                task.await;
                total_processed.fetch_add(1, Ordering::SeqCst);
            }

            if pending.fetch_sub(1, Ordering::SeqCst) == 1 {
                debug!("Worker pool idle");
                idle.notify_waiters();
            }
        });
    }

    /// Wait until every submitted task has finished.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }
}
