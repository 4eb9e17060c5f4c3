//! Execution events and listener dispatch.
//!
//! Listeners observe each execution twice: before the handler is invoked
//! and after the outcome has been persisted. Every listener call is
//! bounded by the dispatcher's timeout; a listener that exceeds it is
//! abandoned with a warning and dispatch continues with the next one.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::time::timeout;
use tracing::{debug, warn};

use jobkeeper_protocols::{ExecutionContext, HandlerError, Job};

/// Default listener timeout.
pub const DEFAULT_LISTENER_TIMEOUT: Duration = Duration::from_secs(5);

/// Event published around a job execution.
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    /// Job is `RUNNING`, handler not yet invoked.
    PreExecute { job: Job, context: ExecutionContext },
    /// Outcome persisted.
    PostExecute { job: Job, context: ExecutionContext },
}

impl ExecutionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ExecutionEvent::PreExecute { .. } => "pre_execute",
            ExecutionEvent::PostExecute { .. } => "post_execute",
        }
    }

    pub fn job(&self) -> &Job {
        match self {
            ExecutionEvent::PreExecute { job, .. } | ExecutionEvent::PostExecute { job, .. } => job,
        }
    }

    pub fn context(&self) -> &ExecutionContext {
        match self {
            ExecutionEvent::PreExecute { context, .. }
            | ExecutionEvent::PostExecute { context, .. } => context,
        }
    }
}

/// Observer of execution events.
#[async_trait]
pub trait ExecutionListener: Send + Sync {
    /// Listener name, used in diagnostics.
    fn name(&self) -> &str;

    /// Priority for dispatch ordering (higher = called earlier).
    fn priority(&self) -> i32 {
        0
    }

    /// Handle an event. Errors are logged and do not affect the job.
    async fn on_event(&self, event: &ExecutionEvent) -> Result<(), HandlerError>;
}

/// Publishes execution events to registered listeners in priority order.
pub struct EventDispatcher {
    listeners: RwLock<Vec<Arc<dyn ExecutionListener>>>,
    listener_timeout: Duration,
}

impl EventDispatcher {
    pub fn new(listener_timeout: Duration) -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
            listener_timeout,
        }
    }

    pub fn listener_timeout(&self) -> Duration {
        self.listener_timeout
    }

    /// Register a listener.
    pub fn subscribe(&self, listener: Arc<dyn ExecutionListener>) {
        let mut listeners = self.listeners.write();
        listeners.push(listener);
        listeners.sort_by(|a, b| b.priority().cmp(&a.priority()));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Deliver an event to every listener.
    pub async fn dispatch(&self, event: &ExecutionEvent) {
        // snapshot so no lock is held while listeners run
        let listeners: Vec<_> = self.listeners.read().clone();

        for listener in listeners {
            match timeout(self.listener_timeout, listener.on_event(event)).await {
                Ok(Ok(())) => {
                    debug!("Listener '{}' handled {}", listener.name(), event.name());
                }
                Ok(Err(e)) => {
                    warn!(
                        ticket = %event.job().ticket,
                        "Listener '{}' failed on {}: {}",
                        listener.name(),
                        event.name(),
                        e
                    );
                }
                Err(_) => {
                    warn!(
                        ticket = %event.job().ticket,
                        "Listener '{}' timed out on {} after {:?}",
                        listener.name(),
                        event.name(),
                        self.listener_timeout
                    );
                }
            }
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_LISTENER_TIMEOUT)
    }
}
