//! Built-in execution listener.

use std::sync::{Arc, Weak};

use async_trait::async_trait;

use jobkeeper_protocols::HandlerError;

use crate::events::{ExecutionEvent, ExecutionListener};
use crate::logger::LoggerFactory;
use crate::manager::{JobManager, ManagerInner};

/// Priority of [`JobListener`]; it runs before other listeners so they
/// see a fully populated context.
pub const JOB_LISTENER_PRIORITY: i32 = 1000;

/// Populates the execution context before a handler runs: the job's
/// logger and a handle on the manager that owns the execution.
pub struct JobListener {
    loggers: LoggerFactory,
    manager: Weak<ManagerInner>,
}

impl JobListener {
    pub(crate) fn new(loggers: LoggerFactory, manager: Weak<ManagerInner>) -> Self {
        Self { loggers, manager }
    }
}

#[async_trait]
impl ExecutionListener for JobListener {
    fn name(&self) -> &str {
        "job"
    }

    fn priority(&self) -> i32 {
        JOB_LISTENER_PRIORITY
    }

    async fn on_event(&self, event: &ExecutionEvent) -> Result<(), HandlerError> {
        let ExecutionEvent::PreExecute { job, context } = event else {
            return Ok(());
        };

        context.set_logger(self.loggers.for_job(job.ticket, &job.job_type));

        let manager = JobManager::upgrade(&self.manager)
            .ok_or_else(|| HandlerError::msg("job manager has been dropped"))?;
        context.set_manager(Arc::new(manager));
        Ok(())
    }
}
