//! Capabilities handed to handlers through the execution context.

use async_trait::async_trait;

use crate::error::{JobError, StoreError};
use crate::job::{Job, Ticket};
use crate::log::LogRecord;
use crate::schedule::Schedule;

/// Reentrant handle on the job manager.
///
/// Implementations must not hold a lock across handler invocation, since a
/// running handler may call back into any of these methods.
#[async_trait]
pub trait JobControl: Send + Sync {
    /// Submit a job.
    async fn add_job(
        &self,
        job_type: &str,
        parameters: Vec<serde_json::Value>,
        schedule: Option<Schedule>,
    ) -> Result<Job, JobError>;

    /// Look up a job by ticket.
    async fn get(&self, ticket: &Ticket) -> Result<Job, JobError>;

    /// Cancel a job that is not running.
    async fn cancel_job(&self, ticket: &Ticket) -> Result<Job, JobError>;

    /// Execution log of a job, in append order.
    async fn get_logs(&self, ticket: &Ticket) -> Result<Vec<LogRecord>, JobError>;
}

/// Per-job logger.
#[async_trait]
pub trait JobLog: Send + Sync {
    /// Ticket this logger writes for.
    fn ticket(&self) -> Ticket;

    /// Append a record to the job's log.
    async fn log(&self, record: LogRecord) -> Result<(), StoreError>;
}
