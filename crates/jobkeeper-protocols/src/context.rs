//! Execution context passed to handlers and listeners.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::control::{JobControl, JobLog};
use crate::error::HandlerError;
use crate::job::{Job, Ticket};
use crate::log::{LogLevel, LogRecord};
use crate::schedule::ScheduleId;

/// Well-known key of the job logger.
pub const LOGGER_KEY: &str = "logger";
/// Well-known key of the manager handle.
pub const MANAGER_KEY: &str = "manager";

/// Schedule change requested by a handler, applied after it returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleDirective {
    /// Create a schedule and link it to the job.
    Create {
        schedule_type: String,
        expression: String,
    },
    /// Change the linked schedule in place.
    Update {
        schedule_type: String,
        expression: String,
    },
    /// Delete the linked schedule.
    Remove,
}

/// Per-execution key/value scope.
///
/// Clones share state, so listeners and the handler see each other's
/// writes. The logger and the manager handle have typed accessors; any
/// other entry is stored as JSON.
#[derive(Clone)]
pub struct ExecutionContext {
    ticket: Ticket,
    job_type: String,
    schedule_id: Option<ScheduleId>,
    logger: Arc<RwLock<Option<Arc<dyn JobLog>>>>,
    manager: Arc<RwLock<Option<Arc<dyn JobControl>>>>,
    directive: Arc<Mutex<Option<ScheduleDirective>>>,
    data: Arc<RwLock<HashMap<String, serde_json::Value>>>,
}

impl ExecutionContext {
    /// Create an empty context for a job.
    pub fn new(job: &Job) -> Self {
        Self {
            ticket: job.ticket,
            job_type: job.job_type.clone(),
            schedule_id: job.schedule_id,
            logger: Arc::new(RwLock::new(None)),
            manager: Arc::new(RwLock::new(None)),
            directive: Arc::new(Mutex::new(None)),
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Ticket of the executing job.
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    /// Type of the executing job.
    pub fn job_type(&self) -> &str {
        &self.job_type
    }

    /// Schedule the job was linked to when execution started.
    pub fn schedule_id(&self) -> Option<ScheduleId> {
        self.schedule_id
    }

    pub fn set_logger(&self, logger: Arc<dyn JobLog>) {
        *self.logger.write() = Some(logger);
    }

    pub fn logger(&self) -> Option<Arc<dyn JobLog>> {
        self.logger.read().clone()
    }

    pub fn set_manager(&self, manager: Arc<dyn JobControl>) {
        *self.manager.write() = Some(manager);
    }

    pub fn manager(&self) -> Option<Arc<dyn JobControl>> {
        self.manager.read().clone()
    }

    /// The manager handle, or a handler failure if none was injected.
    pub fn require_manager(&self) -> Result<Arc<dyn JobControl>, HandlerError> {
        self.manager()
            .ok_or_else(|| HandlerError::msg("no job manager available in context"))
    }

    /// Whether an entry exists, including the well-known ones.
    pub fn has(&self, key: &str) -> bool {
        match key {
            LOGGER_KEY => self.logger.read().is_some(),
            MANAGER_KEY => self.manager.read().is_some(),
            _ => self.data.read().contains_key(key),
        }
    }

    /// Get a JSON entry.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let data = self.data.read();
        data.get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Set a JSON entry.
    pub fn set<T: Serialize>(&self, key: impl Into<String>, value: T) {
        if let Ok(v) = serde_json::to_value(value) {
            self.data.write().insert(key.into(), v);
        }
    }

    /// Remove a JSON entry.
    pub fn remove(&self, key: &str) -> Option<serde_json::Value> {
        self.data.write().remove(key)
    }

    /// Append a record to the job log. Without a logger this is a no-op.
    pub async fn log(
        &self,
        level: LogLevel,
        message: impl Into<String>,
    ) -> Result<(), HandlerError> {
        self.log_record(LogRecord::new(level, message)).await
    }

    /// Append a prepared record to the job log.
    pub async fn log_record(&self, record: LogRecord) -> Result<(), HandlerError> {
        match self.logger() {
            Some(logger) => Ok(logger.log(record).await?),
            None => Ok(()),
        }
    }

    pub async fn info(&self, message: impl Into<String>) -> Result<(), HandlerError> {
        self.log(LogLevel::Info, message).await
    }

    pub async fn error(&self, message: impl Into<String>) -> Result<(), HandlerError> {
        self.log(LogLevel::Error, message).await
    }

    /// Request a new schedule for this job. The job sleeps after a
    /// successful run.
    pub fn create_schedule(&self, schedule_type: impl Into<String>, expression: impl Into<String>) {
        *self.directive.lock() = Some(ScheduleDirective::Create {
            schedule_type: schedule_type.into(),
            expression: expression.into(),
        });
    }

    /// Request a change of this job's schedule.
    pub fn update_schedule(&self, schedule_type: impl Into<String>, expression: impl Into<String>) {
        *self.directive.lock() = Some(ScheduleDirective::Update {
            schedule_type: schedule_type.into(),
            expression: expression.into(),
        });
    }

    /// Request removal of this job's schedule. The job is processed after
    /// a successful run.
    pub fn remove_schedule(&self) {
        *self.directive.lock() = Some(ScheduleDirective::Remove);
    }

    /// The pending schedule directive.
    pub fn directive(&self) -> Option<ScheduleDirective> {
        self.directive.lock().clone()
    }

    /// Take the pending schedule directive.
    pub fn take_directive(&self) -> Option<ScheduleDirective> {
        self.directive.lock().take()
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("ticket", &self.ticket)
            .field("job_type", &self.job_type)
            .field("has_logger", &self.has(LOGGER_KEY))
            .field("has_manager", &self.has(MANAGER_KEY))
            .field("directive", &self.directive())
            .finish()
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
