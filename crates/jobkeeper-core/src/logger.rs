//! Per-job loggers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use jobkeeper_protocols::{JobLog, LogLevel, LogRecord, LogSink, StoreError, Ticket};

/// Logger bound to one job, writing to a [`LogSink`].
///
/// Records below the minimum level are dropped. Every stored record is
/// also emitted as a `tracing` debug event.
pub struct JobLogger {
    ticket: Ticket,
    sink: Arc<dyn LogSink>,
    min_level: LogLevel,
}

impl JobLogger {
    pub fn new(ticket: Ticket, sink: Arc<dyn LogSink>, min_level: LogLevel) -> Self {
        Self {
            ticket,
            sink,
            min_level,
        }
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }
}

#[async_trait]
impl JobLog for JobLogger {
    fn ticket(&self) -> Ticket {
        self.ticket
    }

    async fn log(&self, record: LogRecord) -> Result<(), StoreError> {
        if record.level < self.min_level {
            return Ok(());
        }

        debug!(
            ticket = %self.ticket,
            level = %record.level,
            "{}",
            record.message
        );
        self.sink.append(&self.ticket, &record).await
    }
}

/// Creates job loggers sharing one sink.
///
/// The minimum level applies to every job type without an override.
#[derive(Clone)]
pub struct LoggerFactory {
    sink: Arc<dyn LogSink>,
    min_level: LogLevel,
    custom_levels: Arc<HashMap<String, LogLevel>>,
}

impl LoggerFactory {
    pub fn new(sink: Arc<dyn LogSink>, min_level: LogLevel) -> Self {
        Self {
            sink,
            min_level,
            custom_levels: Arc::new(HashMap::new()),
        }
    }

    /// Set per-job-type minimum levels.
    pub fn with_custom_levels(mut self, levels: HashMap<String, LogLevel>) -> Self {
        self.custom_levels = Arc::new(levels);
        self
    }

    /// Minimum level for jobs of `job_type`.
    pub fn level_for(&self, job_type: &str) -> LogLevel {
        self.custom_levels
            .get(job_type)
            .copied()
            .unwrap_or(self.min_level)
    }

    /// Logger for a job.
    pub fn for_job(&self, ticket: Ticket, job_type: &str) -> Arc<JobLogger> {
        Arc::new(JobLogger::new(
            ticket,
            self.sink.clone(),
            self.level_for(job_type),
        ))
    }

    pub fn sink(&self) -> &Arc<dyn LogSink> {
        &self.sink
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }
}
