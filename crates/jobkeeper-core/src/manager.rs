//! Job manager.
//!
//! Entry point for submitting, inspecting and cancelling jobs. The manager
//! is a cheap handle (`Clone` around shared state) and holds no lock while
//! a handler runs, so handlers can call back into it through the
//! [`JobControl`] handle placed in their context.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info};

use jobkeeper_protocols::{
    ExecutionContext, Job, JobControl, JobError, JobStatus, JobStore, JobUpdate, LogLevel,
    LogRecord, LogSink, Schedule, ScheduleId, ScheduleStore, Ticket,
};

use crate::events::{DEFAULT_LISTENER_TIMEOUT, EventDispatcher, ExecutionListener};
use crate::executor::JobExecutor;
use crate::listener::JobListener;
use crate::logger::LoggerFactory;
use crate::pool::{ExecutionMode, WorkerPool};
use crate::registry::HandlerRegistry;
use crate::schedule::{ScheduleKind, ScheduleManager};

/// Default number of background workers.
pub const DEFAULT_MAX_WORKERS: usize = 4;

pub(crate) struct ManagerInner {
    registry: Arc<HandlerRegistry>,
    jobs: Arc<dyn JobStore>,
    schedules: ScheduleManager,
    loggers: LoggerFactory,
    executor: JobExecutor,
    mode: ExecutionMode,
    pool: WorkerPool,
}

/// Job manager handle.
#[derive(Clone)]
pub struct JobManager {
    inner: Arc<ManagerInner>,
}

impl JobManager {
    /// Start building a manager over the given handlers and stores.
    pub fn builder(
        registry: Arc<HandlerRegistry>,
        jobs: Arc<dyn JobStore>,
        schedules: Arc<dyn ScheduleStore>,
        logs: Arc<dyn LogSink>,
    ) -> JobManagerBuilder {
        JobManagerBuilder::new(registry, jobs, schedules, logs)
    }

    pub(crate) fn upgrade(inner: &Weak<ManagerInner>) -> Option<Self> {
        inner.upgrade().map(|inner| Self { inner })
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.inner.registry
    }

    pub fn schedules(&self) -> &ScheduleManager {
        &self.inner.schedules
    }

    pub fn mode(&self) -> ExecutionMode {
        self.inner.mode
    }

    /// Submit a job.
    ///
    /// The job is persisted as `REQUESTED` before anything else happens.
    /// Without a schedule it is dispatched right away: in inline mode the
    /// returned job carries the final outcome, in background mode it is
    /// still `REQUESTED`. With a schedule the job waits for the schedule
    /// processor.
    pub async fn add_job(
        &self,
        job_type: &str,
        parameters: Vec<serde_json::Value>,
        schedule: Option<Schedule>,
    ) -> Result<Job, JobError> {
        let handler = self.inner.registry.resolve(job_type)?;
        handler
            .validate(&parameters)
            .map_err(|reason| JobError::Validation(format!("{}: {}", job_type, reason)))?;

        let mut job = Job::new(job_type, parameters);
        if let Some(schedule) = schedule {
            let schedule = self.inner.schedules.register(schedule).await?;
            job.schedule_id = Some(schedule.id);
        }

        self.inner.jobs.insert(&job).await?;
        info!(ticket = %job.ticket, "Job '{}' added", job_type);

        if job.schedule_id.is_some() {
            return Ok(job);
        }

        match self.inner.mode {
            ExecutionMode::Inline => self.execute_ticket(&job.ticket).await,
            ExecutionMode::Background => {
                let manager = self.clone();
                let ticket = job.ticket;
                self.inner.pool.submit(async move {
                    match manager.execute_ticket(&ticket).await {
                        Ok(_) => {}
                        Err(JobError::InvalidState { status, .. }) => {
                            debug!(ticket = %ticket, "Skipping job in status {}", status);
                        }
                        Err(e) => error!(ticket = %ticket, "Background job failed: {}", e),
                    }
                });
                Ok(job)
            }
        }
    }

    /// Run an existing `REQUESTED` or `SLEEPING` job now.
    pub async fn run_scheduled(&self, ticket: &Ticket) -> Result<Job, JobError> {
        debug!(ticket = %ticket, "Running scheduled job");
        self.execute_ticket(ticket).await
    }

    async fn execute_ticket(&self, ticket: &Ticket) -> Result<Job, JobError> {
        let mut job = self
            .inner
            .jobs
            .transition(
                ticket,
                &JobStatus::RUNNABLE,
                JobUpdate::status(JobStatus::Running),
            )
            .await
            .map_err(JobError::from_transition)?;

        let ctx = ExecutionContext::new(&job);
        self.inner.executor.execute(&mut job, &ctx).await?;
        Ok(job)
    }

    /// Finish a `SLEEPING` job whose schedule has no fire time left.
    ///
    /// The last response is kept and the schedule link stays as a record.
    pub async fn finish_sleeping(&self, ticket: &Ticket) -> Result<Job, JobError> {
        let job = self
            .inner
            .jobs
            .transition(
                ticket,
                &[JobStatus::Sleeping],
                JobUpdate::status(JobStatus::Processed),
            )
            .await
            .map_err(JobError::from_transition)?;

        info!(ticket = %ticket, "Job '{}' finished, schedule exhausted", job.job_type);
        Ok(job)
    }

    pub async fn get(&self, ticket: &Ticket) -> Result<Job, JobError> {
        self.inner
            .jobs
            .find(ticket)
            .await?
            .ok_or_else(|| JobError::NotFound(ticket.to_string()))
    }

    /// Execution log of a job; empty when nothing was logged.
    pub async fn get_logs(&self, ticket: &Ticket) -> Result<Vec<LogRecord>, JobError> {
        Ok(self.inner.loggers.sink().find_by_ticket(ticket).await?)
    }

    /// Cancel a `REQUESTED` or `SLEEPING` job and delete its schedule.
    pub async fn cancel_job(&self, ticket: &Ticket) -> Result<Job, JobError> {
        let job = self
            .inner
            .jobs
            .transition(
                ticket,
                &JobStatus::CANCELLABLE,
                JobUpdate::status(JobStatus::Cancelled),
            )
            .await
            .map_err(JobError::from_transition)?;

        if let Some(schedule_id) = job.schedule_id {
            self.inner.schedules.remove(&schedule_id).await?;
        }

        info!(ticket = %ticket, "Job '{}' cancelled", job.job_type);
        Ok(job)
    }

    pub async fn find_all(&self) -> Result<Vec<Job>, JobError> {
        Ok(self.inner.jobs.find_all().await?)
    }

    pub async fn find_by_status(&self, status: JobStatus) -> Result<Vec<Job>, JobError> {
        Ok(self.inner.jobs.find_by_status(status).await?)
    }

    /// Jobs driven by a schedule.
    pub async fn find_by_schedule(&self, schedule_id: &ScheduleId) -> Result<Vec<Job>, JobError> {
        Ok(self.inner.jobs.find_by_schedule(schedule_id).await?)
    }

    /// Delete a terminal job together with its log.
    pub async fn delete_job(&self, ticket: &Ticket) -> Result<(), JobError> {
        let job = self.get(ticket).await?;
        if !job.status.is_terminal() {
            return Err(JobError::InvalidState {
                ticket: ticket.to_string(),
                status: job.status,
            });
        }

        self.inner.jobs.delete(ticket).await?;
        self.inner.loggers.sink().delete_by_ticket(ticket).await?;
        info!(ticket = %ticket, "Job deleted");
        Ok(())
    }

    /// Wait for all background executions to finish.
    pub async fn wait_idle(&self) {
        self.inner.pool.wait_idle().await;
    }
}

#[async_trait]
impl JobControl for JobManager {
    async fn add_job(
        &self,
        job_type: &str,
        parameters: Vec<serde_json::Value>,
        schedule: Option<Schedule>,
    ) -> Result<Job, JobError> {
        JobManager::add_job(self, job_type, parameters, schedule).await
    }

    async fn get(&self, ticket: &Ticket) -> Result<Job, JobError> {
        JobManager::get(self, ticket).await
    }

    async fn cancel_job(&self, ticket: &Ticket) -> Result<Job, JobError> {
        JobManager::cancel_job(self, ticket).await
    }

    async fn get_logs(&self, ticket: &Ticket) -> Result<Vec<LogRecord>, JobError> {
        JobManager::get_logs(self, ticket).await
    }
}

/// Builder for [`JobManager`].
pub struct JobManagerBuilder {
    registry: Arc<HandlerRegistry>,
    jobs: Arc<dyn JobStore>,
    schedules: Arc<dyn ScheduleStore>,
    logs: Arc<dyn LogSink>,
    log_level: LogLevel,
    custom_log_levels: HashMap<String, LogLevel>,
    mode: ExecutionMode,
    max_workers: usize,
    listener_timeout: Duration,
    listeners: Vec<Arc<dyn ExecutionListener>>,
    schedule_kinds: Vec<Arc<dyn ScheduleKind>>,
}

impl JobManagerBuilder {
    pub fn new(
        registry: Arc<HandlerRegistry>,
        jobs: Arc<dyn JobStore>,
        schedules: Arc<dyn ScheduleStore>,
        logs: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            registry,
            jobs,
            schedules,
            logs,
            log_level: LogLevel::Debug,
            custom_log_levels: HashMap::new(),
            mode: ExecutionMode::Inline,
            max_workers: DEFAULT_MAX_WORKERS,
            listener_timeout: DEFAULT_LISTENER_TIMEOUT,
            listeners: Vec::new(),
            schedule_kinds: Vec::new(),
        }
    }

    /// Minimum level written to job logs.
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Minimum job log level for one job type, overriding
    /// [`Self::log_level`].
    pub fn custom_log_level(mut self, job_type: impl Into<String>, level: LogLevel) -> Self {
        self.custom_log_levels.insert(job_type.into(), level);
        self
    }

    pub fn mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn listener_timeout(mut self, timeout: Duration) -> Self {
        self.listener_timeout = timeout;
        self
    }

    /// Add an execution listener.
    pub fn listener(mut self, listener: Arc<dyn ExecutionListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Add a schedule kind next to the built-in cron kind.
    pub fn schedule_kind(mut self, kind: Arc<dyn ScheduleKind>) -> Self {
        self.schedule_kinds.push(kind);
        self
    }

    pub fn build(self) -> JobManager {
        let schedules = ScheduleManager::new(self.schedules);
        for kind in self.schedule_kinds {
            schedules.register_kind(kind);
        }

        let loggers = LoggerFactory::new(self.logs, self.log_level)
            .with_custom_levels(self.custom_log_levels);
        let events = Arc::new(EventDispatcher::new(self.listener_timeout));
        let executor = JobExecutor::new(
            self.registry.clone(),
            self.jobs.clone(),
            schedules.clone(),
            events.clone(),
        );
        let pool = match self.mode {
            ExecutionMode::Background => WorkerPool::new(self.max_workers),
            ExecutionMode::Inline => WorkerPool::new(1),
        };

        let inner = Arc::new_cyclic(|weak: &Weak<ManagerInner>| {
            events.subscribe(Arc::new(JobListener::new(loggers.clone(), weak.clone())));
            ManagerInner {
                registry: self.registry,
                jobs: self.jobs,
                schedules,
                loggers,
                executor,
                mode: self.mode,
                pool,
            }
        });

        for listener in self.listeners {
            events.subscribe(listener);
        }

        info!(
            "Job manager ready ({} mode, {} handlers)",
            self.mode,
            inner.registry.len()
        );

        JobManager { inner }
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
