//! Job execution.
//!
//! The executor takes a job that has already been moved to `RUNNING`,
//! invokes its handler and persists the outcome in a single
//! `RUNNING -> PROCESSED | ERROR | SLEEPING` transition. Handler failures
//! and panics end up in the job's response; they never escape
//! [`JobExecutor::execute`].

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tracing::{debug, error, info, warn};

use jobkeeper_protocols::{
    ExecutionContext, HandlerError, Job, JobError, JobResponse, JobStatus, JobStore, JobUpdate,
    ScheduleDirective, ScheduleId,
};

use crate::events::{EventDispatcher, ExecutionEvent};
use crate::registry::HandlerRegistry;
use crate::schedule::ScheduleManager;

/// Response code recorded when a handler panics.
pub const PANIC_CODE: i64 = -1;

/// Runs handlers and records their outcome.
pub struct JobExecutor {
    registry: Arc<HandlerRegistry>,
    jobs: Arc<dyn JobStore>,
    schedules: ScheduleManager,
    events: Arc<EventDispatcher>,
}

impl JobExecutor {
    pub fn new(
        registry: Arc<HandlerRegistry>,
        jobs: Arc<dyn JobStore>,
        schedules: ScheduleManager,
        events: Arc<EventDispatcher>,
    ) -> Self {
        Self {
            registry,
            jobs,
            schedules,
            events,
        }
    }

    pub fn events(&self) -> &Arc<EventDispatcher> {
        &self.events
    }

    /// Execute a `RUNNING` job. On success `job` holds the persisted
    /// outcome; an error means the outcome could not be stored.
    pub async fn execute(&self, job: &mut Job, ctx: &ExecutionContext) -> Result<(), JobError> {
        self.events
            .dispatch(&ExecutionEvent::PreExecute {
                job: job.clone(),
                context: ctx.clone(),
            })
            .await;

        let started = Instant::now();
        let outcome = self.invoke(job, ctx).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let update = match outcome {
            Ok(value) => match self.apply_directive(job, ctx).await {
                Ok(schedule_id) => {
                    let status = if schedule_id.is_some() {
                        JobStatus::Sleeping
                    } else {
                        JobStatus::Processed
                    };
                    let response = match value {
                        serde_json::Value::Null => None,
                        value => Some(JobResponse::Value(value)),
                    };
                    JobUpdate::status(status)
                        .with_response(response)
                        .with_schedule_id(schedule_id)
                }
                Err(e) => self.failure(job, ctx, e).await,
            },
            Err(e) => {
                // a failed run does not get to change its schedule
                ctx.take_directive();
                self.failure(job, ctx, e).await
            }
        };

        let updated = self
            .jobs
            .transition(
                &job.ticket,
                &[JobStatus::Running],
                update.with_processing_time(elapsed_ms),
            )
            .await
            .map_err(JobError::from_transition)?;
        *job = updated;

        info!(
            ticket = %job.ticket,
            "Job '{}' finished as {} in {}ms",
            job.job_type,
            job.status,
            elapsed_ms
        );

        self.events
            .dispatch(&ExecutionEvent::PostExecute {
                job: job.clone(),
                context: ctx.clone(),
            })
            .await;

        Ok(())
    }

    async fn invoke(
        &self,
        job: &Job,
        ctx: &ExecutionContext,
    ) -> Result<serde_json::Value, HandlerError> {
        let handler = self
            .registry
            .get(&job.job_type)
            .ok_or_else(|| HandlerError::msg(format!("unknown job type '{}'", job.job_type)))?;

        debug!(ticket = %job.ticket, "Invoking handler '{}'", job.job_type);

        match AssertUnwindSafe(handler.invoke(&job.parameters, ctx))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(payload) => Err(HandlerError::new(
                format!("handler panicked: {}", panic_message(payload.as_ref())),
                PANIC_CODE,
            )),
        }
    }

    /// Apply the handler's schedule directive. Returns the schedule the
    /// job is linked to afterwards.
    async fn apply_directive(
        &self,
        job: &Job,
        ctx: &ExecutionContext,
    ) -> Result<Option<ScheduleId>, HandlerError> {
        let Some(directive) = ctx.take_directive() else {
            return Ok(job.schedule_id);
        };

        match directive {
            ScheduleDirective::Create {
                schedule_type,
                expression,
            } => {
                let schedule = self.schedules.create(&schedule_type, &expression).await?;
                if let Some(previous) = job.schedule_id {
                    self.schedules.remove(&previous).await?;
                }
                Ok(Some(schedule.id))
            }
            ScheduleDirective::Update {
                schedule_type,
                expression,
            } => {
                let id = job
                    .schedule_id
                    .ok_or_else(|| HandlerError::msg("no schedule linked to job"))?;
                self.schedules
                    .update(&id, &schedule_type, &expression)
                    .await?;
                Ok(Some(id))
            }
            ScheduleDirective::Remove => {
                if let Some(id) = job.schedule_id {
                    self.schedules.remove(&id).await?;
                    ctx.info(format!("removed schedule {}", id)).await?;
                }
                Ok(None)
            }
        }
    }

    async fn failure(&self, job: &Job, ctx: &ExecutionContext, err: HandlerError) -> JobUpdate {
        error!(ticket = %job.ticket, "Job '{}' failed: {}", job.job_type, err);

        if let Err(log_err) = ctx.error(err.message.clone()).await {
            warn!(ticket = %job.ticket, "Failed to write job log: {}", log_err);
        }

        JobUpdate::status(JobStatus::Error)
            .with_response(Some(JobResponse::Exception(err.to_response())))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
