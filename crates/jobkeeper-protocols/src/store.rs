//! Persistence traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::job::{Job, JobStatus, JobUpdate, Ticket};
use crate::log::LogRecord;
use crate::schedule::{Schedule, ScheduleId};

/// Job persistence.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a new job. Fails if the ticket exists.
    async fn insert(&self, job: &Job) -> Result<(), StoreError>;

    /// Load a job by ticket.
    async fn find(&self, ticket: &Ticket) -> Result<Option<Job>, StoreError>;

    /// Load all jobs.
    async fn find_all(&self) -> Result<Vec<Job>, StoreError>;

    /// Load jobs in the given status.
    async fn find_by_status(&self, status: JobStatus) -> Result<Vec<Job>, StoreError> {
        Ok(self
            .find_all()
            .await?
            .into_iter()
            .filter(|j| j.status == status)
            .collect())
    }

    /// Load jobs linked to a schedule.
    async fn find_by_schedule(&self, schedule_id: &ScheduleId) -> Result<Vec<Job>, StoreError> {
        Ok(self
            .find_all()
            .await?
            .into_iter()
            .filter(|j| j.schedule_id.as_ref() == Some(schedule_id))
            .collect())
    }

    /// Atomically apply `update` if the job's current status is one of
    /// `expected`. Returns the updated job.
    async fn transition(
        &self,
        ticket: &Ticket,
        expected: &[JobStatus],
        update: JobUpdate,
    ) -> Result<Job, StoreError>;

    /// Delete a job.
    async fn delete(&self, ticket: &Ticket) -> Result<(), StoreError>;
}

/// Compare-and-set check shared by store implementations.
pub fn check_transition(
    job: &Job,
    expected: &[JobStatus],
    update: &JobUpdate,
) -> Result<(), StoreError> {
    if !expected.contains(&job.status) {
        return Err(StoreError::StatusConflict {
            ticket: job.ticket.to_string(),
            expected: expected.to_vec(),
            actual: job.status,
        });
    }
    if !job.status.can_transition_to(update.status) {
        return Err(StoreError::IllegalTransition {
            ticket: job.ticket.to_string(),
            from: job.status,
            to: update.status,
        });
    }
    Ok(())
}

/// Schedule persistence.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Insert or replace a schedule.
    async fn save(&self, schedule: &Schedule) -> Result<(), StoreError>;

    /// Create and persist a schedule.
    async fn create(&self, schedule_type: &str, expression: &str) -> Result<Schedule, StoreError> {
        let schedule = Schedule::new(schedule_type, expression);
        self.save(&schedule).await?;
        Ok(schedule)
    }

    /// Load a schedule by ID.
    async fn find(&self, id: &ScheduleId) -> Result<Option<Schedule>, StoreError>;

    /// Load all schedules, oldest first.
    async fn find_all(&self) -> Result<Vec<Schedule>, StoreError>;

    /// Load schedules due at `now`, oldest first.
    async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Schedule>, StoreError> {
        Ok(self
            .find_all()
            .await?
            .into_iter()
            .filter(|s| s.is_due(now))
            .collect())
    }

    /// Replace an existing schedule. Fails if it does not exist.
    async fn update(&self, schedule: &Schedule) -> Result<(), StoreError>;

    /// Delete a schedule. Returns whether it existed.
    async fn delete(&self, id: &ScheduleId) -> Result<bool, StoreError>;
}

/// Execution log storage.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Append a record to a job's log.
    async fn append(&self, ticket: &Ticket, record: &LogRecord) -> Result<(), StoreError>;

    /// All records of a job in append order; empty if none.
    async fn find_by_ticket(&self, ticket: &Ticket) -> Result<Vec<LogRecord>, StoreError>;

    /// Remove a job's log.
    async fn delete_by_ticket(&self, ticket: &Ticket) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_transition_ok() {
        let job = Job::new("log", vec![]);
        let update = JobUpdate::status(JobStatus::Running);
        assert!(check_transition(&job, &[JobStatus::Requested], &update).is_ok());
    }

    #[test]
    fn test_check_transition_conflict() {
        let mut job = Job::new("log", vec![]);
        job.status = JobStatus::Running;
        let update = JobUpdate::status(JobStatus::Cancelled);
        let err = check_transition(
            &job,
            &[JobStatus::Requested, JobStatus::Sleeping],
            &update,
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::StatusConflict { actual: JobStatus::Running, .. }));
    }

    #[test]
    fn test_check_transition_illegal() {
        let job = Job::new("log", vec![]);
        let update = JobUpdate::status(JobStatus::Processed);
        let err = check_transition(&job, &[JobStatus::Requested], &update).unwrap_err();
        assert!(matches!(err, StoreError::IllegalTransition { .. }));
    }
}
