//! Job entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{JobResponse, JobStatus};
use crate::schedule::ScheduleId;

/// Opaque job identifier.
pub type Ticket = Uuid;

/// A unit of work submitted to the manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Unique ticket, assigned on creation.
    pub ticket: Ticket,
    /// Handler key.
    #[serde(rename = "type")]
    pub job_type: String,
    /// Ordered handler arguments.
    #[serde(default)]
    pub parameters: Vec<serde_json::Value>,
    /// Current status.
    pub status: JobStatus,
    /// Result of the last execution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<JobResponse>,
    /// Schedule driving this job, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_id: Option<ScheduleId>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Number of executions started.
    #[serde(default)]
    pub run_count: u64,
    /// Duration of the last execution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
}

impl Job {
    /// Create a new job in `Requested` state.
    pub fn new(job_type: impl Into<String>, parameters: Vec<serde_json::Value>) -> Self {
        let now = Utc::now();
        Self {
            ticket: Uuid::new_v4(),
            job_type: job_type.into(),
            parameters,
            status: JobStatus::Requested,
            response: None,
            schedule_id: None,
            created_at: now,
            updated_at: now,
            run_count: 0,
            processing_time_ms: None,
        }
    }

    /// Link the job to a schedule.
    pub fn with_schedule(mut self, schedule_id: ScheduleId) -> Self {
        self.schedule_id = Some(schedule_id);
        self
    }

    /// Apply an update in place. The status check is the caller's job.
    pub fn apply(&mut self, update: &JobUpdate) {
        self.status = update.status;
        if let Some(response) = &update.response {
            self.response = response.clone();
        }
        if let Some(schedule_id) = update.schedule_id {
            self.schedule_id = schedule_id;
        }
        if update.status == JobStatus::Running {
            self.run_count += 1;
        }
        if let Some(ms) = update.processing_time_ms {
            self.processing_time_ms = Some(ms);
        }
        self.updated_at = Utc::now();
    }
}

/// Atomic change of a job's status together with its response and
/// schedule link.
///
/// Fields left as `None` are not touched.
#[derive(Debug, Clone, PartialEq)]
pub struct JobUpdate {
    pub status: JobStatus,
    pub response: Option<Option<JobResponse>>,
    pub schedule_id: Option<Option<ScheduleId>>,
    pub processing_time_ms: Option<u64>,
}

impl JobUpdate {
    /// Change only the status.
    pub fn status(status: JobStatus) -> Self {
        Self {
            status,
            response: None,
            schedule_id: None,
            processing_time_ms: None,
        }
    }

    /// Replace the response.
    pub fn with_response(mut self, response: Option<JobResponse>) -> Self {
        self.response = Some(response);
        self
    }

    /// Replace the schedule link.
    pub fn with_schedule_id(mut self, schedule_id: Option<ScheduleId>) -> Self {
        self.schedule_id = Some(schedule_id);
        self
    }

    /// Record the execution duration.
    pub fn with_processing_time(mut self, ms: u64) -> Self {
        self.processing_time_ms = Some(ms);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::ExceptionResponse;

    #[test]
    fn test_job_new() {
        let job = Job::new("log", vec![serde_json::json!("message")]);
        assert_eq!(job.status, JobStatus::Requested);
        assert_eq!(job.job_type, "log");
        assert_eq!(job.parameters.len(), 1);
        assert!(job.response.is_none());
        assert!(job.schedule_id.is_none());
        assert_eq!(job.run_count, 0);
    }

    #[test]
    fn test_tickets_are_unique() {
        let a = Job::new("log", vec![]);
        let b = Job::new("log", vec![]);
        assert_ne!(a.ticket, b.ticket);
    }

    #[test]
    fn test_apply_running_counts_runs() {
        let mut job = Job::new("log", vec![]);
        job.apply(&JobUpdate::status(JobStatus::Running));
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.run_count, 1);
    }

    #[test]
    fn test_apply_keeps_untouched_fields() {
        let schedule_id = Uuid::new_v4();
        let mut job = Job::new("log", vec![]).with_schedule(schedule_id);
        job.apply(&JobUpdate::status(JobStatus::Cancelled));
        assert_eq!(job.schedule_id, Some(schedule_id));
        assert!(job.response.is_none());
    }

    #[test]
    fn test_apply_response_and_unlink() {
        let mut job = Job::new("fail", vec![]).with_schedule(Uuid::new_v4());
        let update = JobUpdate::status(JobStatus::Error)
            .with_response(Some(JobResponse::Exception(ExceptionResponse::new("boom", 7))))
            .with_schedule_id(None);
        job.apply(&update);
        assert_eq!(job.status, JobStatus::Error);
        assert!(job.schedule_id.is_none());
        assert!(matches!(job.response, Some(JobResponse::Exception(ref e)) if e.code == 7));
    }

    #[test]
    fn test_job_serialization_uses_type_key() {
        let job = Job::new("log", vec![serde_json::json!(1)]);
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["type"], "log");
        assert_eq!(json["status"], "requested");
        assert!(json.get("response").is_none());
    }
}
