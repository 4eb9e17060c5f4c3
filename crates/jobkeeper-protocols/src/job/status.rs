//! Job status state machine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Job status.
///
/// ```text
/// REQUESTED ──▶ RUNNING ──▶ PROCESSED | ERROR | SLEEPING
///     │                          ▲                │
///     │                          └──── RUNNING ◀──┤
///     └──────────▶ CANCELLED ◀────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Persisted, waiting for its first execution.
    Requested,
    /// Handler is executing.
    Running,
    /// Handler completed successfully.
    Processed,
    /// Handler failed.
    Error,
    /// Waiting for the next trigger of its schedule.
    Sleeping,
    /// Cancelled before or between executions.
    Cancelled,
}

impl Default for JobStatus {
    fn default() -> Self {
        JobStatus::Requested
    }
}

impl JobStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [JobStatus; 6] = [
        JobStatus::Requested,
        JobStatus::Running,
        JobStatus::Processed,
        JobStatus::Error,
        JobStatus::Sleeping,
        JobStatus::Cancelled,
    ];

    /// Statuses a job may be started from.
    pub const RUNNABLE: [JobStatus; 2] = [JobStatus::Requested, JobStatus::Sleeping];

    /// Statuses a job may be cancelled from.
    pub const CANCELLABLE: [JobStatus; 2] = [JobStatus::Requested, JobStatus::Sleeping];

    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Processed | JobStatus::Error | JobStatus::Cancelled
        )
    }

    /// Whether `cancel_job` may be applied.
    pub fn is_cancellable(&self) -> bool {
        Self::CANCELLABLE.contains(self)
    }

    /// Whether the job may (re-)enter `Running`.
    pub fn is_runnable(&self) -> bool {
        Self::RUNNABLE.contains(self)
    }

    /// Check whether `self -> next` is a legal transition.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Requested, Running)
                | (Requested, Cancelled)
                | (Sleeping, Running)
                | (Sleeping, Cancelled)
                | (Sleeping, Processed)
                | (Running, Processed)
                | (Running, Error)
                | (Running, Sleeping)
        )
    }

    /// Upper-case name used in logs and CLI output.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Requested => "REQUESTED",
            JobStatus::Running => "RUNNING",
            JobStatus::Processed => "PROCESSED",
            JobStatus::Error => "ERROR",
            JobStatus::Sleeping => "SLEEPING",
            JobStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown job status '{}'", s))
    }
}
