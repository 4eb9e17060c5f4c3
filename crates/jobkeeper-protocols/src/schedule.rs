//! Schedule entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Schedule identifier.
pub type ScheduleId = Uuid;

/// A recurring trigger definition.
///
/// The schedule drives the job whose `schedule_id` points at it. Due-ness
/// is tracked through `next_run_at`, which the schedule's kind maintains.
/// A new schedule is due at its creation time; a schedule without
/// `next_run_at` has no fire time left and is never due.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Unique schedule ID.
    pub id: ScheduleId,
    /// Scheduling scheme (e.g. "cron").
    #[serde(rename = "type")]
    pub schedule_type: String,
    /// Scheme-specific trigger expression.
    pub expression: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Last time the schedule triggered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<DateTime<Utc>>,
    /// Next time the schedule is due; `None` once the expression is
    /// exhausted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_run_at: Option<DateTime<Utc>>,
}

impl Schedule {
    /// Create a new schedule.
    pub fn new(schedule_type: impl Into<String>, expression: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            schedule_type: schedule_type.into(),
            expression: expression.into(),
            created_at: now,
            updated_at: now,
            last_run_at: None,
            next_run_at: Some(now),
        }
    }

    /// Whether the schedule should trigger at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_run_at.is_some_and(|next| next <= now)
    }

    /// Whether the schedule has no fire time left.
    pub fn is_exhausted(&self) -> bool {
        self.next_run_at.is_none()
    }

    /// Record a trigger. `next` is `None` when no fire time is left.
    pub fn mark_triggered(&mut self, now: DateTime<Utc>, next: Option<DateTime<Utc>>) {
        self.last_run_at = Some(now);
        self.next_run_at = next;
        self.updated_at = now;
    }
}
