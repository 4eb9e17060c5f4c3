//! Cron schedule kind.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use cron::Schedule;

use super::kind::ScheduleKind;

/// Cron expressions.
///
/// Accepts the classic five-field form (`minute hour day month weekday`)
/// as well as the six and seven field forms with leading seconds and
/// trailing year. Five-field expressions fire at second zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct CronKind;

impl CronKind {
    pub const NAME: &'static str = "cron";

    pub fn new() -> Self {
        Self
    }

    fn parse(expression: &str) -> Result<Schedule, String> {
        let fields = expression.split_whitespace().count();
        let normalized = match fields {
            5 => format!("0 {}", expression.trim()),
            6 | 7 => expression.trim().to_string(),
            n => {
                return Err(format!(
                    "invalid cron expression '{}': expected 5 to 7 fields, got {}",
                    expression, n
                ));
            }
        };

        Schedule::from_str(&normalized)
            .map_err(|e| format!("invalid cron expression '{}': {}", expression, e))
    }
}

impl ScheduleKind for CronKind {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self, expression: &str) -> Result<(), String> {
        Self::parse(expression).map(|_| ())
    }

    fn next_after(
        &self,
        expression: &str,
        after: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, String> {
        let schedule = Self::parse(expression)?;
        Ok(schedule.after(&after).next())
    }
}
