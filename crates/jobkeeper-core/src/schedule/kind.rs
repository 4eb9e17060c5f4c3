//! Schedule kinds.

use chrono::{DateTime, Utc};

/// A scheduling scheme, such as cron.
///
/// Kinds are stateless: they interpret a schedule's expression and
/// compute its next due time.
pub trait ScheduleKind: Send + Sync {
    /// Schedule type handled by this kind (e.g. "cron").
    fn name(&self) -> &str;

    /// Check an expression.
    fn validate(&self, expression: &str) -> Result<(), String>;

    /// First due time strictly after `after`, `None` if the expression
    /// never fires again.
    fn next_after(
        &self,
        expression: &str,
        after: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, String>;
}
