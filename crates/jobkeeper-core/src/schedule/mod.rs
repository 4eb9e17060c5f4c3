//! Schedule kinds and schedule lifecycle.

mod cron_kind;
mod kind;

pub use cron_kind::CronKind;
pub use kind::ScheduleKind;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, info};

use jobkeeper_protocols::{JobError, Schedule, ScheduleId, ScheduleStore};

/// Validates, persists and advances schedules.
///
/// Cheap to clone; clones share the store and the kind table.
#[derive(Clone)]
pub struct ScheduleManager {
    store: Arc<dyn ScheduleStore>,
    kinds: Arc<DashMap<String, Arc<dyn ScheduleKind>>>,
}

impl ScheduleManager {
    /// Create a manager with the cron kind registered.
    pub fn new(store: Arc<dyn ScheduleStore>) -> Self {
        let manager = Self {
            store,
            kinds: Arc::new(DashMap::new()),
        };
        manager.register_kind(Arc::new(CronKind::new()));
        manager
    }

    /// Register a schedule kind, replacing any kind with the same name.
    pub fn register_kind(&self, kind: Arc<dyn ScheduleKind>) {
        self.kinds.insert(kind.name().to_string(), kind);
    }

    pub fn store(&self) -> &Arc<dyn ScheduleStore> {
        &self.store
    }

    fn kind(&self, schedule_type: &str) -> Result<Arc<dyn ScheduleKind>, JobError> {
        self.kinds
            .get(schedule_type)
            .map(|k| k.clone())
            .ok_or_else(|| JobError::Validation(format!("unknown schedule type '{}'", schedule_type)))
    }

    /// Check a schedule type and expression.
    ///
    /// An expression without any fire time after now is rejected.
    pub fn validate(&self, schedule_type: &str, expression: &str) -> Result<(), JobError> {
        let kind = self.kind(schedule_type)?;
        kind.validate(expression).map_err(JobError::Validation)?;

        match kind.next_after(expression, Utc::now()) {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(JobError::Validation(format!(
                "{} expression '{}' has no future fire time",
                schedule_type, expression
            ))),
            Err(e) => Err(JobError::Validation(e)),
        }
    }

    /// Next due time of a schedule after `after`.
    pub fn next_run(
        &self,
        schedule: &Schedule,
        after: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, JobError> {
        self.kind(&schedule.schedule_type)?
            .next_after(&schedule.expression, after)
            .map_err(JobError::Validation)
    }

    /// Validate and persist a caller-supplied schedule (upsert).
    ///
    /// The first trigger is the schedule's `next_run_at`, which
    /// [`Schedule::new`] sets to its creation time, so a new schedule runs
    /// its job on the next scheduler iteration. A schedule without one
    /// gets the expression's next fire time.
    pub async fn register(&self, mut schedule: Schedule) -> Result<Schedule, JobError> {
        self.validate(&schedule.schedule_type, &schedule.expression)?;
        if schedule.next_run_at.is_none() {
            schedule.next_run_at = self.next_run(&schedule, Utc::now())?;
        }
        self.store.save(&schedule).await?;
        debug!(
            "Registered schedule '{}' ({} '{}')",
            schedule.id, schedule.schedule_type, schedule.expression
        );
        Ok(schedule)
    }

    /// Create a schedule first due at the expression's next fire time.
    pub async fn create(&self, schedule_type: &str, expression: &str) -> Result<Schedule, JobError> {
        self.validate(schedule_type, expression)?;

        let mut schedule = Schedule::new(schedule_type, expression);
        schedule.next_run_at = self.next_run(&schedule, Utc::now())?;
        self.store.save(&schedule).await?;

        info!(
            "Created schedule '{}' ({} '{}')",
            schedule.id, schedule_type, expression
        );
        Ok(schedule)
    }

    /// Change a schedule's type and expression in place.
    pub async fn update(
        &self,
        id: &ScheduleId,
        schedule_type: &str,
        expression: &str,
    ) -> Result<Schedule, JobError> {
        self.validate(schedule_type, expression)?;

        let mut schedule = self
            .store
            .find(id)
            .await?
            .ok_or_else(|| JobError::NotFound(format!("schedule {}", id)))?;

        let now = Utc::now();
        schedule.schedule_type = schedule_type.to_string();
        schedule.expression = expression.to_string();
        schedule.next_run_at = self.next_run(&schedule, now)?;
        schedule.updated_at = now;
        self.store.update(&schedule).await?;

        info!(
            "Updated schedule '{}' to {} '{}'",
            schedule.id, schedule_type, expression
        );
        Ok(schedule)
    }

    /// Delete a schedule. Returns whether it existed.
    pub async fn remove(&self, id: &ScheduleId) -> Result<bool, JobError> {
        let removed = self.store.delete(id).await?;
        if removed {
            info!("Removed schedule '{}'", id);
        }
        Ok(removed)
    }

    /// Record a trigger at `now` and advance `next_run_at`.
    ///
    /// Returns the next fire time. `None` means this was the last trigger:
    /// the schedule is stored as exhausted and is never due again.
    pub async fn mark_triggered(
        &self,
        schedule: &mut Schedule,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, JobError> {
        let next = self.next_run(schedule, now)?;
        schedule.mark_triggered(now, next);
        self.store.update(schedule).await?;
        if next.is_none() {
            info!("Schedule '{}' has no fire time left", schedule.id);
        }
        Ok(next)
    }

    pub async fn find(&self, id: &ScheduleId) -> Result<Option<Schedule>, JobError> {
        Ok(self.store.find(id).await?)
    }

    pub async fn find_all(&self) -> Result<Vec<Schedule>, JobError> {
        Ok(self.store.find_all().await?)
    }

    pub async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Schedule>, JobError> {
        Ok(self.store.find_due(now).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use jobkeeper_store::MemoryScheduleStore;

    fn manager() -> ScheduleManager {
        ScheduleManager::new(Arc::new(MemoryScheduleStore::new()))
    }

    #[test]
    fn test_validate() {
        let manager = manager();
        assert!(manager.validate("cron", "* * * * *").is_ok());
        assert!(matches!(
            manager.validate("cron", "nope"),
            Err(JobError::Validation(_))
        ));
        assert!(matches!(
            manager.validate("interval", "5s"),
            Err(JobError::Validation(msg)) if msg.contains("unknown schedule type")
        ));
    }

    #[tokio::test]
    async fn test_create_computes_next_run() {
        let manager = manager();
        let schedule = manager.create("cron", "* * * * *").await.unwrap();

        let next = schedule.next_run_at.unwrap();
        assert!(next > Utc::now());
        assert!(!schedule.is_due(Utc::now()));
        assert_eq!(manager.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_register_keeps_schedule_due() {
        let manager = manager();
        let schedule = manager
            .register(Schedule::new("cron", "* * * * *"))
            .await
            .unwrap();
        let due = manager.find_due(Utc::now()).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, schedule.id);
    }

    #[tokio::test]
    async fn test_register_rejects_bad_expression() {
        let manager = manager();
        let result = manager.register(Schedule::new("cron", "bad")).await;
        assert!(matches!(result, Err(JobError::Validation(_))));
        assert!(manager.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_register_rejects_expression_without_future_fire_time() {
        let manager = manager();
        let result = manager
            .register(Schedule::new("cron", "0 0 0 1 1 * 2020"))
            .await;
        assert!(matches!(
            result,
            Err(JobError::Validation(msg)) if msg.contains("no future fire time")
        ));
        assert!(manager.find_all().await.unwrap().is_empty());

        let created = manager.create("cron", "0 0 0 1 1 * 2020").await;
        assert!(matches!(created, Err(JobError::Validation(_))));
    }

    #[tokio::test]
    async fn test_register_fills_missing_next_run() {
        let manager = manager();
        let mut schedule = Schedule::new("cron", "* * * * *");
        schedule.next_run_at = None;

        let registered = manager.register(schedule).await.unwrap();
        assert!(registered.next_run_at.unwrap() > Utc::now() - chrono::Duration::seconds(1));
        let stored = manager.find(&registered.id).await.unwrap().unwrap();
        assert_eq!(stored.next_run_at, registered.next_run_at);
    }

    #[tokio::test]
    async fn test_mark_triggered_on_last_fire_time() {
        let manager = manager();
        let now = Utc::now();
        let expression = format!("0 0 0 1 1 * {}", now.year() + 1);
        let mut schedule = manager
            .register(Schedule::new("cron", expression.as_str()))
            .await
            .unwrap();

        let after_last = now + chrono::Duration::days(800);
        let next = manager.mark_triggered(&mut schedule, after_last).await.unwrap();

        assert!(next.is_none());
        let stored = manager.find(&schedule.id).await.unwrap().unwrap();
        assert!(stored.is_exhausted());
        assert!(manager.find_due(after_last + chrono::Duration::days(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_in_place() {
        let manager = manager();
        let created = manager.create("cron", "* * * * *").await.unwrap();
        let updated = manager
            .update(&created.id, "cron", "1 1 * * *")
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.expression, "1 1 * * *");
        let all = manager.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].expression, "1 1 * * *");
    }

    #[tokio::test]
    async fn test_update_missing() {
        let manager = manager();
        let result = manager
            .update(&uuid::Uuid::new_v4(), "cron", "* * * * *")
            .await;
        assert!(matches!(result, Err(JobError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_mark_triggered_advances() {
        let manager = manager();
        let mut schedule = manager
            .register(Schedule::new("cron", "* * * * *"))
            .await
            .unwrap();
        let now = Utc::now();
        let next = manager.mark_triggered(&mut schedule, now).await.unwrap();
        assert!(next.unwrap() > now);

        let stored = manager.find(&schedule.id).await.unwrap().unwrap();
        assert_eq!(stored.last_run_at, Some(now));
        assert!(stored.next_run_at.unwrap() > now);
        assert!(manager.find_due(now).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove() {
        let manager = manager();
        let schedule = manager.create("cron", "* * * * *").await.unwrap();
        assert!(manager.remove(&schedule.id).await.unwrap());
        assert!(!manager.remove(&schedule.id).await.unwrap());
    }
}
