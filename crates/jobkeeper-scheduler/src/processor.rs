//! Per-iteration schedule processing.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use jobkeeper_core::JobManager;
use jobkeeper_protocols::{Job, JobError, JobStatus, Schedule, ScheduleId, Ticket};

/// What one iteration did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IterationReport {
    /// Schedules found due.
    pub due: usize,
    /// Jobs executed.
    pub executed: Vec<Ticket>,
    /// Jobs that finished `PROCESSED`.
    pub processed: usize,
    /// Jobs that went back to sleep.
    pub sleeping: usize,
    /// Jobs that finished `ERROR`.
    pub failed: usize,
    /// Schedules changed in place by their handler.
    pub updated_schedules: Vec<ScheduleId>,
    /// Schedules deleted during the iteration.
    pub removed_schedules: Vec<ScheduleId>,
    /// Due schedules without a runnable job.
    pub orphaned: usize,
    /// Schedules removed after their last fire time.
    pub exhausted: usize,
    /// Jobs that could not be run (cancelled meanwhile, store failures).
    pub skipped: usize,
}

impl IterationReport {
    pub fn is_empty(&self) -> bool {
        self.due == 0
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: IterationReport) {
        self.due += other.due;
        self.executed.extend(other.executed);
        self.processed += other.processed;
        self.sleeping += other.sleeping;
        self.failed += other.failed;
        self.updated_schedules.extend(other.updated_schedules);
        self.removed_schedules.extend(other.removed_schedules);
        self.orphaned += other.orphaned;
        self.exhausted += other.exhausted;
        self.skipped += other.skipped;
    }
}

/// Runs the jobs of due schedules.
///
/// Holds no timer; see [`crate::SchedulerLoop`] for the driver.
#[derive(Clone)]
pub struct ScheduleProcessor {
    manager: JobManager,
}

impl ScheduleProcessor {
    pub fn new(manager: JobManager) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &JobManager {
        &self.manager
    }

    /// Process every schedule due now.
    pub async fn process_iteration(&self) -> Result<IterationReport, JobError> {
        self.process_at(Utc::now()).await
    }

    /// Process every schedule due at `now`.
    pub async fn process_at(&self, now: DateTime<Utc>) -> Result<IterationReport, JobError> {
        let due = self.manager.schedules().find_due(now).await?;
        let mut report = IterationReport {
            due: due.len(),
            ..Default::default()
        };

        if due.is_empty() {
            debug!("No schedules due");
            return Ok(report);
        }

        for schedule in due {
            if let Err(e) = self.process_schedule(schedule.clone(), now, &mut report).await {
                error!("Failed to process schedule '{}': {}", schedule.id, e);
                report.skipped += 1;
            }
        }

        info!(
            "Schedule iteration done: {} due, {} executed, {} failed",
            report.due,
            report.executed.len(),
            report.failed
        );
        Ok(report)
    }

    async fn process_schedule(
        &self,
        mut schedule: Schedule,
        now: DateTime<Utc>,
        report: &mut IterationReport,
    ) -> Result<(), JobError> {
        let jobs: Vec<Job> = self
            .manager
            .find_by_schedule(&schedule.id)
            .await?
            .into_iter()
            .filter(|job| job.status.is_runnable())
            .collect();

        if jobs.is_empty() {
            warn!("Schedule '{}' has no runnable job, removing it", schedule.id);
            if self.manager.schedules().remove(&schedule.id).await? {
                report.removed_schedules.push(schedule.id);
            }
            report.orphaned += 1;
            return Ok(());
        }

        // advance before running so a slow job is not triggered twice
        let next = self
            .manager
            .schedules()
            .mark_triggered(&mut schedule, now)
            .await?;

        for job in jobs {
            debug!(ticket = %job.ticket, "Schedule '{}' triggers job", schedule.id);

            let job = match self.manager.run_scheduled(&job.ticket).await {
                Ok(job) => job,
                Err(JobError::InvalidState { status, .. }) => {
                    debug!(ticket = %job.ticket, "Job no longer runnable ({})", status);
                    report.skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };
            report.executed.push(job.ticket);

            match job.status {
                JobStatus::Error => {
                    report.failed += 1;
                    if self.manager.schedules().remove(&schedule.id).await? {
                        info!(
                            ticket = %job.ticket,
                            "Removed schedule '{}' after failed run",
                            schedule.id
                        );
                        report.removed_schedules.push(schedule.id);
                    }
                }
                JobStatus::Processed => {
                    report.processed += 1;
                    if job.schedule_id.is_none() {
                        report.removed_schedules.push(schedule.id);
                    }
                }
                JobStatus::Sleeping => {
                    report.sleeping += 1;
                    if job.schedule_id != Some(schedule.id) {
                        // replaced by a schedule the handler created
                        report.removed_schedules.push(schedule.id);
                    } else if let Some(current) = self.manager.schedules().find(&schedule.id).await? {
                        if current.schedule_type != schedule.schedule_type
                            || current.expression != schedule.expression
                        {
                            report.updated_schedules.push(schedule.id);
                        }
                    }
                }
                other => {
                    warn!(ticket = %job.ticket, "Unexpected status after run: {}", other);
                }
            }
        }

        if next.is_none() {
            self.retire_schedule(&schedule.id, report).await?;
        }

        Ok(())
    }

    /// Remove a schedule that fired for the last time and finish the jobs
    /// still sleeping on it.
    ///
    /// A handler may have moved the schedule to a new expression during
    /// the run, in which case it stays.
    async fn retire_schedule(
        &self,
        schedule_id: &ScheduleId,
        report: &mut IterationReport,
    ) -> Result<(), JobError> {
        let Some(current) = self.manager.schedules().find(schedule_id).await? else {
            return Ok(());
        };
        if !current.is_exhausted() {
            return Ok(());
        }

        for job in self.manager.find_by_schedule(schedule_id).await? {
            if job.status != JobStatus::Sleeping {
                continue;
            }
            match self.manager.finish_sleeping(&job.ticket).await {
                Ok(_) => {
                    report.sleeping = report.sleeping.saturating_sub(1);
                    report.processed += 1;
                }
                Err(JobError::InvalidState { status, .. }) => {
                    debug!(ticket = %job.ticket, "Job left sleeping meanwhile ({})", status);
                }
                Err(e) => return Err(e),
            }
        }

        if self.manager.schedules().remove(schedule_id).await? {
            info!("Removed schedule '{}' after its last fire time", schedule_id);
            report.removed_schedules.push(*schedule_id);
            report.exhausted += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_merge() {
        let mut total = IterationReport::default();
        assert!(total.is_empty());

        total.merge(IterationReport {
            due: 2,
            processed: 1,
            failed: 1,
            ..Default::default()
        });
        total.merge(IterationReport {
            due: 1,
            sleeping: 1,
            ..Default::default()
        });

        assert_eq!(total.due, 3);
        assert_eq!(total.processed, 1);
        assert_eq!(total.sleeping, 1);
        assert_eq!(total.failed, 1);
        assert!(!total.is_empty());
    }
}
