//! Scheduler loop.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::{self, Duration};
use tracing::{error, info};

use jobkeeper_protocols::JobError;

use crate::processor::{IterationReport, ScheduleProcessor};

/// Default time between iterations.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Drives a [`ScheduleProcessor`] on an interval.
pub struct SchedulerLoop {
    processor: ScheduleProcessor,
    interval: Duration,
}

impl SchedulerLoop {
    pub fn new(processor: ScheduleProcessor) -> Self {
        Self {
            processor,
            interval: DEFAULT_INTERVAL,
        }
    }

    /// Set the interval between iterations.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn processor(&self) -> &ScheduleProcessor {
        &self.processor
    }

    /// Run exactly `iterations` passes, sleeping the interval between
    /// them. Stops at the first failing pass.
    pub async fn run_iterations(&self, iterations: u32) -> Result<IterationReport, JobError> {
        let mut total = IterationReport::default();

        for i in 0..iterations {
            if i > 0 {
                time::sleep(self.interval).await;
            }
            info!("Scheduler iteration {}/{}", i + 1, iterations);
            total.merge(self.processor.process_iteration().await?);
        }

        Ok(total)
    }

    /// Run until `shutdown` changes. Failing passes are logged and the
    /// loop continues.
    pub async fn run(self: Arc<Self>, shutdown: watch::Receiver<bool>) {
        info!("Scheduler started (interval: {:?})", self.interval);

        let mut interval = time::interval(self.interval);
        let mut shutdown = shutdown;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.processor.process_iteration().await {
                        error!("Scheduler iteration failed: {}", e);
                    }
                }
                _ = shutdown.changed() => {
                    info!("Scheduler shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobkeeper_core::handlers::register_defaults;
    use jobkeeper_core::{HandlerRegistry, JobManager};
    use jobkeeper_protocols::{JobStatus, Schedule};
    use jobkeeper_store::{MemoryJobStore, MemoryLogSink, MemoryScheduleStore};

    fn scheduler(interval: Duration) -> SchedulerLoop {
        let registry = Arc::new(HandlerRegistry::new());
        register_defaults(&registry).unwrap();
        let manager = JobManager::builder(
            registry,
            Arc::new(MemoryJobStore::new()),
            Arc::new(MemoryScheduleStore::new()),
            Arc::new(MemoryLogSink::new()),
        )
        .build();
        SchedulerLoop::new(ScheduleProcessor::new(manager)).with_interval(interval)
    }

    #[test]
    fn test_default_interval() {
        let scheduler = scheduler(DEFAULT_INTERVAL);
        assert_eq!(scheduler.interval(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_run_iterations_empty() {
        let scheduler = scheduler(Duration::from_millis(1));
        let report = scheduler.run_iterations(3).await.unwrap();
        assert!(report.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_iterations_triggers_due_job() {
        let scheduler = scheduler(Duration::from_secs(60));
        let manager = scheduler.processor().manager().clone();
        let job = manager
            .add_job(
                "log",
                vec![serde_json::json!("tick")],
                Some(Schedule::new("cron", "* * * * *")),
            )
            .await
            .unwrap();

        let report = scheduler.run_iterations(1).await.unwrap();
        assert_eq!(report.due, 1);
        assert_eq!(report.executed, vec![job.ticket]);
        assert_eq!(manager.get(&job.ticket).await.unwrap().status, JobStatus::Sleeping);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let scheduler = Arc::new(scheduler(Duration::from_millis(10)));
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(scheduler.clone().run(rx));
        time::sleep(Duration::from_millis(30)).await;
        tx.send(true).unwrap();

        time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("scheduler did not stop")
            .unwrap();
    }
}
