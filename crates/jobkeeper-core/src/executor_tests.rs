use super::*;
use async_trait::async_trait;
use jobkeeper_protocols::{JobHandler, LogLevel, LogSink, Schedule, ScheduleStore};
use jobkeeper_store::{MemoryJobStore, MemoryLogSink, MemoryScheduleStore};

use crate::logger::LoggerFactory;

struct FnHandler<F> {
    name: &'static str,
    f: F,
}

#[async_trait]
impl<F> JobHandler for FnHandler<F>
where
    F: Fn(&ExecutionContext) -> Result<serde_json::Value, HandlerError> + Send + Sync,
{
    fn job_type(&self) -> &str {
        self.name
    }

    async fn invoke(
        &self,
        _parameters: &[serde_json::Value],
        ctx: &ExecutionContext,
    ) -> Result<serde_json::Value, HandlerError> {
        (self.f)(ctx)
    }
}

struct Fixture {
    executor: JobExecutor,
    jobs: Arc<dyn JobStore>,
    schedules: Arc<dyn ScheduleStore>,
    logs: Arc<dyn LogSink>,
}

impl Fixture {
    fn new() -> Self {
        let registry = Arc::new(HandlerRegistry::new());
        let register = |name: &'static str, f: fn(&ExecutionContext) -> Result<serde_json::Value, HandlerError>| {
            registry.register(Arc::new(FnHandler { name, f })).unwrap();
        };
        register("ok", |_| Ok(serde_json::json!({"answer": 42})));
        register("null", |_| Ok(serde_json::Value::Null));
        register("fail", |_| Err(HandlerError::new("message", 100)));
        register("panic", |_| panic!("boom"));
        register("create", |ctx| {
            ctx.create_schedule("cron", "* * * * *");
            Ok(serde_json::Value::Null)
        });
        register("create_bad", |ctx| {
            ctx.create_schedule("cron", "not a cron");
            Ok(serde_json::Value::Null)
        });
        register("update", |ctx| {
            ctx.update_schedule("cron", "1 1 * * *");
            Ok(serde_json::Value::Null)
        });
        register("remove", |ctx| {
            ctx.remove_schedule();
            Ok(serde_json::Value::Null)
        });
        register("create_then_fail", |ctx| {
            ctx.create_schedule("cron", "* * * * *");
            Err(HandlerError::new("late failure", 7))
        });

        let jobs: Arc<dyn JobStore> = Arc::new(MemoryJobStore::new());
        let schedules: Arc<dyn ScheduleStore> = Arc::new(MemoryScheduleStore::new());
        let logs: Arc<dyn LogSink> = Arc::new(MemoryLogSink::new());
        let executor = JobExecutor::new(
            registry,
            jobs.clone(),
            ScheduleManager::new(schedules.clone()),
            Arc::new(EventDispatcher::default()),
        );

        Self {
            executor,
            jobs,
            schedules,
            logs,
        }
    }

    async fn run(&self, job: Job) -> Job {
        self.jobs.insert(&job).await.unwrap();
        let mut job = self
            .jobs
            .transition(&job.ticket, &[JobStatus::Requested], JobUpdate::status(JobStatus::Running))
            .await
            .unwrap();

        let ctx = ExecutionContext::new(&job);
        let loggers = LoggerFactory::new(self.logs.clone(), LogLevel::Debug);
        ctx.set_logger(loggers.for_job(job.ticket, &job.job_type));
        self.executor.execute(&mut job, &ctx).await.unwrap();
        job
    }
}

#[tokio::test]
async fn test_success_records_response() {
    let fixture = Fixture::new();
    let job = fixture.run(Job::new("ok", vec![])).await;

    assert_eq!(job.status, JobStatus::Processed);
    assert_eq!(
        job.response.as_ref().and_then(|r| r.value()),
        Some(&serde_json::json!({"answer": 42}))
    );
    assert!(job.processing_time_ms.is_some());

    let stored = fixture.jobs.find(&job.ticket).await.unwrap().unwrap();
    assert_eq!(stored, job);
}

#[tokio::test]
async fn test_null_response_is_none() {
    let fixture = Fixture::new();
    let job = fixture.run(Job::new("null", vec![])).await;
    assert_eq!(job.status, JobStatus::Processed);
    assert!(job.response.is_none());
}

#[tokio::test]
async fn test_failure_becomes_exception_response() {
    let fixture = Fixture::new();
    let job = fixture.run(Job::new("fail", vec![])).await;

    assert_eq!(job.status, JobStatus::Error);
    let exception = job.response.as_ref().unwrap().exception().unwrap();
    assert_eq!(exception.message, "message");
    assert_eq!(exception.code, 100);

    let logs = fixture.logs.find_by_ticket(&job.ticket).await.unwrap();
    assert!(logs.iter().any(|r| r.level == LogLevel::Error && r.message == "message"));
}

#[tokio::test]
async fn test_panic_is_caught() {
    let fixture = Fixture::new();
    let job = fixture.run(Job::new("panic", vec![])).await;

    assert_eq!(job.status, JobStatus::Error);
    let exception = job.response.as_ref().unwrap().exception().unwrap();
    assert_eq!(exception.code, PANIC_CODE);
    assert!(exception.message.contains("boom"));
}

#[tokio::test]
async fn test_create_directive_sleeps_job() {
    let fixture = Fixture::new();
    let job = fixture.run(Job::new("create", vec![])).await;

    assert_eq!(job.status, JobStatus::Sleeping);
    let schedules = fixture.schedules.find_all().await.unwrap();
    assert_eq!(schedules.len(), 1);
    assert_eq!(job.schedule_id, Some(schedules[0].id));
    assert_eq!(schedules[0].schedule_type, "cron");
    assert_eq!(schedules[0].expression, "* * * * *");
}

#[tokio::test]
async fn test_bad_directive_fails_job() {
    let fixture = Fixture::new();
    let job = fixture.run(Job::new("create_bad", vec![])).await;

    assert_eq!(job.status, JobStatus::Error);
    assert!(fixture.schedules.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_without_schedule_fails_job() {
    let fixture = Fixture::new();
    let job = fixture.run(Job::new("update", vec![])).await;

    assert_eq!(job.status, JobStatus::Error);
    let exception = job.response.as_ref().unwrap().exception().unwrap();
    assert!(exception.message.contains("no schedule"));
}

#[tokio::test]
async fn test_update_directive_keeps_schedule_id() {
    let fixture = Fixture::new();
    let schedule = Schedule::new("cron", "* * * * *");
    fixture.schedules.save(&schedule).await.unwrap();

    let job = fixture
        .run(Job::new("update", vec![]).with_schedule(schedule.id))
        .await;

    assert_eq!(job.status, JobStatus::Sleeping);
    assert_eq!(job.schedule_id, Some(schedule.id));
    let stored = fixture.schedules.find(&schedule.id).await.unwrap().unwrap();
    assert_eq!(stored.expression, "1 1 * * *");
    assert!(stored.next_run_at.is_some());
}

#[tokio::test]
async fn test_remove_directive_processes_job() {
    let fixture = Fixture::new();
    let schedule = Schedule::new("cron", "* * * * *");
    fixture.schedules.save(&schedule).await.unwrap();

    let job = fixture
        .run(Job::new("remove", vec![]).with_schedule(schedule.id))
        .await;

    assert_eq!(job.status, JobStatus::Processed);
    assert!(job.schedule_id.is_none());
    assert!(fixture.schedules.find_all().await.unwrap().is_empty());

    let logs = fixture.logs.find_by_ticket(&job.ticket).await.unwrap();
    assert!(logs.iter().any(|r| r.message.contains("removed schedule")));
}

#[tokio::test]
async fn test_failed_run_discards_directive() {
    let fixture = Fixture::new();
    let job = fixture.run(Job::new("create_then_fail", vec![])).await;

    assert_eq!(job.status, JobStatus::Error);
    assert!(fixture.schedules.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_linked_job_without_directive_sleeps() {
    let fixture = Fixture::new();
    let schedule = Schedule::new("cron", "* * * * *");
    fixture.schedules.save(&schedule).await.unwrap();

    let job = fixture
        .run(Job::new("ok", vec![]).with_schedule(schedule.id))
        .await;
    assert_eq!(job.status, JobStatus::Sleeping);
}

#[tokio::test]
async fn test_execute_requires_running_job() {
    let fixture = Fixture::new();
    let mut job = Job::new("ok", vec![]);
    fixture.jobs.insert(&job).await.unwrap();

    let ctx = ExecutionContext::new(&job);
    let result = fixture.executor.execute(&mut job, &ctx).await;
    assert!(matches!(result, Err(JobError::InvalidState { .. })));
}

#[test]
fn test_panic_message() {
    let payload: Box<dyn Any + Send> = Box::new("static str");
    assert_eq!(panic_message(payload.as_ref()), "static str");
    let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
    assert_eq!(panic_message(payload.as_ref()), "owned");
    let payload: Box<dyn Any + Send> = Box::new(5_u8);
    assert_eq!(panic_message(payload.as_ref()), "unknown panic");
}
