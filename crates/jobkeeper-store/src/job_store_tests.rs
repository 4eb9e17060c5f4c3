use super::*;
use jobkeeper_protocols::{ExceptionResponse, JobResponse};
use tempfile::TempDir;
use uuid::Uuid;

async fn exercise_lifecycle(store: &dyn JobStore) {
    let job = Job::new("log", vec![serde_json::json!("message")]);
    store.insert(&job).await.unwrap();

    let running = store
        .transition(&job.ticket, &[JobStatus::Requested], JobUpdate::status(JobStatus::Running))
        .await
        .unwrap();
    assert_eq!(running.status, JobStatus::Running);
    assert_eq!(running.run_count, 1);

    let update = JobUpdate::status(JobStatus::Error)
        .with_response(Some(JobResponse::Exception(ExceptionResponse::new("message", 100))));
    store
        .transition(&job.ticket, &[JobStatus::Running], update)
        .await
        .unwrap();

    let loaded = store.find(&job.ticket).await.unwrap().unwrap();
    assert_eq!(loaded.status, JobStatus::Error);
    let exception = loaded.response.as_ref().unwrap().exception().unwrap();
    assert_eq!(exception.message, "message");
    assert_eq!(exception.code, 100);
}

async fn exercise_conflict(store: &dyn JobStore) {
    let job = Job::new("log", vec![]);
    store.insert(&job).await.unwrap();
    store
        .transition(&job.ticket, &[JobStatus::Requested], JobUpdate::status(JobStatus::Cancelled))
        .await
        .unwrap();

    let err = store
        .transition(&job.ticket, &[JobStatus::Requested], JobUpdate::status(JobStatus::Running))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::StatusConflict { actual: JobStatus::Cancelled, .. }));

    // rejected transitions leave the job untouched
    let loaded = store.find(&job.ticket).await.unwrap().unwrap();
    assert_eq!(loaded.status, JobStatus::Cancelled);
    assert_eq!(loaded.run_count, 0);
}

async fn exercise_queries(store: &dyn JobStore) {
    let schedule_id = Uuid::new_v4();
    let scheduled = Job::new("schedule", vec![]).with_schedule(schedule_id);
    let plain = Job::new("log", vec![]);
    store.insert(&scheduled).await.unwrap();
    store.insert(&plain).await.unwrap();

    let linked = store.find_by_schedule(&schedule_id).await.unwrap();
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].ticket, scheduled.ticket);

    let requested = store.find_by_status(JobStatus::Requested).await.unwrap();
    assert_eq!(requested.len(), 2);
    assert!(store.find_by_status(JobStatus::Running).await.unwrap().is_empty());

    store.delete(&plain.ticket).await.unwrap();
    assert!(store.find(&plain.ticket).await.unwrap().is_none());
    assert_eq!(store.find_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_memory_job_store_lifecycle() {
    exercise_lifecycle(&MemoryJobStore::new()).await;
}

#[tokio::test]
async fn test_memory_job_store_conflict() {
    exercise_conflict(&MemoryJobStore::new()).await;
}

#[tokio::test]
async fn test_memory_job_store_queries() {
    exercise_queries(&MemoryJobStore::new()).await;
}

#[tokio::test]
async fn test_memory_job_store_duplicate_insert() {
    let store = MemoryJobStore::new();
    let job = Job::new("log", vec![]);
    store.insert(&job).await.unwrap();
    assert!(matches!(
        store.insert(&job).await,
        Err(StoreError::AlreadyExists(_))
    ));
}

#[tokio::test]
async fn test_memory_transition_unknown_ticket() {
    let store = MemoryJobStore::new();
    let err = store
        .transition(&Uuid::new_v4(), &[JobStatus::Requested], JobUpdate::status(JobStatus::Running))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn test_file_job_store_lifecycle() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileJobStore::new(temp_dir.path()).await.unwrap();
    exercise_lifecycle(&store).await;
}

#[tokio::test]
async fn test_file_job_store_conflict() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileJobStore::new(temp_dir.path()).await.unwrap();
    exercise_conflict(&store).await;
}

#[tokio::test]
async fn test_file_job_store_queries() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileJobStore::new(temp_dir.path()).await.unwrap();
    exercise_queries(&store).await;
}

#[tokio::test]
async fn test_file_job_store_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let job = Job::new("log", vec![serde_json::json!("persisted")]);
    {
        let store = FileJobStore::new(temp_dir.path()).await.unwrap();
        store.insert(&job).await.unwrap();
    }

    let store = FileJobStore::new(temp_dir.path()).await.unwrap();
    let loaded = store.find(&job.ticket).await.unwrap().unwrap();
    assert_eq!(loaded.parameters, vec![serde_json::json!("persisted")]);
    assert!(store.job_path(&job.ticket).exists());
}

#[tokio::test]
async fn test_file_job_store_skips_corrupted_documents() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileJobStore::new(temp_dir.path()).await.unwrap();
    store.insert(&Job::new("log", vec![])).await.unwrap();
    tokio::fs::write(store.jobs_dir().join("garbage.json"), b"{oops")
        .await
        .unwrap();

    assert_eq!(store.find_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_concurrent_cancel_has_single_winner() {
    let store = Arc::new(MemoryJobStore::new());
    let job = Job::new("log", vec![]);
    store.insert(&job).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        let ticket = job.ticket;
        handles.push(tokio::spawn(async move {
            let next = if i % 2 == 0 { JobStatus::Cancelled } else { JobStatus::Running };
            store
                .transition(&ticket, &[JobStatus::Requested], JobUpdate::status(next))
                .await
                .is_ok()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}
