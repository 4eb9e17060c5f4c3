//! Job persistence store.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use jobkeeper_protocols::codec::{decode_as, encode_as};
use jobkeeper_protocols::store::check_transition;
use jobkeeper_protocols::{
    Codec, Job, JobStatus, JobStore, JobUpdate, ScheduleId, StoreError, Ticket,
};

use crate::codec::JsonCodec;
use crate::fs_util::{list_documents, read_optional, remove_optional, write_atomic};

/// In-memory job store.
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<Ticket, Job>>,
}

impl MemoryJobStore {
    /// Create a new memory store.
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn insert(&self, job: &Job) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.ticket) {
            return Err(StoreError::AlreadyExists(job.ticket.to_string()));
        }
        jobs.insert(job.ticket, job.clone());
        Ok(())
    }

    async fn find(&self, ticket: &Ticket) -> Result<Option<Job>, StoreError> {
        let jobs = self.jobs.read().await;
        Ok(jobs.get(ticket).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Job>, StoreError> {
        let jobs = self.jobs.read().await;
        let mut all: Vec<Job> = jobs.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(all)
    }

    async fn find_by_status(&self, status: JobStatus) -> Result<Vec<Job>, StoreError> {
        let jobs = self.jobs.read().await;
        Ok(jobs.values().filter(|j| j.status == status).cloned().collect())
    }

    async fn find_by_schedule(&self, schedule_id: &ScheduleId) -> Result<Vec<Job>, StoreError> {
        let jobs = self.jobs.read().await;
        Ok(jobs
            .values()
            .filter(|j| j.schedule_id.as_ref() == Some(schedule_id))
            .cloned()
            .collect())
    }

    async fn transition(
        &self,
        ticket: &Ticket,
        expected: &[JobStatus],
        update: JobUpdate,
    ) -> Result<Job, StoreError> {
        // check and write happen under one write lock
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(ticket)
            .ok_or_else(|| StoreError::NotFound(ticket.to_string()))?;
        check_transition(job, expected, &update)?;
        job.apply(&update);
        Ok(job.clone())
    }

    async fn delete(&self, ticket: &Ticket) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().await;
        jobs.remove(ticket);
        Ok(())
    }
}

/// File system based job store.
///
/// Jobs are stored as individual documents:
/// ```text
/// {storage_path}/
/// └── jobs/
///     └── {ticket}.json
/// ```
///
/// Writes are serialized through a store-wide lock so that the status
/// check and the write of a transition are atomic with respect to each
/// other; documents are replaced through a rename.
pub struct FileJobStore {
    storage_path: PathBuf,
    codec: Arc<dyn Codec>,
    write_lock: Mutex<()>,
}

impl FileJobStore {
    /// Create a new file-based job store.
    pub async fn new(storage_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::with_codec(storage_path, Arc::new(JsonCodec::pretty())).await
    }

    /// Create a store with a custom codec.
    pub async fn with_codec(
        storage_path: impl Into<PathBuf>,
        codec: Arc<dyn Codec>,
    ) -> Result<Self, StoreError> {
        let storage_path = storage_path.into();
        let jobs_dir = storage_path.join("jobs");

        fs::create_dir_all(&jobs_dir).await.map_err(|e| {
            StoreError::Custom(format!("Failed to create jobs directory: {}", e))
        })?;

        debug!("FileJobStore initialized at {:?} (codec: {})", storage_path, codec.name());

        Ok(Self {
            storage_path,
            codec,
            write_lock: Mutex::new(()),
        })
    }

    fn jobs_dir(&self) -> PathBuf {
        self.storage_path.join("jobs")
    }

    fn job_path(&self, ticket: &Ticket) -> PathBuf {
        self.jobs_dir().join(format!("{}.json", ticket))
    }

    async fn read(&self, ticket: &Ticket) -> Result<Option<Job>, StoreError> {
        let Some(bytes) = read_optional(&self.job_path(ticket)).await? else {
            return Ok(None);
        };
        Ok(Some(decode_as(self.codec.as_ref(), &bytes, "job")?))
    }

    async fn write(&self, job: &Job) -> Result<(), StoreError> {
        let content = encode_as(self.codec.as_ref(), job)?;
        let path = self.job_path(&job.ticket);
        write_atomic(&path, &content).await?;
        debug!("Saved job '{}' ({}) to {:?}", job.ticket, job.status, path);
        Ok(())
    }
}

#[async_trait]
impl JobStore for FileJobStore {
    async fn insert(&self, job: &Job) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        if self.job_path(&job.ticket).exists() {
            return Err(StoreError::AlreadyExists(job.ticket.to_string()));
        }
        self.write(job).await
    }

    async fn find(&self, ticket: &Ticket) -> Result<Option<Job>, StoreError> {
        self.read(ticket).await
    }

    async fn find_all(&self) -> Result<Vec<Job>, StoreError> {
        let mut jobs = Vec::new();
        for path in list_documents(&self.jobs_dir()).await? {
            match fs::read(&path).await {
                Ok(bytes) => match decode_as::<Job>(self.codec.as_ref(), &bytes, "job") {
                    Ok(job) => jobs.push(job),
                    Err(e) => warn!("Failed to deserialize job from {:?}: {}", path, e),
                },
                // removed between listing and reading
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to read job file {:?}: {}", path, e),
            }
        }

        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        debug!("Loaded {} jobs from {:?}", jobs.len(), self.jobs_dir());
        Ok(jobs)
    }

    async fn transition(
        &self,
        ticket: &Ticket,
        expected: &[JobStatus],
        update: JobUpdate,
    ) -> Result<Job, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut job = self
            .read(ticket)
            .await?
            .ok_or_else(|| StoreError::NotFound(ticket.to_string()))?;
        check_transition(&job, expected, &update)?;
        job.apply(&update);
        self.write(&job).await?;
        Ok(job)
    }

    async fn delete(&self, ticket: &Ticket) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        if remove_optional(&self.job_path(ticket)).await? {
            debug!("Deleted job '{}'", ticket);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "job_store_tests.rs"]
mod tests;
