//! Schedule persistence store.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use jobkeeper_protocols::codec::{decode_as, encode_as};
use jobkeeper_protocols::{Codec, Schedule, ScheduleId, ScheduleStore, StoreError};

use crate::codec::JsonCodec;
use crate::fs_util::{list_documents, read_optional, remove_optional, write_atomic};

/// In-memory schedule store.
#[derive(Default)]
pub struct MemoryScheduleStore {
    schedules: RwLock<HashMap<ScheduleId, Schedule>>,
}

impl MemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScheduleStore for MemoryScheduleStore {
    async fn save(&self, schedule: &Schedule) -> Result<(), StoreError> {
        let mut schedules = self.schedules.write().await;
        schedules.insert(schedule.id, schedule.clone());
        Ok(())
    }

    async fn find(&self, id: &ScheduleId) -> Result<Option<Schedule>, StoreError> {
        let schedules = self.schedules.read().await;
        Ok(schedules.get(id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Schedule>, StoreError> {
        let schedules = self.schedules.read().await;
        let mut all: Vec<Schedule> = schedules.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(all)
    }

    async fn update(&self, schedule: &Schedule) -> Result<(), StoreError> {
        let mut schedules = self.schedules.write().await;
        match schedules.get_mut(&schedule.id) {
            Some(existing) => {
                *existing = schedule.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(schedule.id.to_string())),
        }
    }

    async fn delete(&self, id: &ScheduleId) -> Result<bool, StoreError> {
        let mut schedules = self.schedules.write().await;
        Ok(schedules.remove(id).is_some())
    }
}

/// File system based schedule store.
///
/// ```text
/// {storage_path}/
/// └── schedules/
///     └── {id}.json
/// ```
pub struct FileScheduleStore {
    storage_path: PathBuf,
    codec: Arc<dyn Codec>,
    write_lock: Mutex<()>,
}

impl FileScheduleStore {
    pub async fn new(storage_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::with_codec(storage_path, Arc::new(JsonCodec::pretty())).await
    }

    pub async fn with_codec(
        storage_path: impl Into<PathBuf>,
        codec: Arc<dyn Codec>,
    ) -> Result<Self, StoreError> {
        let storage_path = storage_path.into();
        fs::create_dir_all(storage_path.join("schedules"))
            .await
            .map_err(|e| {
                StoreError::Custom(format!("Failed to create schedules directory: {}", e))
            })?;

        debug!("FileScheduleStore initialized at {:?}", storage_path);

        Ok(Self {
            storage_path,
            codec,
            write_lock: Mutex::new(()),
        })
    }

    fn schedules_dir(&self) -> PathBuf {
        self.storage_path.join("schedules")
    }

    fn schedule_path(&self, id: &ScheduleId) -> PathBuf {
        self.schedules_dir().join(format!("{}.json", id))
    }

    async fn write(&self, schedule: &Schedule) -> Result<(), StoreError> {
        let content = encode_as(self.codec.as_ref(), schedule)?;
        write_atomic(&self.schedule_path(&schedule.id), &content).await
    }
}

#[async_trait]
impl ScheduleStore for FileScheduleStore {
    async fn save(&self, schedule: &Schedule) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.write(schedule).await?;
        debug!("Saved schedule '{}' ({})", schedule.id, schedule.expression);
        Ok(())
    }

    async fn find(&self, id: &ScheduleId) -> Result<Option<Schedule>, StoreError> {
        match read_optional(&self.schedule_path(id)).await? {
            Some(bytes) => Ok(Some(decode_as(self.codec.as_ref(), &bytes, "schedule")?)),
            None => Ok(None),
        }
    }

    async fn find_all(&self) -> Result<Vec<Schedule>, StoreError> {
        let mut schedules = Vec::new();
        for path in list_documents(&self.schedules_dir()).await? {
            let Some(bytes) = read_optional(&path).await? else {
                continue;
            };
            match decode_as::<Schedule>(self.codec.as_ref(), &bytes, "schedule") {
                Ok(schedule) => schedules.push(schedule),
                Err(e) => warn!("Failed to deserialize schedule from {:?}: {}", path, e),
            }
        }
        schedules.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(schedules)
    }

    async fn update(&self, schedule: &Schedule) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        if !self.schedule_path(&schedule.id).exists() {
            return Err(StoreError::NotFound(schedule.id.to_string()));
        }
        self.write(schedule).await
    }

    async fn delete(&self, id: &ScheduleId) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let removed = remove_optional(&self.schedule_path(id)).await?;
        if removed {
            debug!("Deleted schedule '{}'", id);
        }
        Ok(removed)
    }
}
