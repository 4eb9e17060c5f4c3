//! Per-job execution log storage.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use jobkeeper_protocols::{LogRecord, LogSink, StoreError, Ticket};

use crate::fs_util::{read_optional, remove_optional};

/// In-memory log sink.
#[derive(Default)]
pub struct MemoryLogSink {
    records: RwLock<HashMap<Ticket, Vec<LogRecord>>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LogSink for MemoryLogSink {
    async fn append(&self, ticket: &Ticket, record: &LogRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        records.entry(*ticket).or_default().push(record.clone());
        Ok(())
    }

    async fn find_by_ticket(&self, ticket: &Ticket) -> Result<Vec<LogRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records.get(ticket).cloned().unwrap_or_default())
    }

    async fn delete_by_ticket(&self, ticket: &Ticket) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        records.remove(ticket);
        Ok(())
    }
}

/// Log sink writing one JSON-lines file per job: `{directory}/{ticket}.json`.
///
/// The directory must already exist and be writable.
pub struct FileLogSink {
    directory: PathBuf,
    write_lock: Mutex<()>,
}

impl FileLogSink {
    pub async fn new(directory: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let directory = directory.into();

        let metadata = fs::metadata(&directory).await.map_err(|e| {
            StoreError::Custom(format!("Log directory {:?} is not accessible: {}", directory, e))
        })?;
        if !metadata.is_dir() {
            return Err(StoreError::Custom(format!(
                "Log path {:?} is not a directory",
                directory
            )));
        }
        if metadata.permissions().readonly() {
            return Err(StoreError::Custom(format!(
                "Log directory {:?} is not writable",
                directory
            )));
        }

        debug!("FileLogSink writing to {:?}", directory);

        Ok(Self {
            directory,
            write_lock: Mutex::new(()),
        })
    }

    fn log_path(&self, ticket: &Ticket) -> PathBuf {
        self.directory.join(format!("{}.json", ticket))
    }
}

#[async_trait]
impl LogSink for FileLogSink {
    async fn append(&self, ticket: &Ticket, record: &LogRecord) -> Result<(), StoreError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path(ticket))
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }

    async fn find_by_ticket(&self, ticket: &Ticket) -> Result<Vec<LogRecord>, StoreError> {
        let path = self.log_path(ticket);
        let Some(bytes) = read_optional(&path).await? else {
            return Ok(Vec::new());
        };

        // raw bytes: invalid UTF-8 counts as corruption
        let mut records = Vec::new();
        for (index, line) in bytes.split(|b| *b == b'\n').enumerate() {
            let line = line.trim_ascii();
            if line.is_empty() {
                continue;
            }
            let record = serde_json::from_slice(line).map_err(|e| StoreError::Corrupted {
                path: path.display().to_string(),
                message: format!("line {}: {}", index + 1, e),
            })?;
            records.push(record);
        }
        Ok(records)
    }

    async fn delete_by_ticket(&self, ticket: &Ticket) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        remove_optional(&self.log_path(ticket)).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "log_sink_tests.rs"]
mod tests;
