//! Persistence errors.

use thiserror::Error;

use crate::job::JobStatus;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Record already exists: {0}")]
    AlreadyExists(String),

    #[error("Status conflict for {ticket}: expected one of {expected:?}, found {actual}")]
    StatusConflict {
        ticket: String,
        expected: Vec<JobStatus>,
        actual: JobStatus,
    },

    #[error("Illegal transition for {ticket}: {from} -> {to}")]
    IllegalTransition {
        ticket: String,
        from: JobStatus,
        to: JobStatus,
    },

    #[error("Corrupted data in {path}: {message}")]
    Corrupted { path: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Custom(String),
}
