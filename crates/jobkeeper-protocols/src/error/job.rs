//! Job manager errors.

use thiserror::Error;

use super::StoreError;
use crate::job::JobStatus;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state for {ticket}: {status}")]
    InvalidState { ticket: String, status: JobStatus },

    #[error("Handler already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Dispatch failed: {0}")]
    Dispatch(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl JobError {
    /// Map a compare-and-set conflict to `InvalidState`, other store
    /// errors pass through.
    pub fn from_transition(err: StoreError) -> Self {
        match err {
            StoreError::StatusConflict { ticket, actual, .. } => JobError::InvalidState {
                ticket,
                status: actual,
            },
            StoreError::IllegalTransition { ticket, from, .. } => JobError::InvalidState {
                ticket,
                status: from,
            },
            StoreError::NotFound(what) => JobError::NotFound(what),
            other => JobError::Store(other),
        }
    }
}
