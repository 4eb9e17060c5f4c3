//! Handler failures.

use thiserror::Error;

use super::{JobError, StoreError};
use crate::job::ExceptionResponse;

/// Failure raised by job handler code.
///
/// Never surfaced to `add_job` callers; the executor turns it into an
/// [`ExceptionResponse`] on the job.
#[derive(Debug, Clone, Error)]
#[error("{message} (code {code})")]
pub struct HandlerError {
    pub message: String,
    pub code: i64,
}

impl HandlerError {
    pub fn new(message: impl Into<String>, code: i64) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }

    /// Failure without a specific code.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(message, 0)
    }

    pub fn to_response(&self) -> ExceptionResponse {
        ExceptionResponse::new(self.message.clone(), self.code)
    }
}

impl From<JobError> for HandlerError {
    fn from(err: JobError) -> Self {
        Self::msg(err.to_string())
    }
}

impl From<StoreError> for HandlerError {
    fn from(err: StoreError) -> Self {
        Self::msg(err.to_string())
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::msg(format!("invalid parameters: {}", err))
    }
}
