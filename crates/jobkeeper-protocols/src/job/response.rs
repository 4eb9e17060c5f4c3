//! Job responses.

use serde::{Deserialize, Serialize};

/// Response stored on a job after execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum JobResponse {
    /// Value returned by the handler.
    Value(serde_json::Value),
    /// Failure raised by the handler.
    Exception(ExceptionResponse),
}

impl JobResponse {
    /// The returned value, if the handler succeeded.
    pub fn value(&self) -> Option<&serde_json::Value> {
        match self {
            JobResponse::Value(v) => Some(v),
            JobResponse::Exception(_) => None,
        }
    }

    /// The exception, if the handler failed.
    pub fn exception(&self) -> Option<&ExceptionResponse> {
        match self {
            JobResponse::Exception(e) => Some(e),
            JobResponse::Value(_) => None,
        }
    }
}

/// Message and code extracted from a handler failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionResponse {
    pub message: String,
    pub code: i64,
}

impl ExceptionResponse {
    pub fn new(message: impl Into<String>, code: i64) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let ok = JobResponse::Value(serde_json::json!({"answer": 42}));
        assert_eq!(ok.value().unwrap()["answer"], 42);
        assert!(ok.exception().is_none());

        let err = JobResponse::Exception(ExceptionResponse::new("message", 100));
        assert!(err.value().is_none());
        assert_eq!(err.exception().unwrap().code, 100);
    }

    #[test]
    fn test_tagged_serialization() {
        let err = JobResponse::Exception(ExceptionResponse::new("message", 100));
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "exception");
        assert_eq!(json["data"]["message"], "message");
        assert_eq!(json["data"]["code"], 100);
    }
}
