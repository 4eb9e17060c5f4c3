//! Handler registry.

use std::sync::Arc;

use dashmap::DashMap;

use jobkeeper_protocols::{JobError, JobHandler};

/// Registry mapping job types to handlers.
///
/// Thread-safe; registration may happen while jobs are running.
pub struct HandlerRegistry {
    handlers: DashMap<String, Arc<dyn JobHandler>>,
}

impl HandlerRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }

    /// Register a handler under its job type.
    ///
    /// Returns an error if the type is already registered.
    pub fn register(&self, handler: Arc<dyn JobHandler>) -> Result<(), JobError> {
        let job_type = handler.job_type().to_string();

        if self.handlers.contains_key(&job_type) {
            return Err(JobError::AlreadyRegistered(job_type));
        }

        self.handlers.insert(job_type, handler);
        Ok(())
    }

    /// Remove a handler.
    pub fn unregister(&self, job_type: &str) -> Result<(), JobError> {
        self.handlers
            .remove(job_type)
            .ok_or_else(|| JobError::NotFound(job_type.to_string()))?;
        Ok(())
    }

    /// Get a handler by job type.
    pub fn get(&self, job_type: &str) -> Option<Arc<dyn JobHandler>> {
        self.handlers.get(job_type).map(|h| h.clone())
    }

    /// Get a handler, failing validation when the type is unknown.
    pub fn resolve(&self, job_type: &str) -> Result<Arc<dyn JobHandler>, JobError> {
        self.get(job_type)
            .ok_or_else(|| JobError::Validation(format!("unknown job type '{}'", job_type)))
    }

    pub fn contains(&self, job_type: &str) -> bool {
        self.handlers.contains_key(job_type)
    }

    /// Registered job types, sorted.
    pub fn job_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.handlers.iter().map(|h| h.key().clone()).collect();
        types.sort();
        types
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
