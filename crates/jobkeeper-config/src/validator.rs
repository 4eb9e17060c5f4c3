//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::{Config, LoggingConfig};

const DRIVERS: [&str; 2] = ["file", "memory"];
const MODES: [&str; 2] = ["inline", "background"];

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_storage(config, &mut result);
        Self::validate_logging(config, &mut result);
        Self::validate_executor(config, &mut result);
        Self::validate_scheduler(config, &mut result);

        Ok(result)
    }

    fn validate_storage(config: &Config, result: &mut ValidationResult) {
        let storage = &config.storage;
        if !DRIVERS.contains(&storage.driver.as_str()) {
            result.add_error(ValidationError::new(
                "storage.driver",
                format!(
                    "Unsupported storage driver '{}', valid values: {:?}",
                    storage.driver, DRIVERS
                ),
            ));
        }

        if storage.driver == "file" && storage.directory.trim().is_empty() {
            result.add_error(ValidationError::new(
                "storage.directory",
                "Storage directory cannot be empty",
            ));
        }

        if storage.driver == "memory" {
            result.add_warning(ValidationWarning::new(
                "storage.driver",
                "Memory storage keeps jobs only for the lifetime of the process",
            ));
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        let logging = &config.logging;
        if !DRIVERS.contains(&logging.handler.as_str()) {
            result.add_error(ValidationError::new(
                "logging.handler",
                format!(
                    "Unsupported log handler '{}', valid values: {:?}",
                    logging.handler, DRIVERS
                ),
            ));
        }

        if logging.handler == "file" && logging.directory.trim().is_empty() {
            result.add_error(ValidationError::new(
                "logging.directory",
                "Log directory cannot be empty",
            ));
        }

        if let Err(e) = logging.level() {
            result.add_error(ValidationError::new("logging.default_level", e.to_string()));
        }

        let mut job_types: Vec<&String> = logging.custom_level.keys().collect();
        job_types.sort();
        for job_type in job_types {
            let path = format!("logging.custom_level.{}", job_type);
            if job_type.trim().is_empty() {
                result.add_error(ValidationError::new(path, "Job type cannot be empty"));
                continue;
            }
            if let Err(e) = LoggingConfig::parse_custom_level(job_type, &logging.custom_level[job_type]) {
                result.add_error(ValidationError::new(path, e.to_string()));
            }
        }
    }

    fn validate_executor(config: &Config, result: &mut ValidationResult) {
        let executor = &config.executor;
        if !MODES.contains(&executor.mode.as_str()) {
            result.add_error(ValidationError::new(
                "executor.mode",
                format!(
                    "Unsupported execution mode '{}', valid values: {:?}",
                    executor.mode, MODES
                ),
            ));
        }

        if executor.max_workers == 0 {
            result.add_error(ValidationError::new(
                "executor.max_workers",
                "max_workers must be greater than 0",
            ));
        }

        if executor.max_workers > 256 {
            result.add_warning(ValidationWarning::new(
                "executor.max_workers",
                "max_workers is very high (>256)",
            ));
        }

        if executor.listener_timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "executor.listener_timeout_ms",
                "listener_timeout_ms must be greater than 0",
            ));
        }
    }

    fn validate_scheduler(config: &Config, result: &mut ValidationResult) {
        if config.scheduler.interval_secs == 0 {
            result.add_error(ValidationError::new(
                "scheduler.interval_secs",
                "interval_secs must be greater than 0",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
