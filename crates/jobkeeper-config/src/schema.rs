//! Configuration schema definitions.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use jobkeeper_protocols::LogLevel;

use crate::error::ConfigError;
use crate::loader::ConfigLoader;

fn default_true() -> bool {
    true
}

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Register the built-in `log` and `sleep` handlers.
    #[serde(default = "default_true")]
    pub register_default_jobs: bool,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            register_default_jobs: true,
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
            executor: ExecutorConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

/// Job and schedule storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// `file` or `memory`.
    #[serde(default = "default_storage_driver")]
    pub driver: String,

    #[serde(default = "default_storage_directory")]
    pub directory: String,
}

fn default_storage_driver() -> String {
    "file".to_string()
}

fn default_storage_directory() -> String {
    "~/.jobkeeper/data".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            driver: default_storage_driver(),
            directory: default_storage_directory(),
        }
    }
}

impl StorageConfig {
    /// Storage directory with `~` expanded.
    pub fn directory_path(&self) -> PathBuf {
        PathBuf::from(ConfigLoader::expand_path(&self.directory))
    }
}

/// Job logs and application logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `file` or `memory`.
    #[serde(default = "default_log_handler")]
    pub handler: String,

    #[serde(default = "default_log_directory")]
    pub directory: String,

    /// Minimum level written to job logs.
    #[serde(default = "default_log_level")]
    pub default_level: String,

    /// Minimum level per job type, overriding `default_level`.
    #[serde(default)]
    pub custom_level: HashMap<String, String>,
}

fn default_log_handler() -> String {
    "file".to_string()
}

fn default_log_directory() -> String {
    "~/.jobkeeper/logs".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            handler: default_log_handler(),
            directory: default_log_directory(),
            default_level: default_log_level(),
            custom_level: HashMap::new(),
        }
    }
}

impl LoggingConfig {
    /// Log directory with `~` expanded.
    pub fn directory_path(&self) -> PathBuf {
        PathBuf::from(ConfigLoader::expand_path(&self.directory))
    }

    pub fn level(&self) -> Result<LogLevel, ConfigError> {
        self.default_level
            .parse()
            .map_err(|message| ConfigError::InvalidValue {
                field: "logging.default_level".to_string(),
                message,
            })
    }

    /// Parsed `custom_level` entries.
    pub fn custom_levels(&self) -> Result<HashMap<String, LogLevel>, ConfigError> {
        self.custom_level
            .iter()
            .map(|(job_type, level)| {
                Self::parse_custom_level(job_type, level).map(|level| (job_type.clone(), level))
            })
            .collect()
    }

    pub(crate) fn parse_custom_level(job_type: &str, level: &str) -> Result<LogLevel, ConfigError> {
        level.parse().map_err(|message| ConfigError::InvalidValue {
            field: format!("logging.custom_level.{}", job_type),
            message,
        })
    }
}

/// Job execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// `inline` or `background`.
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Background worker count.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Upper bound for a single execution listener call.
    #[serde(default = "default_listener_timeout_ms")]
    pub listener_timeout_ms: u64,
}

fn default_mode() -> String {
    "inline".to_string()
}

fn default_max_workers() -> usize {
    4
}

fn default_listener_timeout_ms() -> u64 {
    5000
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            max_workers: default_max_workers(),
            listener_timeout_ms: default_listener_timeout_ms(),
        }
    }
}

/// Schedule processing loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between iterations in daemon mode.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_interval_secs() -> u64 {
    60
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}
