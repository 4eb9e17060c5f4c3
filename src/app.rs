//! Wiring of stores, handlers and the job manager from configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use tracing::{debug, info, warn};

use jobkeeper_config::{Config, ConfigLoader, ConfigValidator, ValidationWarning};
use jobkeeper_core::handlers::register_defaults;
use jobkeeper_core::{ExecutionMode, HandlerRegistry, JobManager};
use jobkeeper_protocols::{JobStore, LogSink, ScheduleStore};
use jobkeeper_store::{
    FileJobStore, FileLogSink, FileScheduleStore, MemoryJobStore, MemoryLogSink,
    MemoryScheduleStore,
};

/// Load and validate the configuration, falling back to defaults when no
/// file exists.
///
/// Runs before tracing is initialized, so validation warnings are returned
/// for the caller to report.
pub(crate) fn load_config(
    path: Option<&Path>,
) -> anyhow::Result<(Config, Option<PathBuf>, Vec<ValidationWarning>)> {
    let (config, source) = ConfigLoader::discover(path)?;

    let result = ConfigValidator::validate(&config)?;
    if !result.is_valid() {
        let messages: Vec<String> = result
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.path, e.message))
            .collect();
        bail!("invalid configuration: {}", messages.join("; "));
    }

    Ok((config, source, result.warnings))
}

/// Report where the configuration came from and what looked off.
pub(crate) fn report_config(source: Option<&Path>, warnings: &[ValidationWarning]) {
    match source {
        Some(source) => debug!("Loaded configuration from {}", source.display()),
        None => debug!("No configuration file found, using defaults"),
    }
    for warning in warnings {
        warn!("Config {}: {}", warning.path, warning.message);
    }
}

/// Build a job manager backed by the configured stores.
pub(crate) async fn build_manager(config: &Config) -> anyhow::Result<JobManager> {
    let (jobs, schedules): (Arc<dyn JobStore>, Arc<dyn ScheduleStore>) =
        match config.storage.driver.as_str() {
            "memory" => (
                Arc::new(MemoryJobStore::new()),
                Arc::new(MemoryScheduleStore::new()),
            ),
            _ => {
                let root = config.storage.directory_path();
                (
                    Arc::new(FileJobStore::new(&root).await?),
                    Arc::new(FileScheduleStore::new(&root).await?),
                )
            }
        };

    let logs: Arc<dyn LogSink> = match config.logging.handler.as_str() {
        "memory" => Arc::new(MemoryLogSink::new()),
        _ => {
            let dir = config.logging.directory_path().join("jobs");
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
            Arc::new(FileLogSink::new(dir).await?)
        }
    };

    let registry = Arc::new(HandlerRegistry::new());
    if config.register_default_jobs {
        register_defaults(&registry)?;
    }

    let mode: ExecutionMode = config
        .executor
        .mode
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let mut builder = JobManager::builder(registry.clone(), jobs, schedules, logs)
        .log_level(config.logging.level()?)
        .mode(mode)
        .max_workers(config.executor.max_workers)
        .listener_timeout(Duration::from_millis(config.executor.listener_timeout_ms));
    for (job_type, level) in config.logging.custom_levels()? {
        if !registry.contains(&job_type) {
            warn!("Custom log level set for unknown job type '{}'", job_type);
        }
        builder = builder.custom_log_level(job_type, level);
    }
    let manager = builder.build();

    info!(
        "Job manager ready (storage: {}, mode: {}, job types: {})",
        config.storage.driver,
        mode,
        manager.registry().job_types().join(", ")
    );
    Ok(manager)
}

/// Parse job parameters given on the command line.
///
/// A JSON array is taken as the parameter list; any other JSON value is a
/// single parameter.
pub(crate) fn parse_params(raw: Option<&str>) -> anyhow::Result<Vec<serde_json::Value>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    let value: serde_json::Value =
        serde_json::from_str(raw).with_context(|| format!("invalid JSON parameters: {}", raw))?;
    Ok(match value {
        serde_json::Value::Array(items) => items,
        other => vec![other],
    })
}
