//! Jobkeeper - job execution and scheduling manager
//!
//! Main entry point for the jobkeeper CLI.

use std::path::Path;
use std::time::Duration;

use clap::Parser;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod cli;
mod cmd_job;
mod cmd_schedule;
mod cmd_scheduler;

use cli::{Cli, Commands};
use cmd_job::handle_job_command;
use cmd_schedule::handle_schedule_command;
use cmd_scheduler::handle_scheduler_command;

/// Initialize tracing with console and file output.
///
/// Application logs go to `<log_dir>/jobkeeper.<date>.log` with daily
/// rotation; per-job execution logs are kept separately by the log sink.
fn init_tracing(log_dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("jobkeeper")
        .filename_suffix("log")
        .max_log_files(30)
        .build(log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Dropping the guard stops the background writer.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(true),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, source, warnings) = app::load_config(cli.config.as_deref())?;
    init_tracing(&config.logging.directory_path())?;
    app::report_config(source.as_deref(), &warnings);

    let manager = app::build_manager(&config).await?;

    match cli.command {
        Commands::Scheduler { action } => {
            let interval = Duration::from_secs(config.scheduler.interval_secs);
            handle_scheduler_command(action, manager, interval).await
        }
        Commands::Job { action } => handle_job_command(action, &manager).await,
        Commands::Schedule { action } => handle_schedule_command(action, &manager).await,
    }
}
