//! Scheduler subcommand handlers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::info;

use jobkeeper_core::JobManager;
use jobkeeper_scheduler::{IterationReport, ScheduleProcessor, SchedulerLoop};

use crate::cli::SchedulerAction;

/// Handle scheduler subcommands.
pub(crate) async fn handle_scheduler_command(
    action: SchedulerAction,
    manager: JobManager,
    default_interval: Duration,
) -> anyhow::Result<()> {
    match action {
        SchedulerAction::Process {
            iteration,
            interval_secs,
        } => {
            let interval = interval_secs.map(Duration::from_secs).unwrap_or(default_interval);
            scheduler_process(manager, iteration, interval).await
        }
        SchedulerAction::Run { interval_secs } => {
            let interval = interval_secs.map(Duration::from_secs).unwrap_or(default_interval);
            scheduler_run(manager, interval).await
        }
    }
}

async fn scheduler_process(
    manager: JobManager,
    iterations: u32,
    interval: Duration,
) -> anyhow::Result<()> {
    let driver = SchedulerLoop::new(ScheduleProcessor::new(manager.clone())).with_interval(interval);
    let report = driver.run_iterations(iterations).await?;
    manager.wait_idle().await;

    print_report(iterations, &report);
    Ok(())
}

async fn scheduler_run(manager: JobManager, interval: Duration) -> anyhow::Result<()> {
    let driver = Arc::new(
        SchedulerLoop::new(ScheduleProcessor::new(manager.clone())).with_interval(interval),
    );
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(driver.run(shutdown_rx));

    tokio::signal::ctrl_c().await?;
    info!("Interrupt received, stopping scheduler");
    let _ = shutdown_tx.send(true);

    handle.await?;
    manager.wait_idle().await;
    Ok(())
}

fn print_report(iterations: u32, report: &IterationReport) {
    println!("Iterations:         {}", iterations);
    println!("Due schedules:      {}", report.due);
    println!("Jobs executed:      {}", report.executed.len());
    println!("  processed:        {}", report.processed);
    println!("  sleeping:         {}", report.sleeping);
    println!("  failed:           {}", report.failed);
    println!("Schedules updated:  {}", report.updated_schedules.len());
    println!("Schedules removed:  {}", report.removed_schedules.len());
    if report.exhausted > 0 {
        println!("Exhausted schedules: {}", report.exhausted);
    }
    if report.orphaned > 0 {
        println!("Orphaned schedules: {}", report.orphaned);
    }
    if report.skipped > 0 {
        println!("Skipped jobs:       {}", report.skipped);
    }
}
