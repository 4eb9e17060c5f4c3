//! Schedule subcommand handlers.

use jobkeeper_core::JobManager;
use jobkeeper_protocols::Schedule;

use crate::app::parse_params;
use crate::cli::ScheduleAction;

/// Handle schedule subcommands.
pub(crate) async fn handle_schedule_command(
    action: ScheduleAction,
    manager: &JobManager,
) -> anyhow::Result<()> {
    match action {
        ScheduleAction::List => schedule_list(manager).await,
        ScheduleAction::Create {
            schedule_type,
            expression,
            job_type,
            params,
        } => schedule_create(manager, &schedule_type, &expression, &job_type, params.as_deref()).await,
    }
}

async fn schedule_list(manager: &JobManager) -> anyhow::Result<()> {
    let schedules = manager.schedules().find_all().await?;
    if schedules.is_empty() {
        println!("No schedules");
        return Ok(());
    }

    for schedule in schedules {
        let jobs = manager.find_by_schedule(&schedule.id).await?;
        let next = schedule
            .next_run_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "{}  {:<6} {:<20} next: {}  jobs: {}",
            schedule.id,
            schedule.schedule_type,
            schedule.expression,
            next,
            jobs.len()
        );
    }
    Ok(())
}

/// Register a schedule together with the job it drives.
async fn schedule_create(
    manager: &JobManager,
    schedule_type: &str,
    expression: &str,
    job_type: &str,
    params: Option<&str>,
) -> anyhow::Result<()> {
    let parameters = parse_params(params)?;
    let job = manager
        .add_job(job_type, parameters, Some(Schedule::new(schedule_type, expression)))
        .await?;

    println!("Ticket:   {}", job.ticket);
    if let Some(schedule_id) = job.schedule_id {
        println!("Schedule: {} ({} '{}')", schedule_id, schedule_type, expression);
    }
    Ok(())
}
