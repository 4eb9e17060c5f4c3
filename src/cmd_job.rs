//! Job subcommand handlers.

use anyhow::anyhow;

use jobkeeper_core::JobManager;
use jobkeeper_protocols::{Job, JobResponse, JobStatus, Ticket};

use crate::app::parse_params;
use crate::cli::JobAction;

/// Handle job subcommands.
pub(crate) async fn handle_job_command(action: JobAction, manager: &JobManager) -> anyhow::Result<()> {
    match action {
        JobAction::Add { job_type, params } => job_add(manager, &job_type, params.as_deref()).await,
        JobAction::Get { ticket } => job_get(manager, &ticket).await,
        JobAction::Logs { ticket } => job_logs(manager, &ticket).await,
        JobAction::Cancel { ticket } => job_cancel(manager, &ticket).await,
        JobAction::List { status } => job_list(manager, status.as_deref()).await,
        JobAction::Delete { ticket } => job_delete(manager, &ticket).await,
    }
}

async fn job_add(manager: &JobManager, job_type: &str, params: Option<&str>) -> anyhow::Result<()> {
    let parameters = parse_params(params)?;
    let job = manager.add_job(job_type, parameters, None).await?;

    // Background jobs must finish before the process exits.
    manager.wait_idle().await;
    let job = manager.get(&job.ticket).await?;

    print_job(&job);
    Ok(())
}

async fn job_get(manager: &JobManager, ticket: &Ticket) -> anyhow::Result<()> {
    let job = manager.get(ticket).await?;
    println!("{}", serde_json::to_string_pretty(&job)?);
    Ok(())
}

async fn job_logs(manager: &JobManager, ticket: &Ticket) -> anyhow::Result<()> {
    let records = manager.get_logs(ticket).await?;
    if records.is_empty() {
        println!("No log records for {}", ticket);
        return Ok(());
    }
    for record in records {
        println!(
            "{} [{}] {}",
            record.timestamp.to_rfc3339(),
            record.level.as_str(),
            record.message
        );
    }
    Ok(())
}

async fn job_cancel(manager: &JobManager, ticket: &Ticket) -> anyhow::Result<()> {
    let job = manager.cancel_job(ticket).await?;
    println!("Cancelled {} ({})", job.ticket, job.job_type);
    Ok(())
}

async fn job_list(manager: &JobManager, status: Option<&str>) -> anyhow::Result<()> {
    let jobs = match status {
        Some(status) => {
            let status: JobStatus = status.parse().map_err(|e: String| anyhow!(e))?;
            manager.find_by_status(status).await?
        }
        None => manager.find_all().await?,
    };

    if jobs.is_empty() {
        println!("No jobs");
        return Ok(());
    }
    for job in jobs {
        println!(
            "{}  {:<10} {}  {}",
            job.ticket,
            job.status.as_str(),
            job.created_at.format("%Y-%m-%d %H:%M:%S"),
            job.job_type
        );
    }
    Ok(())
}

async fn job_delete(manager: &JobManager, ticket: &Ticket) -> anyhow::Result<()> {
    manager.delete_job(ticket).await?;
    println!("Deleted {}", ticket);
    Ok(())
}

fn print_job(job: &Job) {
    println!("Ticket:   {}", job.ticket);
    println!("Type:     {}", job.job_type);
    println!("Status:   {}", job.status);
    if let Some(schedule_id) = job.schedule_id {
        println!("Schedule: {}", schedule_id);
    }
    match &job.response {
        Some(JobResponse::Exception(e)) => println!("Error:    {} (code {})", e.message, e.code),
        Some(JobResponse::Value(value)) => println!("Response: {}", value),
        None => {}
    }
}
