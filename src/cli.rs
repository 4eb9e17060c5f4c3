//! CLI definitions for jobkeeper.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uuid::Uuid;

/// jobkeeper CLI.
#[derive(Parser)]
#[command(name = "jobkeeper")]
#[command(about = "Job execution and scheduling manager")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (default: config/jobkeeper.toml if present)
    #[arg(short, long, global = true, env = "JOBKEEPER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Schedule processing
    Scheduler {
        #[command(subcommand)]
        action: SchedulerAction,
    },

    /// Job management
    Job {
        #[command(subcommand)]
        action: JobAction,
    },

    /// Schedule management
    Schedule {
        #[command(subcommand)]
        action: ScheduleAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum SchedulerAction {
    /// Run a fixed number of scheduler iterations and exit
    Process {
        /// Number of iterations
        #[arg(long, default_value_t = 1)]
        iteration: u32,

        /// Seconds between iterations (default: scheduler.interval_secs)
        #[arg(long)]
        interval_secs: Option<u64>,
    },

    /// Run the scheduler until interrupted
    Run {
        /// Seconds between iterations (default: scheduler.interval_secs)
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

#[derive(Subcommand)]
pub(crate) enum JobAction {
    /// Submit a job
    Add {
        /// Job type
        job_type: String,

        /// Parameters as a JSON array (a single JSON value is one parameter)
        params: Option<String>,
    },

    /// Show a job
    Get {
        /// Job ticket
        ticket: Uuid,
    },

    /// Show the execution log of a job
    Logs {
        /// Job ticket
        ticket: Uuid,
    },

    /// Cancel a requested or sleeping job
    Cancel {
        /// Job ticket
        ticket: Uuid,
    },

    /// List jobs
    List {
        /// Only jobs in this status (e.g. requested, sleeping)
        #[arg(long)]
        status: Option<String>,
    },

    /// Delete a finished job and its log
    Delete {
        /// Job ticket
        ticket: Uuid,
    },
}

#[derive(Subcommand)]
pub(crate) enum ScheduleAction {
    /// List schedules
    List,

    /// Create a schedule driving a new job
    Create {
        /// Schedule type (e.g. cron)
        schedule_type: String,

        /// Schedule expression (e.g. "*/5 * * * *")
        expression: String,

        /// Type of the job the schedule runs
        #[arg(long = "job")]
        job_type: String,

        /// Job parameters as a JSON array
        #[arg(long)]
        params: Option<String>,
    },
}
