//! # Jobkeeper Scheduler
//!
//! Turns due schedules into job executions.
//!
//! [`ScheduleProcessor`] performs a single pass over the due schedules;
//! [`SchedulerLoop`] repeats that pass on an interval, either a bounded
//! number of times or until shutdown.

pub mod driver;
pub mod processor;

pub use driver::SchedulerLoop;
pub use processor::{IterationReport, ScheduleProcessor};
