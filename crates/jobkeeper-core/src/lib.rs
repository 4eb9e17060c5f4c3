//! # Jobkeeper Core
//!
//! Job manager and execution pipeline.
//!
//! ## Components
//!
//! - [`JobManager`] - Submission, lookup, cancellation and scheduled runs
//! - [`JobExecutor`] - Runs a handler and records the outcome
//! - [`HandlerRegistry`] - Job type to handler lookup
//! - [`EventDispatcher`] - Pre/post execution listeners with a timeout
//! - [`ScheduleManager`] - Schedule kinds and schedule persistence
//! - [`WorkerPool`] - Bounded background execution

pub mod events;
pub mod executor;
pub mod handlers;
pub mod listener;
pub mod logger;
pub mod manager;
pub mod pool;
pub mod registry;
pub mod schedule;

pub use events::{EventDispatcher, ExecutionEvent, ExecutionListener};
pub use executor::JobExecutor;
pub use listener::JobListener;
pub use logger::{JobLogger, LoggerFactory};
pub use manager::{JobManager, JobManagerBuilder};
pub use pool::{ExecutionMode, WorkerPool};
pub use registry::HandlerRegistry;
pub use schedule::{CronKind, ScheduleKind, ScheduleManager};
