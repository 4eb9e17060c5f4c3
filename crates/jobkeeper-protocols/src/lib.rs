//! # Jobkeeper Protocols
//!
//! Data model and protocol definitions (traits) for the jobkeeper
//! job manager. Contains interface definitions and plain data types only.
//!
//! ## Core Traits
//!
//! - [`JobHandler`] - Code executed for a job type
//! - [`JobStore`] - Job persistence with compare-and-set transitions
//! - [`ScheduleStore`] - Schedule persistence
//! - [`LogSink`] - Per-job execution log storage
//! - [`Codec`] - Storage representation of JSON values
//! - [`JobControl`] - Reentrant manager handle available to handlers

pub mod codec;
pub mod context;
pub mod control;
pub mod error;
pub mod handler;
pub mod job;
pub mod log;
pub mod schedule;
pub mod store;

pub use codec::Codec;
pub use context::{ExecutionContext, ScheduleDirective};
pub use control::{JobControl, JobLog};
pub use error::{HandlerError, JobError, StoreError};
pub use handler::JobHandler;
pub use job::{ExceptionResponse, Job, JobResponse, JobStatus, JobUpdate, Ticket};
pub use log::{LogLevel, LogRecord};
pub use schedule::{Schedule, ScheduleId};
pub use store::{JobStore, LogSink, ScheduleStore};
