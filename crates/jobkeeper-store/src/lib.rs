//! # Jobkeeper Store
//!
//! Storage backends for the job manager.
//!
//! ## Backends
//!
//! - In-memory stores for tests and ephemeral runs
//! - File stores: one JSON document per job/schedule, one JSON-lines
//!   file per job log

pub mod codec;
pub mod job_store;
pub mod log_sink;
pub mod schedule_store;

mod fs_util;

pub use codec::JsonCodec;
pub use job_store::{FileJobStore, MemoryJobStore};
pub use log_sink::{FileLogSink, MemoryLogSink};
pub use schedule_store::{FileScheduleStore, MemoryScheduleStore};
