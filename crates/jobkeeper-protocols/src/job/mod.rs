//! Job entity, status state machine and responses.

mod definition;
mod response;
mod status;

pub use definition::{Job, JobUpdate, Ticket};
pub use response::{ExceptionResponse, JobResponse};
pub use status::JobStatus;
