//! Error types for the jobkeeper protocol layer.

mod handler;
mod job;
mod store;

pub use handler::*;
pub use job::*;
pub use store::*;
