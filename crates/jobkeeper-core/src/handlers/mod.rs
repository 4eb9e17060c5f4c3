//! Built-in job handlers.

mod log;
mod sleep;

pub use log::LogHandler;
pub use sleep::SleepHandler;

use std::sync::Arc;

use jobkeeper_protocols::JobError;

use crate::registry::HandlerRegistry;

/// Register the built-in handlers.
pub fn register_defaults(registry: &HandlerRegistry) -> Result<(), JobError> {
    registry.register(Arc::new(LogHandler))?;
    registry.register(Arc::new(SleepHandler))?;
    Ok(())
}
