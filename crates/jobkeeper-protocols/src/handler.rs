//! Job handler trait.

use async_trait::async_trait;

use crate::context::ExecutionContext;
use crate::error::HandlerError;

/// Code executed for a job type.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// The job type this handler is registered under.
    fn job_type(&self) -> &str;

    /// Check the parameters at submission time.
    ///
    /// A rejection surfaces as a validation error from `add_job` and the
    /// job is never persisted.
    fn validate(&self, _parameters: &[serde_json::Value]) -> Result<(), String> {
        Ok(())
    }

    /// Run the job. The returned value becomes the job response;
    /// `Value::Null` means no response.
    async fn invoke(
        &self,
        parameters: &[serde_json::Value],
        ctx: &ExecutionContext,
    ) -> Result<serde_json::Value, HandlerError>;
}
