//! `log` handler.

use async_trait::async_trait;

use jobkeeper_protocols::{ExecutionContext, HandlerError, JobHandler};

/// Writes each parameter to the job log at info level.
///
/// String parameters are logged verbatim, anything else as JSON.
pub struct LogHandler;

impl LogHandler {
    pub const JOB_TYPE: &'static str = "log";
}

#[async_trait]
impl JobHandler for LogHandler {
    fn job_type(&self) -> &str {
        Self::JOB_TYPE
    }

    async fn invoke(
        &self,
        parameters: &[serde_json::Value],
        ctx: &ExecutionContext,
    ) -> Result<serde_json::Value, HandlerError> {
        for parameter in parameters {
            let message = match parameter {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            ctx.info(message).await?;
        }
        Ok(serde_json::Value::Null)
    }
}
