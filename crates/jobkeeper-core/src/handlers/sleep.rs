//! `sleep` handler.

use std::time::Duration;

use async_trait::async_trait;

use jobkeeper_protocols::{ExecutionContext, HandlerError, JobHandler};

/// Sleeps for the number of seconds given as first parameter and returns
/// that number.
pub struct SleepHandler;

impl SleepHandler {
    pub const JOB_TYPE: &'static str = "sleep";

    fn seconds(parameters: &[serde_json::Value]) -> Result<f64, String> {
        let value = parameters
            .first()
            .ok_or_else(|| "expected a number of seconds".to_string())?;
        match value.as_f64() {
            Some(secs) if secs.is_finite() && secs >= 0.0 => Ok(secs),
            _ => Err(format!("invalid number of seconds: {}", value)),
        }
    }
}

#[async_trait]
impl JobHandler for SleepHandler {
    fn job_type(&self) -> &str {
        Self::JOB_TYPE
    }

    fn validate(&self, parameters: &[serde_json::Value]) -> Result<(), String> {
        Self::seconds(parameters).map(|_| ())
    }

    async fn invoke(
        &self,
        parameters: &[serde_json::Value],
        ctx: &ExecutionContext,
    ) -> Result<serde_json::Value, HandlerError> {
        let secs = Self::seconds(parameters).map_err(HandlerError::msg)?;
        ctx.info(format!("sleeping for {}s", secs)).await?;
        tokio::time::sleep(Duration::from_secs_f64(secs)).await;
        Ok(parameters[0].clone())
    }
}
