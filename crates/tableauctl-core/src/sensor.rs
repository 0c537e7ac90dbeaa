//! Single-shot job status check

use tracing::info;

use crate::error::{HookError, Result};
use crate::hook::TableauHook;
use crate::job::JobFinishCode;

/// Checks whether a job has finished successfully
#[derive(Debug, Clone)]
pub struct JobStatusSensor {
    job_id: String,
}

impl JobStatusSensor {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// `Ok(true)` once the job succeeded, `Ok(false)` while it is pending
    ///
    /// A job that failed or was canceled is reported as
    /// [`HookError::JobFailed`].
    pub async fn poke(&self, hook: &TableauHook) -> Result<bool> {
        let finish_code = hook.get_job_status(&self.job_id).await?;
        info!("Current finishCode is {} ({})", finish_code, finish_code.code());

        match finish_code {
            JobFinishCode::Error | JobFinishCode::Canceled => Err(HookError::JobFailed {
                job_id: self.job_id.clone(),
                reason: format!("job finished with {finish_code}"),
            }),
            code => Ok(code == JobFinishCode::Success),
        }
    }
}
