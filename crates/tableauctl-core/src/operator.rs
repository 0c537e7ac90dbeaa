//! Extract refresh for workbooks and data sources

use std::fmt;
use std::time::Duration;
use tracing::info;

use crate::error::{HookError, Result};
use crate::hook::TableauHook;
use crate::job::JobFinishCode;

/// Default pause between job checks of a blocking refresh
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(20);

/// Content type whose extract can be refreshed
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RefreshTarget {
    Workbook,
    Datasource,
}

impl RefreshTarget {
    /// Collection segment in the refresh URL
    pub(crate) fn path(self) -> &'static str {
        match self {
            RefreshTarget::Workbook => "workbooks",
            RefreshTarget::Datasource => "datasources",
        }
    }
}

impl fmt::Display for RefreshTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshTarget::Workbook => f.write_str("workbook"),
            RefreshTarget::Datasource => f.write_str("datasource"),
        }
    }
}

/// Triggers an extract refresh and optionally waits for it
///
/// ```rust,ignore
/// let job_id = RefreshOperator::new(RefreshTarget::Workbook, "wb-luid")
///     .check_interval(Duration::from_secs(5))
///     .execute(&hook)
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct RefreshOperator {
    target: RefreshTarget,
    id: String,
    blocking_refresh: bool,
    check_interval: Duration,
}

impl RefreshOperator {
    pub fn new(target: RefreshTarget, id: impl Into<String>) -> Self {
        Self {
            target,
            id: id.into(),
            blocking_refresh: true,
            check_interval: DEFAULT_CHECK_INTERVAL,
        }
    }

    /// Wait for the refresh job to finish before returning
    pub fn blocking(mut self, blocking: bool) -> Self {
        self.blocking_refresh = blocking;
        self
    }

    pub fn check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    /// Start the refresh and return the id of the job it created
    ///
    /// The hook must hold a session.
    pub async fn execute(&self, hook: &TableauHook) -> Result<String> {
        let job = hook.server().refresh(self.target, &self.id).await?;
        info!("Started refresh job {} for {} {}", job.id, self.target, self.id);

        if self.blocking_refresh {
            let succeeded = hook
                .wait_for_state(&job.id, JobFinishCode::Success, self.check_interval)
                .await?;
            if !succeeded {
                return Err(HookError::JobFailed {
                    job_id: job.id,
                    reason: format!("The Tableau Refresh {} Job failed!", self.target),
                });
            }
            info!("Refresh job {} completed", job.id);
        }

        Ok(job.id)
    }
}
