//! `job` commands

use serde_json::json;
use std::time::Duration;
use tableauctl_core::JobFinishCode;
use tracing::info;

use crate::cli::{Cli, JobCommands};
use crate::connection::ConnectionManager;
use crate::error::{CliError, Result};
use crate::output;

pub async fn handle_job_command(
    cli: &Cli,
    job_cmd: &JobCommands,
    conn_mgr: &ConnectionManager,
) -> Result<()> {
    match job_cmd {
        JobCommands::Status { id } => handle_status(cli, conn_mgr, id).await,
        JobCommands::Wait {
            id,
            target,
            interval,
        } => handle_wait(cli, conn_mgr, id, *target, Duration::from_secs(*interval)).await,
    }
}

async fn handle_status(cli: &Cli, conn_mgr: &ConnectionManager, job_id: &str) -> Result<()> {
    let mut hook = conn_mgr
        .create_hook(cli.conn_id.as_deref(), cli.site_id.as_deref())
        .await?;
    let status = hook
        .with_session(async |hook| hook.get_job_status(job_id).await)
        .await?;

    output::print_output(
        json!({
            "job_id": job_id,
            "status": status,
            "finish_code": status.code(),
        }),
        cli.output,
    )
}

async fn handle_wait(
    cli: &Cli,
    conn_mgr: &ConnectionManager,
    job_id: &str,
    target: JobFinishCode,
    interval: Duration,
) -> Result<()> {
    let mut hook = conn_mgr
        .create_hook(cli.conn_id.as_deref(), cli.site_id.as_deref())
        .await?;
    info!("Waiting for job {} to reach {}", job_id, target);

    let reached = hook
        .with_session(async |hook| hook.wait_for_state(job_id, target, interval).await)
        .await?;

    output::print_output(
        json!({
            "job_id": job_id,
            "target": target,
            "reached": reached,
        }),
        cli.output,
    )?;

    if reached {
        Ok(())
    } else {
        Err(CliError::TargetNotReached {
            job_id: job_id.to_string(),
            target: target.to_string(),
        })
    }
}
