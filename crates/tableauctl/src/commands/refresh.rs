//! `refresh` command

use serde_json::json;
use std::time::Duration;
use tableauctl_core::{RefreshOperator, RefreshTarget};

use crate::cli::Cli;
use crate::connection::ConnectionManager;
use crate::error::Result;
use crate::output;

pub async fn handle_refresh(
    cli: &Cli,
    conn_mgr: &ConnectionManager,
    target: RefreshTarget,
    id: &str,
    wait: bool,
    interval: u64,
) -> Result<()> {
    let operator = RefreshOperator::new(target, id)
        .blocking(wait)
        .check_interval(Duration::from_secs(interval));

    let mut hook = conn_mgr
        .create_hook(cli.conn_id.as_deref(), cli.site_id.as_deref())
        .await?;
    let job_id = hook
        .with_session(async |hook| operator.execute(hook).await)
        .await?;

    output::print_output(
        json!({
            "target": target.to_string(),
            "id": id,
            "job_id": job_id,
            "completed": wait,
        }),
        cli.output,
    )
}
