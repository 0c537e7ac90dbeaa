//! `list` command

use futures::TryStreamExt;
use tableauctl_core::Resource;
use tracing::{debug, info};

use crate::cli::{Cli, OutputFormat};
use crate::connection::ConnectionManager;
use crate::error::Result;
use crate::output;

pub async fn handle_list(
    cli: &Cli,
    conn_mgr: &ConnectionManager,
    resource: &str,
    page_size: u32,
) -> Result<()> {
    // Reject unknown names before touching the network
    let resource: Resource = resource.parse()?;
    let mut hook = conn_mgr
        .create_hook(cli.conn_id.as_deref(), cli.site_id.as_deref())
        .await?;
    let format = cli.output;

    let items = hook
        .with_session(async |hook| {
            let pager = hook.get_all(resource.name())?.with_page_size(page_size);
            match format {
                OutputFormat::Jsonl => {
                    let mut stream = pager.stream();
                    let mut count = 0usize;
                    while let Some(item) = stream.try_next().await? {
                        println!("{}", serde_json::to_string(&item)?);
                        count += 1;
                    }
                    debug!("Streamed {} {}", count, resource);
                    Ok(None)
                }
                _ => pager.collect_all().await.map(Some),
            }
        })
        .await?;

    if let Some(items) = items {
        info!("Fetched {} {}", items.len(), resource);
        output::print_output(&items, format)?;
    }
    Ok(())
}
