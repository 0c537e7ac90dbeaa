use anyhow::Result;
use clap::Parser;
use tableauctl_core::Config;
use tracing::{debug, error, info, trace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod connection;
mod error;
mod output;

use cli::{Cli, Commands, ConnectionCommands};
use connection::ConnectionManager;
use error::CliError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level
    init_tracing(cli.verbose);

    if let Err(e) = execute_command(&cli).await {
        eprintln!("{}", e.display_with_suggestions());
        std::process::exit(1);
    }

    Ok(())
}

/// Load configuration from the specified path or the default location
fn load_connections(cli: &Cli) -> Result<ConnectionManager, CliError> {
    let (config, config_path) = if let Some(path) = &cli.config_file {
        debug!("Loading config from explicit path: {:?}", path);
        (Config::load_from_path(path)?, Some(path.clone()))
    } else {
        debug!("Loading config from default location");
        (Config::load()?, None)
    };
    Ok(ConnectionManager::with_config_path(config, config_path))
}

fn init_tracing(verbose: u8) {
    // Check for RUST_LOG env var first, then fall back to verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "tableauctl=warn,tableauctl_core=warn",
            1 => "tableauctl=info,tableauctl_core=info",
            2 => "tableauctl=debug,tableauctl_core=debug",
            _ => "tableauctl=trace,tableauctl_core=trace",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .init();

    debug!("Tracing initialized with verbosity level: {}", verbose);
}

async fn execute_command(cli: &Cli) -> Result<(), CliError> {
    trace!("Executing command: {:?}", cli.command);

    let start = std::time::Instant::now();
    let result = match &cli.command {
        Commands::Version => print_version(cli.output),

        // The path is known without reading the file
        Commands::Connection(ConnectionCommands::Path) => {
            let conn_mgr =
                ConnectionManager::with_config_path(Config::default(), cli.config_file.clone());
            commands::connection::handle_connection_command(
                &ConnectionCommands::Path,
                &conn_mgr,
                cli.site_id.as_deref(),
                cli.output,
            )
            .await
        }

        command => match load_connections(cli) {
            Ok(conn_mgr) => dispatch(cli, command, &conn_mgr).await,
            Err(e) => Err(e),
        },
    };

    let duration = start.elapsed();
    match &result {
        Ok(_) => info!("Command completed successfully in {:?}", duration),
        Err(e) => error!("Command failed after {:?}: {}", duration, e),
    }

    result
}

async fn dispatch(
    cli: &Cli,
    command: &Commands,
    conn_mgr: &ConnectionManager,
) -> Result<(), CliError> {
    match command {
        Commands::List {
            resource,
            page_size,
        } => commands::list::handle_list(cli, conn_mgr, resource, *page_size).await,

        Commands::Job(job_cmd) => commands::job::handle_job_command(cli, job_cmd, conn_mgr).await,

        Commands::Refresh {
            target,
            id,
            wait,
            interval,
        } => {
            commands::refresh::handle_refresh(cli, conn_mgr, *target, id, *wait, *interval).await
        }

        Commands::Connection(conn_cmd) => {
            debug!("Executing connection command");
            commands::connection::handle_connection_command(
                conn_cmd,
                conn_mgr,
                cli.site_id.as_deref(),
                cli.output,
            )
            .await
        }

        Commands::Version => print_version(cli.output),
    }
}

fn print_version(format: cli::OutputFormat) -> Result<(), CliError> {
    output::print_output(
        serde_json::json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
        }),
        format,
    )
}
