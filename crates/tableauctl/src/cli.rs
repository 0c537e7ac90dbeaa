//! CLI structure and command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tableauctl_core::{JobFinishCode, RefreshTarget};

/// Tableau Server command-line client
#[derive(Parser, Debug)]
#[command(name = "tableauctl")]
#[command(version, about = "Tableau Server CLI for listings, jobs and extract refreshes")]
#[command(long_about = "
Tableau Server CLI for listings, jobs and extract refreshes

Every server command signs in with the selected connection, runs, and signs
out again.

EXAMPLES:
    # Register a connection with username and password
    tableauctl connection set prod --host https://tableau.example.com \\
        --login admin --password secret --site-id finance

    # List all workbooks on the site
    tableauctl list workbooks

    # Check a background job
    tableauctl job status 5b3f3c2e-0d11-4c43-9f55-8a1d2b7e9f10

    # Refresh a data source extract and wait for it to finish
    tableauctl refresh datasource 9a8b7c6d --wait --interval 10

For more help on a specific command, run:
    tableauctl <command> --help
")]
pub struct Cli {
    /// Connection id to use
    #[arg(long, short = 'c', global = true, env = "TABLEAUCTL_CONN_ID")]
    pub conn_id: Option<String>,

    /// Site content URL, overriding the connection's site_id
    #[arg(long, global = true)]
    pub site_id: Option<String>,

    /// Path to alternate configuration file
    #[arg(long, global = true, env = "TABLEAUCTL_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "json")]
    pub output: OutputFormat,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// One compact JSON document per line
    Jsonl,
    /// YAML output
    Yaml,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every item of a resource, page by page
    #[command(visible_alias = "ls")]
    #[command(after_help = "RESOURCES:
    jobs, workbooks, datasources, views, projects, users, groups, flows, schedules")]
    List {
        /// Resource name, e.g. workbooks
        resource: String,

        /// Items requested per page
        #[arg(long, default_value_t = 100)]
        page_size: u32,
    },

    /// Background job commands
    #[command(subcommand)]
    Job(JobCommands),

    /// Trigger an extract refresh
    Refresh {
        #[arg(value_enum)]
        target: RefreshTarget,

        /// Workbook or data source LUID
        id: String,

        /// Wait until the refresh job has finished
        #[arg(long)]
        wait: bool,

        /// Seconds between job checks while waiting
        #[arg(long, default_value_t = 20)]
        interval: u64,
    },

    /// Connection registry management
    #[command(subcommand, visible_alias = "conn")]
    Connection(ConnectionCommands),

    /// Show version information
    Version,
}

/// Background job commands
#[derive(Subcommand, Debug)]
pub enum JobCommands {
    /// Show the finish code of a job
    Status {
        /// Job id
        id: String,
    },

    /// Poll a job until it is no longer pending
    Wait {
        /// Job id
        id: String,

        /// State counted as success
        #[arg(long, value_enum, default_value = "success")]
        target: JobFinishCode,

        /// Seconds between checks
        #[arg(long, default_value_t = 20)]
        interval: u64,
    },
}

/// Connection registry commands
#[derive(Subcommand, Debug)]
pub enum ConnectionCommands {
    /// List configured connections
    #[command(visible_alias = "ls")]
    List,

    /// Show one connection with secrets masked
    Show {
        /// Connection id
        id: String,
    },

    /// Print the configuration file path
    Path,

    /// Create or update a connection
    ///
    /// The global --site-id is stored as the connection's default site.
    #[command(visible_alias = "add")]
    #[command(after_help = "EXAMPLES:
    # Password authentication
    tableauctl connection set prod --host https://tableau.example.com --login admin --password secret

    # JWT read from a file, private CA bundle
    tableauctl connection set cloud --host https://10ax.online.tableau.com \\
        --jwt-file ~/.tableau/token.jwt --verify /etc/ssl/corp-ca.pem")]
    Set {
        /// Connection id
        id: String,

        /// Server address
        #[arg(long)]
        host: String,

        #[arg(long)]
        login: Option<String>,

        #[arg(long)]
        password: Option<String>,

        /// Certificate verification: true/false or a CA bundle path
        #[arg(long)]
        verify: Option<String>,

        /// PEM file with client certificate and key
        #[arg(long)]
        cert: Option<PathBuf>,

        /// Read the JWT from this file (implies JWT authentication)
        #[arg(long, conflicts_with_all = ["jwt_token", "login", "password"])]
        jwt_file: Option<PathBuf>,

        /// Literal JWT (implies JWT authentication)
        #[arg(long, conflicts_with_all = ["login", "password"])]
        jwt_token: Option<String>,

        /// Store secrets in the OS keyring
        #[cfg(feature = "secure-storage")]
        #[arg(long)]
        use_keyring: bool,

        /// Make this the default connection
        #[arg(long)]
        default: bool,
    },

    /// Remove a connection
    #[command(visible_alias = "rm")]
    Remove {
        /// Connection id
        id: String,
    },

    /// Set the default connection
    Default {
        /// Connection id
        id: String,
    },
}
