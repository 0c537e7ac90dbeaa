//! # tableauctl-core
//!
//! Connector library for Tableau Server and Tableau Cloud.
//!
//! The crate resolves named connections from a local registry, signs in with
//! either a username and password or a JSON Web Token, lists server content
//! page by page and polls background jobs until they finish.
//!
//! ## Crate Structure
//!
//! ```text
//! tableauctl-core/
//! ├── src/
//! │   ├── lib.rs
//! │   ├── config/          # Connection registry and credential storage
//! │   ├── error.rs         # HookError
//! │   ├── hook.rs          # TableauHook: sign-in, listing, job polling
//! │   ├── job.rs           # Job records and finish codes
//! │   ├── operator.rs      # Extract refresh
//! │   ├── pager.rs         # Lazy paginated listing
//! │   ├── resource.rs      # Listable resources
//! │   ├── sensor.rs        # One-shot job status check
//! │   ├── server.rs        # REST client
//! │   ├── session.rs       # Signed-in session handle
//! │   └── tls.rs           # Certificate verification options
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use futures::TryStreamExt;
//! use tableauctl_core::{DEFAULT_CONN_ID, TableauHook};
//!
//! let mut hook = TableauHook::new(None, DEFAULT_CONN_ID).await?;
//! let workbooks = hook
//!     .with_session(async |hook| hook.get_all("workbooks")?.collect_all().await)
//!     .await?;
//! ```

pub mod config;
pub mod error;
pub mod hook;
pub mod job;
pub mod operator;
pub mod pager;
pub mod resource;
pub mod sensor;
pub mod server;
pub mod session;
pub mod tls;
mod wire;

pub use config::{Config, ConfigError, Connection, ConnectionExtra, CredentialStore};
pub use error::{HookError, Result};
pub use hook::{DEFAULT_CONN_ID, TableauHook};
pub use job::{Job, JobFinishCode};
pub use operator::{RefreshOperator, RefreshTarget};
pub use pager::Pager;
pub use resource::Resource;
pub use sensor::JobStatusSensor;
pub use server::{AuthMethod, TableauServer};
pub use session::Session;
pub use tls::{HttpOptions, Verify, parse_boolean};
pub use wire::{ProductVersion, ServerInfo};
