//! Connection registry for Tableau Server connections
//!
//! Named connections are kept in a TOML file and can be overridden per
//! connection through environment variables.
//!
//! # Features
//!
//! - Multiple named connections, with a configurable default
//! - Secure credential storage using OS keyring (optional)
//! - Environment variable expansion in config files
//! - Whole-connection overrides from `TABLEAU_CONN_<ID>` (JSON)
//! - Platform-specific config file locations

#[allow(clippy::module_inception)]
pub mod config;
pub mod credential;
pub mod error;

// Re-export main types for convenience
pub use config::{Config, Connection, ConnectionExtra, DEFAULT_CONN_ID};
pub use credential::{CredentialStorage, CredentialStore};
pub use error::{ConfigError, Result};
