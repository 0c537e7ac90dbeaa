//! Connection management for Tableau Server hooks

use anyhow::Context;
use std::path::PathBuf;
use tableauctl_core::{Config, TableauHook};
use tracing::{debug, info};

use crate::error::Result as CliResult;

/// Resolves connections from the registry and builds hooks for them
#[derive(Clone)]
pub struct ConnectionManager {
    pub config: Config,
    pub config_path: Option<PathBuf>,
}

impl ConnectionManager {
    /// Create a connection manager with a custom config path
    pub fn with_config_path(config: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// Path the configuration is read from and saved to
    pub fn config_path(&self) -> CliResult<PathBuf> {
        match &self.config_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Config::config_path()?),
        }
    }

    /// Save the configuration to the appropriate location
    pub fn save_config(&self) -> CliResult<()> {
        if let Some(ref path) = self.config_path {
            self.config
                .save_to_path(path)
                .context("Failed to save configuration")?;
        } else {
            self.config.save().context("Failed to save configuration")?;
        }
        Ok(())
    }

    /// Connection id for this invocation: flag, then registry default, then
    /// `tableau_default`
    pub fn resolve_conn_id(&self, explicit: Option<&str>) -> String {
        self.config.resolve_connection_id(explicit)
    }

    /// Build a hook for the selected connection; does not sign in
    pub async fn create_hook(
        &self,
        conn_id: Option<&str>,
        site_id: Option<&str>,
    ) -> CliResult<TableauHook> {
        let conn_id = self.resolve_conn_id(conn_id);
        info!("Using connection: {}", conn_id);
        debug!("Site override: {:?}", site_id);

        let hook = TableauHook::from_registry(&self.config, site_id, &conn_id).await?;
        Ok(hook)
    }
}
