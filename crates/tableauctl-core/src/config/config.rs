//! Connection registry for Tableau Server
//!
//! Connections are stored in TOML format, keyed by connection id. A connection
//! can also be supplied whole through a `TABLEAU_CONN_<ID>` environment
//! variable holding a JSON descriptor, which wins over the file.

#[cfg(target_os = "macos")]
use directories::BaseDirs;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::credential::CredentialStore;
use super::error::{ConfigError, Result};
use crate::tls::Verify;

/// Connection id used when none is given
pub const DEFAULT_CONN_ID: &str = "tableau_default";

/// Prefix of environment variables carrying a JSON connection descriptor
const ENV_CONN_PREFIX: &str = "TABLEAU_CONN_";

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    /// Connection used when no id is given explicitly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_connection: Option<String>,
    /// Map of connection id -> connection descriptor
    #[serde(default)]
    pub connections: HashMap<String, Connection>,
}

/// A single Tableau Server connection descriptor
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Connection {
    /// Server address, e.g. `https://tableau.example.com`
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    /// Plaintext password or `keyring:<key>` reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub extra: ConnectionExtra,
}

/// Free-form options attached to a connection
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ConnectionExtra {
    /// Site content URL to sign in to; empty means the default site
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<String>,
    /// TLS verification: a boolean, a boolean-like string, or a CA bundle path
    #[serde(default)]
    pub verify: Verify,
    /// PEM file holding a client certificate and key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert: Option<PathBuf>,
    /// Authentication mode; only `"jwt"` has a meaning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
    /// File to read the JWT from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt_file: Option<PathBuf>,
    /// Literal JWT, or `keyring:<key>` reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt_token: Option<String>,
    /// Keys this crate does not interpret
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

impl Connection {
    /// Create a connection for `host` with no credentials
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            login: None,
            password: None,
            extra: ConnectionExtra::default(),
        }
    }

    /// Whether extra selects token authentication
    pub fn uses_jwt(&self) -> bool {
        self.extra.auth.as_deref() == Some("jwt")
    }

    /// Password with keyring references resolved
    pub fn resolve_password(&self) -> Result<Option<String>> {
        self.password
            .as_deref()
            .map(|p| {
                CredentialStore::new().get_credential(p).map_err(|e| {
                    ConfigError::CredentialError(format!("Failed to resolve password: {}", e))
                })
            })
            .transpose()
    }

    /// Literal JWT with keyring references resolved
    pub fn resolve_jwt_token(&self) -> Result<Option<String>> {
        self.extra
            .jwt_token
            .as_deref()
            .map(|t| {
                CredentialStore::new().get_credential(t).map_err(|e| {
                    ConfigError::CredentialError(format!("Failed to resolve JWT token: {}", e))
                })
            })
            .transpose()
    }

    /// Copy of this connection with secrets masked, for display
    pub fn redacted(&self) -> Self {
        let mask = |v: &String| {
            if CredentialStore::is_keyring_reference(v) {
                v.clone()
            } else {
                "***".to_string()
            }
        };
        let mut copy = self.clone();
        copy.password = self.password.as_ref().map(mask);
        copy.extra.jwt_token = self.extra.jwt_token.as_ref().map(mask);
        copy
    }
}

impl Config {
    /// Environment variable that overrides connection `conn_id`
    pub fn env_var_name(conn_id: &str) -> String {
        format!(
            "{}{}",
            ENV_CONN_PREFIX,
            conn_id.to_uppercase().replace(['-', '.'], "_")
        )
    }

    /// Pick the connection id to use: explicit, then configured default, then
    /// [`DEFAULT_CONN_ID`]
    pub fn resolve_connection_id(&self, explicit: Option<&str>) -> String {
        explicit
            .or(self.default_connection.as_deref())
            .unwrap_or(DEFAULT_CONN_ID)
            .to_string()
    }

    /// Look up a connection, checking the environment before the file
    pub fn get_connection(&self, conn_id: &str) -> Result<Connection> {
        let var = Self::env_var_name(conn_id);
        if let Ok(raw) = std::env::var(&var) {
            debug!("Using connection '{}' from {}", conn_id, var);
            return serde_json::from_str(&raw)
                .map_err(|source| ConfigError::InvalidEnvConnection { var, source });
        }

        self.connections
            .get(conn_id)
            .cloned()
            .ok_or_else(|| ConfigError::ConnectionNotFound {
                name: conn_id.to_string(),
            })
    }

    /// Load configuration from the standard location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::LoadError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        let expanded_content = Self::expand_env_vars(&content);

        let config: Config = toml::from_str(&expanded_content)?;

        Ok(config)
    }

    /// Save configuration to the standard location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to_path(&config_path)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::SaveError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(config_path, content).map_err(|e| ConfigError::SaveError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        Ok(())
    }

    /// Set or update a connection
    pub fn set_connection(&mut self, conn_id: String, connection: Connection) {
        self.connections.insert(conn_id, connection);
    }

    /// Remove a connection, clearing the default if it pointed there
    pub fn remove_connection(&mut self, conn_id: &str) -> Option<Connection> {
        if self.default_connection.as_deref() == Some(conn_id) {
            self.default_connection = None;
        }
        self.connections.remove(conn_id)
    }

    /// List all connections sorted by id
    pub fn list_connections(&self) -> Vec<(&String, &Connection)> {
        let mut connections: Vec<_> = self.connections.iter().collect();
        connections.sort_by_key(|(id, _)| *id);
        connections
    }

    /// Get the path to the configuration file
    ///
    /// On macOS, `~/.config/tableauctl/config.toml` is preferred when it (or its
    /// directory) exists, falling back to the platform location.
    ///
    /// On Linux: ~/.config/tableauctl/config.toml
    /// On Windows: %APPDATA%\tableau\tableauctl\config.toml
    pub fn config_path() -> Result<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            if let Some(base_dirs) = BaseDirs::new() {
                let linux_style_path = base_dirs
                    .home_dir()
                    .join(".config")
                    .join("tableauctl")
                    .join("config.toml");

                if linux_style_path.exists()
                    || linux_style_path
                        .parent()
                        .map(|p| p.exists())
                        .unwrap_or(false)
                {
                    return Ok(linux_style_path);
                }
            }
        }

        let proj_dirs = ProjectDirs::from("com", "tableau", "tableauctl")
            .ok_or(ConfigError::ConfigDirError)?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Expand `${VAR}` and `${VAR:-default}` references in config content
    ///
    /// Unset variables without a default are left as-is.
    fn expand_env_vars(content: &str) -> String {
        shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok())
            .to_string()
    }
}
