//! Connection registry command implementations

use serde_json::json;
use std::path::PathBuf;
use tableauctl_core::config::{ConfigError, Connection};
use tableauctl_core::{CredentialStore, Verify, parse_boolean};
use tracing::{debug, info};

use crate::cli::{ConnectionCommands, OutputFormat};
use crate::connection::ConnectionManager;
use crate::error::{CliError, Result};
use crate::output;

/// Handle connection management commands
pub async fn handle_connection_command(
    conn_cmd: &ConnectionCommands,
    conn_mgr: &ConnectionManager,
    site_id: Option<&str>,
    output_format: OutputFormat,
) -> Result<()> {
    use ConnectionCommands::*;

    match conn_cmd {
        List => handle_list(conn_mgr, output_format),
        Show { id } => handle_show(conn_mgr, id, output_format),
        Path => handle_path(conn_mgr, output_format),
        Set {
            id,
            host,
            login,
            password,
            verify,
            cert,
            jwt_file,
            jwt_token,
            #[cfg(feature = "secure-storage")]
            use_keyring,
            default,
        } => {
            let args = SetArgs {
                host,
                login: login.as_deref(),
                password: password.as_deref(),
                site_id,
                verify: verify.as_deref(),
                cert: cert.as_ref(),
                jwt_file: jwt_file.as_ref(),
                jwt_token: jwt_token.as_deref(),
                #[cfg(feature = "secure-storage")]
                use_keyring: *use_keyring,
                #[cfg(not(feature = "secure-storage"))]
                use_keyring: false,
                default: *default,
            };
            handle_set(conn_mgr, id, args, output_format)
        }
        Remove { id } => handle_remove(conn_mgr, id, output_format),
        Default { id } => handle_default(conn_mgr, id, output_format),
    }
}

fn handle_list(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> Result<()> {
    let connections = conn_mgr.config.list_connections();
    debug!("Found {} connections", connections.len());
    let default = conn_mgr.config.default_connection.as_deref();

    let listed: Vec<_> = connections
        .iter()
        .map(|(id, conn)| {
            json!({
                "id": id,
                "host": conn.host,
                "site_id": conn.extra.site_id,
                "auth": if conn.uses_jwt() { "jwt" } else { "password" },
                "is_default": default == Some(id.as_str()),
            })
        })
        .collect();

    output::print_output(
        json!({
            "config_path": conn_mgr.config_path().ok(),
            "connections": listed,
            "count": listed.len(),
        }),
        output_format,
    )
}

fn handle_show(conn_mgr: &ConnectionManager, id: &str, output_format: OutputFormat) -> Result<()> {
    let connection = conn_mgr.config.get_connection(id)?;
    output::print_output(
        json!({
            "id": id,
            "is_default": conn_mgr.config.default_connection.as_deref() == Some(id),
            "connection": connection.redacted(),
        }),
        output_format,
    )
}

fn handle_path(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> Result<()> {
    let config_path = conn_mgr.config_path()?;
    match output_format {
        OutputFormat::Json | OutputFormat::Yaml => {
            output::print_output(json!({ "config_path": config_path }), output_format)
        }
        OutputFormat::Jsonl => {
            println!("{}", config_path.display());
            Ok(())
        }
    }
}

struct SetArgs<'a> {
    host: &'a str,
    login: Option<&'a str>,
    password: Option<&'a str>,
    site_id: Option<&'a str>,
    verify: Option<&'a str>,
    cert: Option<&'a PathBuf>,
    jwt_file: Option<&'a PathBuf>,
    jwt_token: Option<&'a str>,
    use_keyring: bool,
    default: bool,
}

fn handle_set(
    conn_mgr: &ConnectionManager,
    id: &str,
    args: SetArgs<'_>,
    output_format: OutputFormat,
) -> Result<()> {
    if args.login.is_some() != args.password.is_some() {
        return Err(CliError::InvalidInput {
            message: "--login and --password must be given together".to_string(),
        });
    }

    let store = if args.use_keyring {
        CredentialStore::new()
    } else {
        CredentialStore::plaintext()
    };
    let store_secret = |suffix: &str, value: &str| -> Result<String> {
        Ok(store.store_credential(&format!("{}-{}", id, suffix), value)?)
    };

    let mut connection = Connection::new(args.host);
    connection.login = args.login.map(str::to_string);
    connection.password = args
        .password
        .map(|p| store_secret("password", p))
        .transpose()?;
    connection.extra.site_id = args.site_id.map(str::to_string);
    connection.extra.verify = args.verify.map(parse_boolean).unwrap_or(Verify::Bool(true));
    connection.extra.cert = args.cert.cloned();
    if args.jwt_file.is_some() || args.jwt_token.is_some() {
        connection.extra.auth = Some("jwt".to_string());
        connection.extra.jwt_file = args.jwt_file.cloned();
        connection.extra.jwt_token = args
            .jwt_token
            .map(|t| store_secret("jwt", t))
            .transpose()?;
    }

    let mut conn_mgr = conn_mgr.clone();
    let replaced = conn_mgr.config.connections.contains_key(id);
    conn_mgr.config.set_connection(id.to_string(), connection);
    if args.default || conn_mgr.config.connections.len() == 1 {
        conn_mgr.config.default_connection = Some(id.to_string());
    }
    conn_mgr.save_config()?;

    info!(
        "{} connection '{}' ({} storage)",
        if replaced { "Updated" } else { "Added" },
        id,
        store.storage_backend()
    );
    output::print_output(
        json!({
            "id": id,
            "status": if replaced { "updated" } else { "added" },
            "is_default": conn_mgr.config.default_connection.as_deref() == Some(id),
        }),
        output_format,
    )
}

fn handle_remove(
    conn_mgr: &ConnectionManager,
    id: &str,
    output_format: OutputFormat,
) -> Result<()> {
    let mut conn_mgr = conn_mgr.clone();
    let removed = conn_mgr
        .config
        .remove_connection(id)
        .ok_or_else(|| ConfigError::ConnectionNotFound {
            name: id.to_string(),
        })?;

    let secrets: Vec<&str> = [removed.password.as_deref(), removed.extra.jwt_token.as_deref()]
        .into_iter()
        .flatten()
        .filter(|v| CredentialStore::is_keyring_reference(v))
        .collect();
    if !secrets.is_empty() {
        let store = CredentialStore::new();
        for secret in secrets {
            store.delete_credential(secret)?;
        }
    }
    conn_mgr.save_config()?;

    info!("Removed connection '{}'", id);
    output::print_output(json!({ "id": id, "status": "removed" }), output_format)
}

fn handle_default(
    conn_mgr: &ConnectionManager,
    id: &str,
    output_format: OutputFormat,
) -> Result<()> {
    if !conn_mgr.config.connections.contains_key(id) {
        return Err(ConfigError::ConnectionNotFound {
            name: id.to_string(),
        }
        .into());
    }

    let mut conn_mgr = conn_mgr.clone();
    conn_mgr.config.default_connection = Some(id.to_string());
    conn_mgr.save_config()?;

    output::print_output(json!({ "default_connection": id }), output_format)
}
