//! Error types for tableauctl

use tableauctl_core::{ConfigError, HookError};
use thiserror::Error;

/// Main error type for the tableauctl application
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Hook(#[from] HookError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Job {job_id} finished without reaching {target}")]
    TargetNotReached { job_id: String, target: String },

    #[error("Output formatting error: {message}")]
    OutputError { message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;

impl CliError {
    /// Hints printed below the error message
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            CliError::Config(ConfigError::ConnectionNotFound { .. })
            | CliError::Hook(HookError::Registry(ConfigError::ConnectionNotFound { .. })) => vec![
                "List connections with: tableauctl connection list".to_string(),
                "Add one with: tableauctl connection set <id> --host <url> ...".to_string(),
            ],
            CliError::Hook(HookError::NotImplemented(_)) => vec![
                "Set --login and --password, or --jwt-file / --jwt-token on the connection"
                    .to_string(),
            ],
            CliError::Hook(HookError::ResourceNotFound { .. }) => vec![format!(
                "Known resources: {}",
                tableauctl_core::Resource::ALL.map(|r| r.name()).join(", ")
            )],
            CliError::Hook(e) if e.is_unauthorized() => {
                vec!["Check the connection's credentials and site id".to_string()]
            }
            _ => Vec::new(),
        }
    }

    /// Message followed by any suggestions, one per line
    pub fn display_with_suggestions(&self) -> String {
        let mut output = format!("Error: {}", self);
        for suggestion in self.suggestions() {
            output.push_str("\n  ");
            output.push_str(&suggestion);
        }
        output
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::OutputError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(err: serde_yaml::Error) -> Self {
        CliError::OutputError {
            message: err.to_string(),
        }
    }
}
