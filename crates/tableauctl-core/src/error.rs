//! Error handling for tableauctl-core
//!
//! Every fallible operation of the hook and the REST client returns
//! [`HookError`]. Nothing is retried; errors propagate to the caller.
//!
//! # Example
//!
//! ```rust
//! use tableauctl_core::HookError;
//!
//! let err = HookError::ResourceNotFound { name: "dashboards".to_string() };
//! assert_eq!(err.to_string(), "Resource name dashboards is not found.");
//! assert!(!err.is_config_error());
//! ```

use thiserror::Error;

use crate::config::ConfigError;

/// Core error type
#[derive(Error, Debug)]
pub enum HookError {
    /// Conflicting connection settings, e.g. two authentication methods
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed combination of connection parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// No supported authentication method is configured
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// `get_all` was asked for a resource the server does not expose
    #[error("Resource name {name} is not found.")]
    ResourceNotFound { name: String },

    /// The server reported a finish code outside the known set
    #[error("Unknown job finish code: {0}")]
    UnknownFinishCode(i64),

    /// A job ended in a state other than the one waited for
    #[error("Job {job_id} failed: {reason}")]
    JobFailed { job_id: String, reason: String },

    /// An endpoint needing a session was called before sign-in
    #[error("Not signed in to the server")]
    NotSignedIn,

    /// The connection host is not a usable URL
    #[error("Invalid host '{host}': {reason}")]
    InvalidHost { host: String, reason: String },

    /// A referenced file (JWT, certificate) could not be read
    #[error("Failed to read {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The server answered with a non-success status
    #[error("API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a body that could not be decoded
    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Connection registry failure
    #[error(transparent)]
    Registry(#[from] ConfigError),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, HookError>;

impl HookError {
    /// Returns true if this is a "not found" error (404)
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            HookError::Api { status, .. } => *status == 404,
            HookError::Http(e) => e.status().is_some_and(|s| s.as_u16() == 404),
            HookError::ResourceNotFound { .. } => true,
            _ => false,
        }
    }

    /// Returns true if this is an authentication/authorization error (401/403)
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        match self {
            HookError::Api { status, .. } => *status == 401 || *status == 403,
            HookError::NotSignedIn => true,
            _ => false,
        }
    }

    /// Returns true if the error comes from connection settings rather than
    /// the server
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            HookError::Config(_)
                | HookError::InvalidParameter(_)
                | HookError::NotImplemented(_)
                | HookError::InvalidHost { .. }
                | HookError::Registry(_)
        )
    }

    /// Returns true if this is a request timeout
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, HookError::Http(e) if e.is_timeout())
    }

    /// Build an API error from a failed response body
    ///
    /// The server reports failures as `{"error": {"code", "summary", "detail"}}`;
    /// anything else is kept verbatim.
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<crate::wire::ErrorEnvelope>(body) {
            Ok(envelope) => {
                let error = envelope.error;
                let message = match (error.summary, error.detail) {
                    (Some(summary), Some(detail)) => format!("{}: {}", summary, detail),
                    (Some(text), None) | (None, Some(text)) => text,
                    (None, None) => format!("request failed with status {}", status),
                };
                HookError::Api {
                    status,
                    code: error.code,
                    message,
                }
            }
            Err(_) => HookError::Api {
                status,
                code: None,
                message: if body.is_empty() {
                    format!("request failed with status {}", status)
                } else {
                    body.to_string()
                },
            },
        }
    }
}
