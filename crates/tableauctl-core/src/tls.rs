//! TLS options for the HTTP client

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{HookError, Result};

/// Certificate verification setting
///
/// Connections may carry `verify` as a boolean, as a boolean-like string
/// (`"yes"`, `"off"`, ...) or as the path of a CA bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Verify {
    Bool(bool),
    CaBundle(String),
}

impl Default for Verify {
    fn default() -> Self {
        Verify::Bool(true)
    }
}

impl Verify {
    /// Run string values through [`parse_boolean`]
    pub fn normalize(self) -> Self {
        match self {
            Verify::CaBundle(raw) => parse_boolean(&raw),
            flag => flag,
        }
    }
}

/// Try to parse a string into a boolean
///
/// Matching is case-insensitive. Strings that do not look like a boolean are
/// returned lowercased in [`Verify::CaBundle`].
pub fn parse_boolean(val: &str) -> Verify {
    let val = val.to_lowercase();
    match val.as_str() {
        "y" | "yes" | "t" | "true" | "on" | "1" => Verify::Bool(true),
        "n" | "no" | "f" | "false" | "off" | "0" => Verify::Bool(false),
        _ => Verify::CaBundle(val),
    }
}

/// HTTP options applied when building the server client
#[derive(Debug, Clone, Default)]
pub struct HttpOptions {
    pub verify: Verify,
    /// PEM file with the client certificate and private key
    pub cert: Option<PathBuf>,
}

impl HttpOptions {
    pub(crate) fn apply(&self, builder: reqwest::ClientBuilder) -> Result<reqwest::ClientBuilder> {
        let mut builder = match &self.verify {
            Verify::Bool(true) => builder,
            Verify::Bool(false) => builder.danger_accept_invalid_certs(true),
            Verify::CaBundle(path) => {
                let pem = read_pem(Path::new(path))?;
                reqwest::Certificate::from_pem_bundle(&pem)?
                    .into_iter()
                    .fold(builder, |b, cert| b.add_root_certificate(cert))
            }
        };

        if let Some(cert) = &self.cert {
            let pem = read_pem(cert)?;
            builder = builder.identity(reqwest::Identity::from_pem(&pem)?);
        }

        Ok(builder)
    }
}

fn read_pem(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| HookError::File {
        path: path.display().to_string(),
        source,
    })
}
