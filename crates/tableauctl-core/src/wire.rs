//! JSON shapes exchanged with the REST API

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Deserialize a number the server may send either as a number or a string
pub(crate) fn lenient_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
    T::Err: Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
        Num(T),
        Str(String),
    }

    match Option::<Raw<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Num(n)) => Ok(Some(n)),
        Some(Raw::Str(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Str(s)) => s.trim().parse().map(Some).map_err(de::Error::custom),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

/// Server product and REST API versions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    #[serde(default)]
    pub product_version: Option<ProductVersion>,
    pub rest_api_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductVersion {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub build: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ServerInfoEnvelope {
    pub server_info: ServerInfo,
}

#[derive(Debug, Serialize)]
pub(crate) struct SignInRequest<'a> {
    pub credentials: SignInCredentials<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SignInCredentials<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwt: Option<&'a str>,
    pub site: SiteRef<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SiteRef<'a> {
    pub content_url: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SignInEnvelope {
    pub credentials: SignInResult,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SignInResult {
    pub token: String,
    pub site: SiteResult,
    #[serde(default)]
    pub user: Option<IdRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SiteResult {
    pub id: String,
    #[serde(default)]
    pub content_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IdRef {
    pub id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Pagination {
    #[serde(default, deserialize_with = "lenient_number")]
    pub page_number: Option<u32>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub page_size: Option<u32>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_available: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobEnvelope {
    pub job: crate::job::Job,
}
