//! Minimal REST client for Tableau Server
//!
//! Covers the calls the hook needs: version negotiation, sign-in and
//! sign-out, paginated listing, job lookup and extract refresh. All requests
//! and responses use the JSON flavour of the API.

use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::error::{HookError, Result};
use crate::job::Job;
use crate::operator::RefreshTarget;
use crate::resource::Resource;
use crate::tls::HttpOptions;
use crate::wire::{
    JobEnvelope, Pagination, ServerInfo, ServerInfoEnvelope, SignInCredentials, SignInEnvelope,
    SignInRequest, SiteRef,
};

/// API version used until [`TableauServer::use_server_version`] negotiates one
pub const DEFAULT_API_VERSION: &str = "3.4";

/// Items requested per page when listing
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Oldest API version that serves `/serverinfo`
const SERVER_INFO_VERSION: &str = "2.4";

const AUTH_HEADER: &str = "X-Tableau-Auth";

const USER_AGENT: &str = concat!("tableauctl/", env!("CARGO_PKG_VERSION"));

/// How to sign in
pub enum AuthMethod {
    /// Username and password
    Password {
        username: String,
        password: String,
        site: String,
    },
    /// A JSON Web Token issued for a connected app
    Jwt { token: String, site: String },
}

impl AuthMethod {
    /// Site content URL to sign in to
    pub fn site(&self) -> &str {
        match self {
            AuthMethod::Password { site, .. } | AuthMethod::Jwt { site, .. } => site,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AuthMethod::Password { .. } => "password",
            AuthMethod::Jwt { .. } => "jwt",
        }
    }
}

impl fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMethod::Password { username, site, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("site", site)
                .finish_non_exhaustive(),
            AuthMethod::Jwt { site, .. } => f
                .debug_struct("Jwt")
                .field("site", site)
                .finish_non_exhaustive(),
        }
    }
}

/// Credentials token and identifiers returned by sign-in
#[derive(Clone, PartialEq, Eq)]
pub struct AuthState {
    pub token: String,
    /// Site LUID used in request paths
    pub site_id: String,
    pub site_content_url: String,
    pub user_id: Option<String>,
}

impl fmt::Debug for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthState")
            .field("site_id", &self.site_id)
            .field("site_content_url", &self.site_content_url)
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

/// One page of a listing
#[derive(Debug, Clone)]
pub struct Page {
    pub items: Vec<Value>,
    pub page_number: u32,
    pub page_size: u32,
    /// Total item count across all pages, when the server reports it
    pub total_available: Option<u64>,
}

#[derive(Debug)]
struct ServerState {
    version: String,
    auth: Option<AuthState>,
}

/// Handle to a Tableau Server
///
/// Cloning is cheap; clones share the negotiated version and the session.
#[derive(Clone)]
pub struct TableauServer {
    http: reqwest::Client,
    base_url: String,
    state: Arc<RwLock<ServerState>>,
}

impl fmt::Debug for TableauServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableauServer")
            .field("base_url", &self.base_url)
            .field("version", &self.version())
            .field("signed_in", &self.is_signed_in())
            .finish()
    }
}

impl TableauServer {
    /// Create a client for `host` with the given TLS options
    ///
    /// A host without a scheme is treated as `https://`.
    pub fn new(host: &str, options: &HttpOptions) -> Result<Self> {
        let base_url = normalize_host(host)?;
        let builder = reqwest::Client::builder().user_agent(USER_AGENT);
        let http = options.apply(builder)?.build()?;

        debug!("Created Tableau client for {}", base_url);
        Ok(Self {
            http,
            base_url,
            state: Arc::new(RwLock::new(ServerState {
                version: DEFAULT_API_VERSION.to_string(),
                auth: None,
            })),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// REST API version used for requests
    pub fn version(&self) -> String {
        self.state().version.clone()
    }

    pub fn set_version(&self, version: impl Into<String>) {
        self.state_mut().version = version.into();
    }

    pub fn is_signed_in(&self) -> bool {
        self.state().auth.is_some()
    }

    /// Current session, if signed in
    pub fn auth_state(&self) -> Option<AuthState> {
        self.state().auth.clone()
    }

    /// Fetch product and API version information
    pub async fn server_info(&self) -> Result<ServerInfo> {
        let url = format!("{}/api/{}/serverinfo", self.base_url, SERVER_INFO_VERSION);
        let response = self.send(self.http.get(&url)).await?;
        let envelope: ServerInfoEnvelope = read_json(response).await?;
        Ok(envelope.server_info)
    }

    /// Adopt the highest API version the server supports
    ///
    /// Any failure to read `/serverinfo` keeps the current version.
    pub async fn use_server_version(&self) -> String {
        match self.server_info().await {
            Ok(info) => {
                info!(
                    "Server {} speaks REST API {}",
                    self.base_url, info.rest_api_version
                );
                self.set_version(info.rest_api_version.clone());
                info.rest_api_version
            }
            Err(e) => {
                let version = self.version();
                warn!(
                    "Could not determine server version, using API {}: {}",
                    version, e
                );
                version
            }
        }
    }

    /// Sign in and remember the session for later requests
    pub async fn sign_in(&self, method: &AuthMethod) -> Result<AuthState> {
        let credentials = match method {
            AuthMethod::Password {
                username,
                password,
                site,
            } => SignInCredentials {
                name: Some(username.as_str()),
                password: Some(password.as_str()),
                jwt: None,
                site: SiteRef { content_url: site },
            },
            AuthMethod::Jwt { token, site } => SignInCredentials {
                name: None,
                password: None,
                jwt: Some(token.as_str()),
                site: SiteRef { content_url: site },
            },
        };

        info!(
            "Signing in to {} with {} authentication (site '{}')",
            self.base_url,
            method.kind(),
            method.site()
        );
        let url = self.api_url("auth/signin");
        let response = self
            .send(self.http.post(&url).json(&SignInRequest { credentials }))
            .await?;
        let envelope: SignInEnvelope = read_json(response).await?;

        let result = envelope.credentials;
        let auth = AuthState {
            token: result.token,
            site_id: result.site.id,
            site_content_url: result
                .site
                .content_url
                .unwrap_or_else(|| method.site().to_string()),
            user_id: result.user.map(|u| u.id),
        };
        debug!("Signed in, site LUID {}", auth.site_id);

        self.state_mut().auth = Some(auth.clone());
        Ok(auth)
    }

    /// Sign out of the current session; a no-op when not signed in
    pub async fn sign_out(&self) -> Result<()> {
        let auth = { self.state_mut().auth.take() };
        let Some(auth) = auth else {
            debug!("No active session to sign out of");
            return Ok(());
        };

        let url = self.api_url("auth/signout");
        self.send(self.http.post(&url).header(AUTH_HEADER, &auth.token))
            .await?;
        info!("Signed out of {}", self.base_url);
        Ok(())
    }

    /// Sign out only if `token` is still the active session
    pub(crate) async fn release(&self, token: &str) -> Result<()> {
        let active = { self.state().auth.as_ref().is_some_and(|a| a.token == token) };
        if active {
            self.sign_out().await
        } else {
            Ok(())
        }
    }

    /// Fetch one page of `resource`
    pub async fn list_page(
        &self,
        resource: Resource,
        page_number: u32,
        page_size: u32,
    ) -> Result<Page> {
        let auth = self.require_auth()?;
        let path = if resource.is_site_scoped() {
            format!("sites/{}/{}", auth.site_id, resource.name())
        } else {
            resource.name().to_string()
        };
        let url = format!(
            "{}?pageSize={}&pageNumber={}",
            self.api_url(&path),
            page_size,
            page_number
        );

        debug!("Listing {} page {}", resource, page_number);
        let response = self
            .send(self.http.get(&url).header(AUTH_HEADER, &auth.token))
            .await?;
        let mut body: Value = read_json(response).await?;

        let pagination: Pagination = match body.get_mut("pagination").map(Value::take) {
            Some(raw) => serde_json::from_value(raw)?,
            None => Pagination::default(),
        };

        let (outer, inner) = resource.collection_keys();
        let items = match body
            .get_mut(outer)
            .and_then(|c| c.get_mut(inner))
            .map(Value::take)
        {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => Vec::new(),
            Some(single) => vec![single],
        };
        trace!("{} page {}: {} items", resource, page_number, items.len());

        Ok(Page {
            items,
            page_number: pagination.page_number.unwrap_or(page_number),
            page_size: pagination.page_size.unwrap_or(page_size),
            total_available: pagination.total_available,
        })
    }

    /// Fetch a job record by id
    pub async fn get_job(&self, job_id: &str) -> Result<Job> {
        let auth = self.require_auth()?;
        let url = self.api_url(&format!(
            "sites/{}/jobs/{}",
            auth.site_id,
            urlencoding::encode(job_id)
        ));

        let response = self
            .send(self.http.get(&url).header(AUTH_HEADER, &auth.token))
            .await?;
        let envelope: JobEnvelope = read_json(response).await?;
        trace!("Job {}: {:?}", job_id, envelope.job);
        Ok(envelope.job)
    }

    /// Start an extract refresh and return the job it created
    pub async fn refresh(&self, target: RefreshTarget, id: &str) -> Result<Job> {
        let auth = self.require_auth()?;
        let url = self.api_url(&format!(
            "sites/{}/{}/{}/refresh",
            auth.site_id,
            target.path(),
            urlencoding::encode(id)
        ));

        info!("Refreshing {} {}", target, id);
        let response = self
            .send(
                self.http
                    .post(&url)
                    .header(AUTH_HEADER, &auth.token)
                    .json(&serde_json::json!({})),
            )
            .await?;
        let envelope: JobEnvelope = read_json(response).await?;
        Ok(envelope.job)
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}/{}", self.base_url, self.version(), path)
    }

    fn require_auth(&self) -> Result<AuthState> {
        self.auth_state().ok_or(HookError::NotSignedIn)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request.header(ACCEPT, "application/json").send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!("Request failed with {}: {}", status, body);
        Err(HookError::from_response(status.as_u16(), &body))
    }

    fn state(&self) -> RwLockReadGuard<'_, ServerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&self) -> RwLockWriteGuard<'_, ServerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn normalize_host(host: &str) -> Result<String> {
    let invalid = |reason: String| HookError::InvalidHost {
        host: host.to_string(),
        reason,
    };

    let trimmed = host.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(invalid("host is empty".to_string()));
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    let url = Url::parse(&candidate).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_host() {
        assert_eq!(
            normalize_host("https://tableau.example.com/").unwrap(),
            "https://tableau.example.com"
        );
        assert_eq!(
            normalize_host("tableau.example.com").unwrap(),
            "https://tableau.example.com"
        );
        assert_eq!(
            normalize_host("http://127.0.0.1:8080").unwrap(),
            "http://127.0.0.1:8080"
        );
        assert_eq!(
            normalize_host("https://example.com/tableau").unwrap(),
            "https://example.com/tableau"
        );
    }

    #[test]
    fn test_normalize_host_rejects_garbage() {
        assert!(matches!(
            normalize_host("  "),
            Err(HookError::InvalidHost { .. })
        ));
        assert!(matches!(
            normalize_host("ftp://files.example.com"),
            Err(HookError::InvalidHost { .. })
        ));
    }

    #[test]
    fn test_new_client_defaults() {
        let server = TableauServer::new("https://tableau.example.com", &HttpOptions::default())
            .unwrap();
        assert_eq!(server.version(), DEFAULT_API_VERSION);
        assert!(!server.is_signed_in());

        let clone = server.clone();
        clone.set_version("3.19");
        assert_eq!(server.version(), "3.19");
    }

    #[test]
    fn test_auth_method_debug_hides_secrets() {
        let method = AuthMethod::Password {
            username: "admin".to_string(),
            password: "hunter2".to_string(),
            site: "marketing".to_string(),
        };
        let shown = format!("{:?}", method);
        assert!(shown.contains("admin"));
        assert!(!shown.contains("hunter2"));
        assert_eq!(method.kind(), "password");
        assert_eq!(method.site(), "marketing");
    }

    #[tokio::test]
    async fn test_list_requires_sign_in() {
        let server = TableauServer::new("https://tableau.example.com", &HttpOptions::default())
            .unwrap();
        let err = server.list_page(Resource::Workbooks, 1, 10).await.unwrap_err();
        assert!(matches!(err, HookError::NotSignedIn));
    }
}
