//! The Tableau hook: sign-in, resource listing and job polling
//!
//! A hook owns one [`TableauServer`] client and at most one live [`Session`].
//! Use [`TableauHook::with_session`] to bracket work between sign-in and
//! sign-out.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use tableauctl_core::{JobFinishCode, TableauHook};
//!
//! let mut hook = TableauHook::new(None, "tableau_default").await?;
//! let done = hook
//!     .with_session(async |hook| {
//!         hook.wait_for_state("job-id", JobFinishCode::Success, Duration::from_secs(20))
//!             .await
//!     })
//!     .await?;
//! ```

use std::fs;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{Config, Connection};
use crate::error::{HookError, Result};
use crate::job::JobFinishCode;
use crate::pager::Pager;
use crate::resource::Resource;
use crate::server::{AuthMethod, TableauServer};
use crate::session::Session;
use crate::tls::HttpOptions;

pub use crate::config::DEFAULT_CONN_ID;

/// Connects to a Tableau Server and communicates with it
pub struct TableauHook {
    conn_id: String,
    connection: Connection,
    site_id: String,
    server: TableauServer,
    session: Option<Session>,
}

impl std::fmt::Debug for TableauHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableauHook")
            .field("conn_id", &self.conn_id)
            .field("site_id", &self.site_id)
            .field("server", &self.server)
            .field("session", &self.session)
            .finish()
    }
}

impl TableauHook {
    /// Create a hook for `conn_id` from the default connection registry
    ///
    /// `site_id` overrides the site configured on the connection; without
    /// either, the server's default site is used.
    pub async fn new(site_id: Option<&str>, conn_id: &str) -> Result<Self> {
        let config = Config::load()?;
        Self::from_registry(&config, site_id, conn_id).await
    }

    /// Create a hook for `conn_id` looked up in `config`
    pub async fn from_registry(
        config: &Config,
        site_id: Option<&str>,
        conn_id: &str,
    ) -> Result<Self> {
        let connection = config.get_connection(conn_id)?;
        Self::from_connection(connection, site_id, conn_id).await
    }

    /// Create a hook from an already resolved connection
    ///
    /// Builds the client with the connection's TLS options and negotiates the
    /// server's API version. Does not sign in.
    pub async fn from_connection(
        connection: Connection,
        site_id: Option<&str>,
        conn_id: &str,
    ) -> Result<Self> {
        let site_id = site_id
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| connection.extra.site_id.clone())
            .unwrap_or_default();

        let options = HttpOptions {
            verify: connection.extra.verify.clone().normalize(),
            cert: connection.extra.cert.clone(),
        };
        debug!(
            "Connecting '{}' to {} (verify: {:?})",
            conn_id, connection.host, options.verify
        );
        let server = TableauServer::new(&connection.host, &options)?;
        server.use_server_version().await;

        Ok(Self {
            conn_id: conn_id.to_string(),
            connection,
            site_id,
            server,
            session: None,
        })
    }

    pub fn conn_id(&self) -> &str {
        &self.conn_id
    }

    /// Site content URL this hook signs in to
    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn server(&self) -> &TableauServer {
        &self.server
    }

    /// Whether the hook currently holds a session
    pub fn is_open(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_active)
    }

    /// Sign in to the server with the connection's authentication method
    ///
    /// Exactly one method must be configured: login and password, or
    /// `auth = "jwt"` with exactly one of `jwt_file` / `jwt_token`.
    pub async fn get_conn(&self) -> Result<Session> {
        let method = select_auth_method(&self.connection, &self.site_id)?;
        let auth = self.server.sign_in(&method).await?;
        Ok(Session::new(self.server.clone(), auth))
    }

    /// Acquire a session if none is held
    pub async fn open(&mut self) -> Result<&mut Self> {
        if !self.is_open() {
            self.session = Some(self.get_conn().await?);
        }
        Ok(self)
    }

    /// Release the held session, if any
    pub async fn close(&mut self) -> Result<()> {
        match self.session.take() {
            Some(session) => session.sign_out().await,
            None => Ok(()),
        }
    }

    /// Run `f` between sign-in and sign-out
    ///
    /// The session is released whether `f` succeeds or fails. When both `f`
    /// and the sign-out fail, the error from `f` is returned.
    pub async fn with_session<T, F>(&mut self, f: F) -> Result<T>
    where
        F: AsyncFnOnce(&TableauHook) -> Result<T>,
    {
        self.open().await?;
        let result = f(&*self).await;
        let released = self.close().await;

        match (result, released) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(sign_out_err)) => {
                warn!("Sign-out failed after error: {}", sign_out_err);
                Err(e)
            }
        }
    }

    /// All items of the named resource, e.g. `"jobs"` or `"workbooks"`
    pub fn get_all(&self, resource_name: &str) -> Result<Pager> {
        let resource: Resource = resource_name.parse()?;
        Ok(Pager::new(self.server.clone(), resource))
    }

    /// Current finish code of a job
    pub async fn get_job_status(&self, job_id: &str) -> Result<JobFinishCode> {
        let job = self.server.get_job(job_id).await?;
        job.status()
    }

    /// Poll a job until it leaves `Pending` or reaches `target_state`
    ///
    /// Sleeps `check_interval` between checks. Returns whether the last
    /// observed code equals `target_state`. There is no upper bound on the
    /// number of polls.
    pub async fn wait_for_state(
        &self,
        job_id: &str,
        target_state: JobFinishCode,
        check_interval: Duration,
    ) -> Result<bool> {
        let mut finish_code = self.get_job_status(job_id).await?;
        while finish_code == JobFinishCode::Pending && finish_code != target_state {
            info!("job state: {}", finish_code);
            tokio::time::sleep(check_interval).await;
            finish_code = self.get_job_status(job_id).await?;
        }

        Ok(finish_code == target_state)
    }
}

/// Choose the sign-in method for `connection`
pub(crate) fn select_auth_method(connection: &Connection, site_id: &str) -> Result<AuthMethod> {
    let password = connection.resolve_password()?;
    let login = connection.login.as_deref().filter(|l| !l.is_empty());
    let password = password.filter(|p| !p.is_empty());
    let jwt_auth_set = connection.uses_jwt();

    match (login, password) {
        (Some(_), Some(_)) if jwt_auth_set => Err(HookError::Config(
            "Username/password authentication and JWT authentication cannot be used \
             simultaneously. Please specify only one authentication method."
                .to_string(),
        )),
        (Some(username), Some(password)) => Ok(AuthMethod::Password {
            username: username.to_string(),
            password,
            site: site_id.to_string(),
        }),
        _ if jwt_auth_set => {
            let token = read_jwt(connection)?;
            Ok(AuthMethod::Jwt {
                token,
                site: site_id.to_string(),
            })
        }
        _ => Err(HookError::NotImplemented(
            "No Authentication method found for given Credentials!".to_string(),
        )),
    }
}

/// Read the JWT from exactly one of `jwt_file` / `jwt_token`
fn read_jwt(connection: &Connection) -> Result<String> {
    let extra = &connection.extra;
    match (&extra.jwt_file, &extra.jwt_token) {
        (Some(path), None) => fs::read_to_string(path)
            .map(|token| token.trim().to_string())
            .map_err(|source| HookError::File {
                path: path.display().to_string(),
                source,
            }),
        (None, Some(_)) => Ok(connection.resolve_jwt_token()?.unwrap_or_default()),
        (file, _) => {
            let reason = if file.is_some() {
                "provided both."
            } else {
                "none of them provided."
            };
            Err(HookError::InvalidParameter(format!(
                "When auth set to 'jwt' then expected exactly one parameter 'jwt_file' or \
                 'jwt_token' in connection extra, but {}",
                reason
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn connection() -> Connection {
        Connection::new("https://tableau.example.com")
    }

    fn with_password(mut conn: Connection) -> Connection {
        conn.login = Some("admin".to_string());
        conn.password = Some("s3cret".to_string());
        conn
    }

    fn with_jwt(mut conn: Connection) -> Connection {
        conn.extra.auth = Some("jwt".to_string());
        conn
    }

    #[test]
    fn test_password_method() {
        let method = select_auth_method(&with_password(connection()), "marketing").unwrap();
        match method {
            AuthMethod::Password {
                username,
                password,
                site,
            } => {
                assert_eq!(username, "admin");
                assert_eq!(password, "s3cret");
                assert_eq!(site, "marketing");
            }
            other => panic!("expected password auth, got {other:?}"),
        }
    }

    #[test]
    fn test_both_methods_is_config_error() {
        let mut conn = with_jwt(with_password(connection()));
        conn.extra.jwt_token = Some("token".to_string());

        let err = select_auth_method(&conn, "").unwrap_err();
        assert!(matches!(err, HookError::Config(_)));
        assert!(err.to_string().contains("cannot be used simultaneously"));
    }

    #[test]
    fn test_jwt_token_method() {
        let mut conn = with_jwt(connection());
        conn.extra.jwt_token = Some("eyJhbGciOi".to_string());

        match select_auth_method(&conn, "").unwrap() {
            AuthMethod::Jwt { token, site } => {
                assert_eq!(token, "eyJhbGciOi");
                assert_eq!(site, "");
            }
            other => panic!("expected jwt auth, got {other:?}"),
        }
    }

    #[test]
    fn test_jwt_file_method() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "token-from-file").unwrap();

        let mut conn = with_jwt(connection());
        conn.extra.jwt_file = Some(file.path().to_path_buf());

        match select_auth_method(&conn, "site").unwrap() {
            AuthMethod::Jwt { token, .. } => assert_eq!(token, "token-from-file"),
            other => panic!("expected jwt auth, got {other:?}"),
        }
    }

    #[test]
    fn test_jwt_file_missing_is_file_error() {
        let mut conn = with_jwt(connection());
        conn.extra.jwt_file = Some("/nonexistent/tableauctl/token.jwt".into());

        let err = select_auth_method(&conn, "").unwrap_err();
        assert!(matches!(err, HookError::File { .. }));
    }

    #[test]
    fn test_jwt_both_parameters() {
        let mut conn = with_jwt(connection());
        conn.extra.jwt_file = Some("/tmp/token.jwt".into());
        conn.extra.jwt_token = Some("token".to_string());

        let err = select_auth_method(&conn, "").unwrap_err();
        assert!(matches!(err, HookError::InvalidParameter(_)));
        assert!(err.to_string().ends_with("provided both."));
    }

    #[test]
    fn test_jwt_no_parameters() {
        let err = select_auth_method(&with_jwt(connection()), "").unwrap_err();
        assert!(matches!(err, HookError::InvalidParameter(_)));
        assert!(err.to_string().ends_with("none of them provided."));
    }

    #[test]
    fn test_no_method_is_not_implemented() {
        let err = select_auth_method(&connection(), "").unwrap_err();
        assert!(matches!(err, HookError::NotImplemented(_)));

        // A login without a password is not enough
        let mut conn = connection();
        conn.login = Some("admin".to_string());
        let err = select_auth_method(&conn, "").unwrap_err();
        assert!(matches!(err, HookError::NotImplemented(_)));
    }

    #[test]
    fn test_other_auth_modes_are_ignored() {
        let mut conn = connection();
        conn.extra.auth = Some("pat".to_string());
        conn.extra.jwt_token = Some("token".to_string());

        let err = select_auth_method(&conn, "").unwrap_err();
        assert!(matches!(err, HookError::NotImplemented(_)));
    }
}
