//! Signed-in session handle

use std::fmt;
use tracing::{debug, warn};

use crate::error::Result;
use crate::server::{AuthState, TableauServer};

/// An authenticated session on the server
///
/// Release it with [`sign_out`](Self::sign_out). A session dropped while still
/// open is signed out in the background on the current tokio runtime.
pub struct Session {
    server: TableauServer,
    auth: AuthState,
    open: bool,
}

impl Session {
    pub(crate) fn new(server: TableauServer, auth: AuthState) -> Self {
        Self {
            server,
            auth,
            open: true,
        }
    }

    /// Token sent as `X-Tableau-Auth`
    pub fn token(&self) -> &str {
        &self.auth.token
    }

    /// Site LUID
    pub fn site_id(&self) -> &str {
        &self.auth.site_id
    }

    pub fn site_content_url(&self) -> &str {
        &self.auth.site_content_url
    }

    pub fn user_id(&self) -> Option<&str> {
        self.auth.user_id.as_deref()
    }

    /// Whether this session is still the server's active one
    pub fn is_active(&self) -> bool {
        self.open
            && self
                .server
                .auth_state()
                .is_some_and(|a| a.token == self.auth.token)
    }

    /// Sign out and consume the handle
    pub async fn sign_out(mut self) -> Result<()> {
        self.open = false;
        self.server.release(&self.auth.token).await
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.is_active() {
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!("Session dropped while open, signing out in background");
                let server = self.server.clone();
                let token = std::mem::take(&mut self.auth.token);
                handle.spawn(async move {
                    if let Err(e) = server.release(&token).await {
                        warn!("Background sign-out failed: {}", e);
                    }
                });
            }
            Err(_) => warn!("Session dropped outside a tokio runtime; it was not signed out"),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("auth", &self.auth)
            .field("open", &self.open)
            .finish()
    }
}
