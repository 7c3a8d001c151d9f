//! Connection parameters for remote operations
//!
//! Rebuilt from the configuration for every operation, since the token may
//! change between calls.

use crate::settings::SyncConfiguration;
use git2::{Cred, RemoteCallbacks};

/// Username sent alongside a token. Hosted git services ignore it and
/// authenticate on the password field.
pub const TOKEN_USERNAME: &str = "x-oauth-basic";

/// Resolved URL and credentials for one remote operation
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedTransport {
    /// Remote URL, prefixed by the CORS relay when one is configured
    pub effective_url: String,
    username: String,
    token: String,
}

impl std::fmt::Debug for ResolvedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedTransport")
            .field("effective_url", &self.effective_url)
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl ResolvedTransport {
    /// Build transport parameters from the configuration
    pub fn resolve(config: &SyncConfiguration) -> Self {
        if !config.cors_proxy_url.is_empty() {
            tracing::info!(proxy = %config.cors_proxy_url, "using CORS proxy");
        }

        Self {
            effective_url: effective_url(&config.remote_url, &config.cors_proxy_url),
            username: TOKEN_USERNAME.to_string(),
            token: config.access_token.clone(),
        }
    }

    /// The credential pair handed to the remote
    pub fn credentials(&self) -> (&str, &str) {
        (&self.username, &self.token)
    }

    /// Remote callbacks answering every credential request with the token
    pub fn remote_callbacks<'a>(&self) -> RemoteCallbacks<'a> {
        let username = self.username.clone();
        let token = self.token.clone();

        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(move |_url, _username_from_url, _allowed_types| {
            Cred::userpass_plaintext(&username, &token)
        });
        callbacks
    }
}

/// Rewrite a remote URL through an optional CORS relay
///
/// Trailing slashes on the relay are dropped so `https://relay/` and
/// `https://relay///` produce the same URL.
pub fn effective_url(remote_url: &str, cors_proxy_url: &str) -> String {
    if cors_proxy_url.is_empty() {
        return remote_url.to_string();
    }

    format!("{}/{}", cors_proxy_url.trim_end_matches('/'), remote_url)
}
