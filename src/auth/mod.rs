//! Authentication capability.
//!
//! The sync core only needs to know whether it may talk to the remote and
//! how to recover from a rejected token:
//!
//! - [`AuthProvider`] - the capability the coordinator depends on
//! - [`TokenStore`] - persisted credential blob plus expiry timestamp
//! - [`DropboxAuth`] - provider backed by stored Dropbox OAuth tokens
//! - [`DropboxOAuth`] - token endpoint client (refresh, code exchange)
//!
//! The interactive consent step is not modeled; a refresh token or an
//! authorization code obtained in a browser is handed to `startsync auth
//! login`.

pub mod dropbox;
pub mod token_store;

pub use dropbox::{DropboxAuth, DropboxOAuth, TokenGrant, TokenRefresher};
pub use token_store::{AUTH_STATE_KEY, StoredAuth, TOKEN_EXPIRY_DAYS, TOKEN_EXPIRY_KEY, TokenStore};

use std::future::Future;

/// Authentication failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// App key/secret are not configured.
    #[error("missing client credentials: {0}")]
    MissingCredentials(String),

    /// The provider rejected the grant (expired or revoked refresh token,
    /// bad authorization code).
    #[error("grant rejected: {0}")]
    Rejected(String),

    /// The token endpoint could not be reached.
    #[error("token endpoint unreachable: {0}")]
    Http(String),

    /// Reading or writing persisted credentials failed.
    #[error("credential storage: {0}")]
    Storage(String),

    /// No usable refresh token is stored.
    #[error("no refresh token stored")]
    NoRefreshToken,
}

/// Authentication capability used by the sync coordinator.
pub trait AuthProvider: Send + Sync {
    /// Prepare the provider (load and validate persisted state).
    fn initialize(&self) -> impl Future<Output = Result<(), AuthError>> + Send;

    /// Establish an authenticated session, refreshing if the stored token
    /// has expired. Returns `false` when no session could be established.
    fn authenticate(&self) -> impl Future<Output = bool> + Send;

    /// Exchange the stored refresh token for a new access token.
    fn refresh_token(&self) -> impl Future<Output = bool> + Send;

    /// Whether an unexpired credential is stored.
    fn is_authenticated(&self) -> bool;

    /// Forget all stored credentials.
    fn clear_auth(&self);
}

impl<T: AuthProvider> AuthProvider for std::sync::Arc<T> {
    fn initialize(&self) -> impl Future<Output = Result<(), AuthError>> + Send {
        (**self).initialize()
    }

    fn authenticate(&self) -> impl Future<Output = bool> + Send {
        (**self).authenticate()
    }

    fn refresh_token(&self) -> impl Future<Output = bool> + Send {
        (**self).refresh_token()
    }

    fn is_authenticated(&self) -> bool {
        (**self).is_authenticated()
    }

    fn clear_auth(&self) {
        (**self).clear_auth();
    }
}

/// An unconfigured provider: never authenticates, so every mutation is
/// queued until credentials are configured.
impl<T: AuthProvider> AuthProvider for Option<T> {
    async fn initialize(&self) -> Result<(), AuthError> {
        match self {
            Some(inner) => inner.initialize().await,
            None => Err(AuthError::MissingCredentials(
                "no Dropbox app key configured".to_string(),
            )),
        }
    }

    async fn authenticate(&self) -> bool {
        match self {
            Some(inner) => inner.authenticate().await,
            None => false,
        }
    }

    async fn refresh_token(&self) -> bool {
        match self {
            Some(inner) => inner.refresh_token().await,
            None => false,
        }
    }

    fn is_authenticated(&self) -> bool {
        self.as_ref().is_some_and(AuthProvider::is_authenticated)
    }

    fn clear_auth(&self) {
        if let Some(inner) = self {
            inner.clear_auth();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeAuth;

    #[tokio::test]
    async fn test_unconfigured_provider_never_authenticates() {
        let auth: Option<FakeAuth> = None;
        assert!(matches!(
            auth.initialize().await,
            Err(AuthError::MissingCredentials(_))
        ));
        assert!(!auth.authenticate().await);
        assert!(!auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_configured_provider_delegates() {
        let auth = Some(FakeAuth::signed_in());
        assert!(auth.initialize().await.is_ok());
        assert!(auth.authenticate().await);
    }
}
