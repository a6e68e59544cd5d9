//! Dropbox OAuth provider.
//!
//! [`DropboxAuth`] keeps the session alive from persisted tokens; the
//! network side of token exchange sits behind [`TokenRefresher`] so the
//! expiry and refresh policy can be tested without an HTTP server.

use std::future::Future;
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::token_store::{StoredAuth, TokenStore};
use super::{AuthError, AuthProvider};
use crate::clock::Clock;
use crate::storage::LocalStore;

const TOKEN_URL: &str = "https://api.dropboxapi.com/oauth2/token";
const AUTHORIZE_URL: &str = "https://www.dropbox.com/oauth2/authorize";

/// Response of the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,

    /// Only present on the initial code exchange.
    #[serde(default)]
    pub refresh_token: Option<String>,

    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Network side of the OAuth flow.
pub trait TokenRefresher: Send + Sync {
    /// Trade a refresh token for a fresh access token.
    fn refresh(&self, refresh_token: &str) -> impl Future<Output = Result<TokenGrant, AuthError>> + Send;

    /// Trade an authorization code for an access/refresh token pair.
    fn exchange_code(&self, code: &str) -> impl Future<Output = Result<TokenGrant, AuthError>> + Send;
}

/// Token endpoint client.
#[derive(Debug, Clone)]
pub struct DropboxOAuth {
    client: reqwest::Client,
    client_id: String,
    client_secret: Option<String>,
}

#[derive(Deserialize)]
struct OAuthErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl DropboxOAuth {
    /// # Errors
    ///
    /// Returns [`AuthError::MissingCredentials`] if `client_id` is empty.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: Option<String>,
        timeout: Duration,
    ) -> Result<Self, AuthError> {
        let client_id = client_id.into();
        if client_id.trim().is_empty() {
            return Err(AuthError::MissingCredentials(
                "DROPBOX_CLIENT_ID is not set".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Http(e.to_string()))?;

        Ok(Self {
            client,
            client_id,
            client_secret: client_secret.filter(|s| !s.is_empty()),
        })
    }

    /// URL the user opens to grant offline access.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingCredentials`] if the URL cannot be built.
    pub fn authorize_url(&self) -> Result<String, AuthError> {
        Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("token_access_type", "offline"),
            ],
        )
        .map(String::from)
        .map_err(|e| AuthError::MissingCredentials(e.to_string()))
    }

    async fn post_token(&self, params: &[(&str, &str)]) -> Result<TokenGrant, AuthError> {
        let mut form: Vec<(&str, &str)> = params.to_vec();
        form.push(("client_id", self.client_id.as_str()));
        if let Some(secret) = &self.client_secret {
            form.push(("client_secret", secret.as_str()));
        }

        let response = self
            .client
            .post(TOKEN_URL)
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::Http(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<TokenGrant>()
                .await
                .map_err(|e| AuthError::Http(e.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        if status.is_client_error() {
            let reason = serde_json::from_str::<OAuthErrorBody>(&body).map_or(body, |e| {
                e.error_description.map_or(e.error.clone(), |d| format!("{}: {d}", e.error))
            });
            Err(AuthError::Rejected(reason))
        } else {
            Err(AuthError::Http(format!("{status}: {body}")))
        }
    }
}

impl TokenRefresher for DropboxOAuth {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, AuthError> {
        self.post_token(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, AuthError> {
        self.post_token(&[("grant_type", "authorization_code"), ("code", code)])
            .await
    }
}

/// [`AuthProvider`] over persisted Dropbox tokens.
#[derive(Debug, Clone)]
pub struct DropboxAuth<S: LocalStore, T: TokenRefresher> {
    tokens: TokenStore<S>,
    refresher: T,
    clock: Clock,
}

impl<S: LocalStore, T: TokenRefresher> DropboxAuth<S, T> {
    #[must_use]
    pub fn new(tokens: TokenStore<S>, refresher: T, clock: Clock) -> Self {
        Self {
            tokens,
            refresher,
            clock,
        }
    }

    /// The underlying token store.
    #[must_use]
    pub fn tokens(&self) -> &TokenStore<S> {
        &self.tokens
    }

    /// The token endpoint client.
    #[must_use]
    pub fn refresher(&self) -> &T {
        &self.refresher
    }

    /// Store a refresh token obtained out of band and use it immediately.
    ///
    /// # Errors
    ///
    /// Returns the refresher's error if the token is rejected.
    pub async fn login_with_refresh_token(&self, refresh_token: &str) -> Result<(), AuthError> {
        let grant = self.refresher.refresh(refresh_token).await?;
        self.persist(grant, Some(refresh_token))
    }

    /// Complete the code flow with an authorization code.
    ///
    /// # Errors
    ///
    /// Returns the refresher's error if the code is rejected, or
    /// [`AuthError::NoRefreshToken`] if the grant carries no refresh token.
    pub async fn login_with_code(&self, code: &str) -> Result<(), AuthError> {
        let grant = self.refresher.exchange_code(code).await?;
        if grant.refresh_token.is_none() {
            return Err(AuthError::NoRefreshToken);
        }
        self.persist(grant, None)
    }

    fn persist(&self, grant: TokenGrant, previous_refresh: Option<&str>) -> Result<(), AuthError> {
        let refresh_token = grant
            .refresh_token
            .or_else(|| previous_refresh.map(str::to_string))
            .ok_or(AuthError::NoRefreshToken)?;
        let auth = StoredAuth {
            access_token: grant.access_token,
            refresh_token,
        };
        self.tokens
            .store(&auth, self.clock.now())
            .map(|_| ())
            .map_err(|e| AuthError::Storage(e.to_string()))
    }

    fn stored(&self) -> Option<StoredAuth> {
        match self.tokens.load() {
            Ok(auth) => auth,
            Err(e) => {
                warn!(error = %e, "Unreadable auth state");
                None
            }
        }
    }
}

impl<S: LocalStore, T: TokenRefresher> AuthProvider for DropboxAuth<S, T> {
    async fn initialize(&self) -> Result<(), AuthError> {
        // Expired credentials are kept: their refresh token is still usable.
        match self.tokens.load() {
            Ok(Some(_)) => {
                debug!(valid = self.is_authenticated(), "Loaded stored auth");
                Ok(())
            }
            Ok(None) => {
                debug!("No stored auth");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Discarding malformed auth state");
                self.clear_auth();
                Err(AuthError::Storage(e.to_string()))
            }
        }
    }

    async fn authenticate(&self) -> bool {
        if self.is_authenticated() {
            return true;
        }
        if self.stored().is_some() {
            info!("Stored token expired, refreshing");
            return self.refresh_token().await;
        }
        debug!("No credentials to authenticate with");
        false
    }

    async fn refresh_token(&self) -> bool {
        let Some(current) = self.stored() else {
            return false;
        };

        match self.refresher.refresh(&current.refresh_token).await {
            Ok(grant) => match self.persist(grant, Some(&current.refresh_token)) {
                Ok(()) => {
                    info!("Access token refreshed");
                    true
                }
                Err(e) => {
                    warn!(error = %e, "Could not persist refreshed token");
                    false
                }
            },
            Err(e) => {
                warn!(error = %e, "Token refresh failed");
                self.clear_auth();
                false
            }
        }
    }

    fn is_authenticated(&self) -> bool {
        self.tokens.is_valid_at(self.clock.now())
    }

    fn clear_auth(&self) {
        if let Err(e) = self.tokens.clear() {
            warn!(error = %e, "Failed to clear auth state");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DAY_MS: i64 = 24 * 60 * 60 * 1000;

    #[derive(Default)]
    struct FakeRefresher {
        calls: AtomicUsize,
        reject: bool,
    }

    impl TokenRefresher for FakeRefresher {
        async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, AuthError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.reject {
                return Err(AuthError::Rejected("invalid_grant".into()));
            }
            Ok(TokenGrant {
                access_token: format!("access-{n}-{refresh_token}"),
                refresh_token: None,
                expires_in: Some(14_400),
            })
        }

        async fn exchange_code(&self, code: &str) -> Result<TokenGrant, AuthError> {
            Ok(TokenGrant {
                access_token: format!("access-{code}"),
                refresh_token: Some(format!("refresh-{code}")),
                expires_in: None,
            })
        }
    }

    fn provider(reject: bool, now: i64) -> DropboxAuth<Arc<MemoryStorage>, FakeRefresher> {
        DropboxAuth::new(
            TokenStore::new(Arc::new(MemoryStorage::new())),
            FakeRefresher {
                reject,
                ..Default::default()
            },
            Clock::fixed(now),
        )
    }

    fn seed(auth: &DropboxAuth<Arc<MemoryStorage>, FakeRefresher>, stored_at: i64) {
        auth.tokens
            .store(
                &StoredAuth {
                    access_token: "old".into(),
                    refresh_token: "r1".into(),
                },
                stored_at,
            )
            .unwrap();
    }

    #[tokio::test]
    async fn test_valid_token_needs_no_refresh() {
        let auth = provider(false, 1_000);
        seed(&auth, 1_000);

        auth.initialize().await.unwrap();
        assert!(auth.is_authenticated());
        assert!(auth.authenticate().await);
        assert_eq!(auth.refresher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_expired_token_refreshes_before_use() {
        let auth = provider(false, 20 * DAY_MS);
        seed(&auth, 0);

        auth.initialize().await.unwrap();
        assert!(!auth.is_authenticated());
        assert!(auth.authenticate().await);
        assert_eq!(auth.refresher.calls.load(Ordering::SeqCst), 1);

        let stored = auth.tokens.load().unwrap().unwrap();
        assert_eq!(stored.access_token, "access-0-r1");
        assert_eq!(stored.refresh_token, "r1");
        assert!(auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_rejected_refresh_clears_auth() {
        let auth = provider(true, 20 * DAY_MS);
        seed(&auth, 0);

        assert!(!auth.authenticate().await);
        assert_eq!(auth.tokens.load().unwrap(), None);
        assert!(!auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_no_credentials_is_unauthenticated() {
        let auth = provider(false, 0);
        auth.initialize().await.unwrap();
        assert!(!auth.authenticate().await);
        assert!(!auth.refresh_token().await);
        assert_eq!(auth.refresher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_login_with_code_persists_both_tokens() {
        let auth = provider(false, 5);
        auth.login_with_code("abc").await.unwrap();

        let stored = auth.tokens.load().unwrap().unwrap();
        assert_eq!(stored.access_token, "access-abc");
        assert_eq!(stored.refresh_token, "refresh-abc");
        assert_eq!(auth.tokens.expiry().unwrap(), Some(5 + 15 * DAY_MS));
    }

    #[test]
    fn test_authorize_url_requests_offline_access() {
        let oauth = DropboxOAuth::new("app-key", None, Duration::from_secs(5)).unwrap();
        let url = oauth.authorize_url().unwrap();
        assert!(url.starts_with(AUTHORIZE_URL));
        assert!(url.contains("client_id=app-key"));
        assert!(url.contains("token_access_type=offline"));
    }

    #[test]
    fn test_missing_client_id_is_rejected() {
        let err = DropboxOAuth::new("  ", None, Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, AuthError::MissingCredentials(_)));
    }
}
