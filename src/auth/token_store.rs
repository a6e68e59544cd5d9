//! Persisted OAuth credentials.
//!
//! Two fixed keys in local storage: the credential blob (access and refresh
//! token as JSON) and its expiry in Unix milliseconds. The expiry horizon is
//! a fixed number of days from the last (re)authentication, independent of
//! the provider's own access-token lifetime.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::storage::LocalStore;

/// Local storage key of the credential blob.
pub const AUTH_STATE_KEY: &str = "dropbox_auth_state";

/// Local storage key of the expiry timestamp.
pub const TOKEN_EXPIRY_KEY: &str = "dropbox_token_expiry";

/// Days a stored credential is considered valid.
pub const TOKEN_EXPIRY_DAYS: i64 = 15;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Stored credential blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAuth {
    pub access_token: String,
    pub refresh_token: String,
}

/// Typed access to the two credential keys.
#[derive(Debug, Clone)]
pub struct TokenStore<S: LocalStore> {
    store: S,
}

impl<S: LocalStore> TokenStore<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Load the credential blob, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the blob is malformed.
    pub fn load(&self) -> Result<Option<StoredAuth>> {
        crate::storage::read_json(&self.store, AUTH_STATE_KEY)
    }

    /// Load the expiry timestamp, if any. An unparsable value reads as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn expiry(&self) -> Result<Option<i64>> {
        Ok(self
            .store
            .get_item(TOKEN_EXPIRY_KEY)?
            .and_then(|raw| raw.trim().parse().ok()))
    }

    /// Whether a credential is stored and its expiry lies after `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: i64) -> bool {
        let has_auth = matches!(self.load(), Ok(Some(_)));
        let expiry = self.expiry().ok().flatten();
        has_auth && expiry.is_some_and(|at| at > now)
    }

    /// Persist a credential and restart the expiry horizon from `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn store(&self, auth: &StoredAuth, now: i64) -> Result<i64> {
        crate::storage::write_json(&self.store, AUTH_STATE_KEY, auth)?;
        let expiry = now + TOKEN_EXPIRY_DAYS * DAY_MS;
        self.store.set_item(TOKEN_EXPIRY_KEY, &expiry.to_string())?;
        debug!(expiry, "Stored auth state");
        Ok(expiry)
    }

    /// Remove both keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn clear(&self) -> Result<()> {
        self.store.remove_item(AUTH_STATE_KEY)?;
        self.store.remove_item(TOKEN_EXPIRY_KEY)?;
        debug!("Cleared stored auth");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    fn auth() -> StoredAuth {
        StoredAuth {
            access_token: "sl.access".into(),
            refresh_token: "refresh".into(),
        }
    }

    #[test]
    fn test_store_sets_fifteen_day_expiry() {
        let tokens = TokenStore::new(Arc::new(MemoryStorage::new()));
        let expiry = tokens.store(&auth(), 1_000).unwrap();

        assert_eq!(expiry, 1_000 + 15 * DAY_MS);
        assert_eq!(tokens.expiry().unwrap(), Some(expiry));
        assert!(tokens.is_valid_at(expiry - 1));
        assert!(!tokens.is_valid_at(expiry));
    }

    #[test]
    fn test_missing_or_garbled_expiry_is_invalid() {
        let storage = Arc::new(MemoryStorage::new());
        let tokens = TokenStore::new(storage.clone());
        crate::storage::write_json(&storage, AUTH_STATE_KEY, &auth()).unwrap();
        assert!(!tokens.is_valid_at(0));

        storage.set_item(TOKEN_EXPIRY_KEY, "soon").unwrap();
        assert_eq!(tokens.expiry().unwrap(), None);
        assert!(!tokens.is_valid_at(0));
    }

    #[test]
    fn test_clear_removes_both_keys() {
        let storage = Arc::new(MemoryStorage::new());
        let tokens = TokenStore::new(storage.clone());
        tokens.store(&auth(), 0).unwrap();
        tokens.clear().unwrap();

        assert_eq!(storage.get_item(AUTH_STATE_KEY).unwrap(), None);
        assert_eq!(storage.get_item(TOKEN_EXPIRY_KEY).unwrap(), None);
    }
}
