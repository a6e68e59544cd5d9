//! Remote file storage capability.
//!
//! The sync core talks to cloud storage only through [`RemoteStore`]: an
//! identity check, a metadata lookup, a whole-file download and a
//! whole-file upload. Every failure is classified into [`RemoteError`] at
//! the point of the call, so callers decide between refresh-and-retry,
//! cache fallback and queueing without inspecting HTTP details.
//!
//! # Implementations
//!
//! - [`DropboxStore`] - Dropbox HTTP API v2

pub mod dropbox;

pub use dropbox::{DropboxEndpoints, DropboxStore};

use serde::{Deserialize, Serialize};
use std::future::Future;

/// Classified remote failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The access token was rejected (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    /// The remote file does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Anything else: transport errors, 5xx, rate limits, conflicts.
    #[error("{0}")]
    Transient(String),
}

impl RemoteError {
    /// Classify an HTTP error response.
    ///
    /// Dropbox reports a missing path as HTTP 409 with an `error_summary`
    /// beginning with `path/not_found` (or `path_lookup/not_found` for
    /// metadata and downloads).
    #[must_use]
    pub fn from_status(status: u16, body: &str, path: &str) -> Self {
        match status {
            401 => Self::Unauthorized,
            409 if body.contains("not_found") => Self::NotFound(path.to_string()),
            _ => Self::Transient(format!("HTTP {status}: {}", body.trim())),
        }
    }

    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.status().is_some_and(|s| s.as_u16() == 401) {
            Self::Unauthorized
        } else {
            Self::Transient(err.to_string())
        }
    }
}

/// Metadata of a remote file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    #[serde(default)]
    pub path_display: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub rev: Option<String>,
    #[serde(default)]
    pub server_modified: Option<String>,
}

/// Identity of the account behind the current token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Upload behavior when the target already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadMode {
    /// Replace the existing content.
    Overwrite,
    /// Only create; an existing file is left untouched.
    CreateIfAbsent,
}

/// Remote file storage used by the sync core.
///
/// The trait is not object-safe (async methods via `impl Future`); the
/// coordinator is generic over it instead.
pub trait RemoteStore: Send + Sync {
    /// Lightweight identity call used to verify the connection.
    fn current_account(&self) -> impl Future<Output = Result<Account, RemoteError>> + Send;

    /// Metadata for `path`, or [`RemoteError::NotFound`].
    fn get_metadata(&self, path: &str) -> impl Future<Output = Result<Metadata, RemoteError>> + Send;

    /// Full content of `path`, or [`RemoteError::NotFound`].
    fn download(&self, path: &str) -> impl Future<Output = Result<Vec<u8>, RemoteError>> + Send;

    /// Write `bytes` to `path`.
    fn upload(
        &self,
        path: &str,
        bytes: &[u8],
        mode: UploadMode,
    ) -> impl Future<Output = Result<Metadata, RemoteError>> + Send;
}

impl<T: RemoteStore> RemoteStore for std::sync::Arc<T> {
    fn current_account(&self) -> impl Future<Output = Result<Account, RemoteError>> + Send {
        (**self).current_account()
    }

    fn get_metadata(&self, path: &str) -> impl Future<Output = Result<Metadata, RemoteError>> + Send {
        (**self).get_metadata(path)
    }

    fn download(&self, path: &str) -> impl Future<Output = Result<Vec<u8>, RemoteError>> + Send {
        (**self).download(path)
    }

    fn upload(
        &self,
        path: &str,
        bytes: &[u8],
        mode: UploadMode,
    ) -> impl Future<Output = Result<Metadata, RemoteError>> + Send {
        (**self).upload(path, bytes, mode)
    }
}
