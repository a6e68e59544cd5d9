//! Error types for startsync.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=storage, 3=not_found, 4=validation, etc.)
//! - Retryability flags for scripted callers
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers
//!
//! Remote and auth failures inside the sync core never reach this type from a
//! mutation entry point; they are converted to queued operations or cache
//! fallbacks first. What surfaces here is local: storage, config, bad input.

use std::path::PathBuf;
use thiserror::Error;

use crate::auth::AuthError;
use crate::remote::RemoteError;

/// Result type alias for startsync operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Storage (exit 2)
    NotInitialized,
    AlreadyInitialized,
    StorageError,

    // Not Found (exit 3)
    EntryNotFound,

    // Validation (exit 4)
    InvalidArgument,
    InvalidUrl,

    // Sync (exit 6)
    AuthError,
    RemoteError,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::StorageError => "STORAGE_ERROR",
            Self::EntryNotFound => "ENTRY_NOT_FOUND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::InvalidUrl => "INVALID_URL",
            Self::AuthError => "AUTH_ERROR",
            Self::RemoteError => "REMOTE_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-8).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotInitialized | Self::AlreadyInitialized | Self::StorageError => 2,
            Self::EntryNotFound => 3,
            Self::InvalidArgument | Self::InvalidUrl => 4,
            Self::AuthError | Self::RemoteError => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether a caller should retry, either with corrected input or later.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument | Self::InvalidUrl | Self::RemoteError | Self::StorageError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in startsync operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not initialized: run `startsync init` first")]
    NotInitialized,

    #[error("Already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    #[error("No {collection} entry matches '{key}'")]
    EntryNotFound {
        collection: String,
        key: String,
        similar: Vec<String>,
    },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::AlreadyInitialized { .. } => ErrorCode::AlreadyInitialized,
            Self::EntryNotFound { .. } => ErrorCode::EntryNotFound,
            Self::InvalidUrl { .. } => ErrorCode::InvalidUrl,
            Self::Storage(_) => ErrorCode::StorageError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Auth(_) => ErrorCode::AuthError,
            Self::Remote(_) => ErrorCode::RemoteError,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotInitialized => {
                Some("Run `startsync init` to create the local database".to_string())
            }

            Self::AlreadyInitialized { path } => Some(format!(
                "Database already exists at {}. Use `--force` to reinitialize.",
                path.display()
            )),

            Self::EntryNotFound {
                collection,
                similar,
                ..
            } => {
                if similar.is_empty() {
                    Some(format!(
                        "Use `startsync {collection} list` to see stored entries."
                    ))
                } else {
                    Some(format!("Did you mean: {}?", similar.join(", ")))
                }
            }

            Self::InvalidUrl { .. } => {
                Some("Favorites need an absolute URL, e.g. https://example.com".to_string())
            }

            Self::Auth(_) => Some(
                "Store a Dropbox refresh token with `startsync auth login <token>`; \
                 mutations keep working offline and are queued meanwhile."
                    .to_string(),
            ),

            Self::Config(_) => Some(
                "Check ~/.startsync/config.json and the DROPBOX_CLIENT_ID / \
                 DROPBOX_CLIENT_SECRET environment variables."
                    .to_string(),
            ),

            Self::Storage(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Remote(_)
            | Self::InvalidArgument(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}
