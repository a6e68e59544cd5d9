//! Sync session state and pass outcomes.

use serde::Serialize;

use super::queue::DrainReport;
use crate::model::Collection;
use crate::remote::RemoteError;

/// Coordinator lifecycle.
///
/// `Uninitialized → Authenticating → ConnectionVerifying → Ready`, with
/// `Ready ⇄ Syncing` for passes and `Unauthenticated` on auth or connection
/// failure. `Unauthenticated` lasts until the next online transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Uninitialized,
    Authenticating,
    ConnectionVerifying,
    Ready,
    Syncing,
    Unauthenticated,
}

impl SyncState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Authenticating => "authenticating",
            Self::ConnectionVerifying => "connection_verifying",
            Self::Ready => "ready",
            Self::Syncing => "syncing",
            Self::Unauthenticated => "unauthenticated",
        }
    }

    /// Whether remote calls may be attempted in this state.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Ready | Self::Syncing)
    }
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session owned by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSession {
    pub state: SyncState,
    pub last_sync_at: Option<i64>,
    pub online: bool,
}

impl Default for SyncSession {
    fn default() -> Self {
        Self {
            state: SyncState::Uninitialized,
            last_sync_at: None,
            online: true,
        }
    }
}

/// What a mutation entry point did with a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationOutcome {
    /// Written to the remote store.
    Applied,
    /// Held in the offline queue for a later drain.
    Queued,
}

/// Summary of one merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    /// Local entries that survived a key collision.
    pub kept_local: usize,
    /// Collisions resolved in favor of the remote entry.
    pub taken_remote: usize,
    /// Remote-only entries.
    pub added_remote: usize,
}

/// Result of syncing one collection in a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionReport {
    pub collection: Collection,
    /// Entries after the merge (0 on failure).
    pub total: usize,
    pub stats: MergeStats,
    /// The remote side came from the snapshot cache.
    pub from_cache: bool,
    /// Failure reason; `None` when the collection synced.
    pub error: Option<String>,
}

impl CollectionReport {
    #[must_use]
    pub fn failed(collection: Collection, error: impl ToString) -> Self {
        Self {
            collection,
            total: 0,
            stats: MergeStats::default(),
            from_cache: false,
            error: Some(error.to_string()),
        }
    }

    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Why a sync pass did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "state", rename_all = "snake_case")]
pub enum SkipReason {
    /// Another pass or a drain holds the latch.
    Busy,
    /// The connectivity signal reports offline.
    Offline,
    /// The coordinator is not `Ready`.
    NotReady(SyncState),
    /// Queued operations must replay before a merge.
    Pending,
}

/// Result of [`sync_data`](crate::sync::SyncCoordinator::sync_data).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    Skipped { skipped: SkipReason },
    Finished {
        reports: Vec<CollectionReport>,
        /// Set only when every collection synced.
        last_sync_at: Option<i64>,
    },
}

impl SyncOutcome {
    /// Whether the pass ran and every collection succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Finished { last_sync_at: Some(_), .. })
    }
}

/// Result of [`drain_queue`](crate::sync::SyncCoordinator::drain_queue).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DrainOutcome {
    Skipped { skipped: SkipReason },
    Finished(DrainReport),
}

/// Failures inside the coordinator's remote handlers.
///
/// These never leave a mutation entry point; they decide between applying
/// and queueing, and are reported by sync passes and drains.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Token refresh failed after a 401.
    #[error("not authenticated")]
    Unauthenticated,

    /// Remote read failed and no snapshot is cached for the path.
    #[error("remote unavailable and no cached snapshot for {0}")]
    NoSnapshot(String),

    /// Local storage or serialization failed.
    #[error("local: {0}")]
    Local(String),
}

impl From<crate::error::Error> for SyncError {
    fn from(err: crate::error::Error) -> Self {
        Self::Local(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Local(err.to_string())
    }
}

impl From<SyncError> for crate::error::Error {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Remote(e) => Self::Remote(e),
            SyncError::Unauthenticated => Self::Auth(crate::auth::AuthError::Rejected(
                "not signed in to the remote store".to_string(),
            )),
            SyncError::NoSnapshot(_) | SyncError::Local(_) => Self::Other(err.to_string()),
        }
    }
}

/// Result type for the coordinator's remote handlers.
pub type SyncResult<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_complete_only_with_timestamp() {
        let partial = SyncOutcome::Finished {
            reports: vec![CollectionReport::failed(Collection::History, "down")],
            last_sync_at: None,
        };
        assert!(!partial.is_complete());
        assert!(
            !SyncOutcome::Skipped {
                skipped: SkipReason::Busy
            }
            .is_complete()
        );
    }

    #[test]
    fn test_skip_reason_serializes_state() {
        let json = serde_json::to_value(SkipReason::NotReady(SyncState::Unauthenticated)).unwrap();
        assert_eq!(json["reason"], "not_ready");
        assert_eq!(json["state"], "unauthenticated");
    }

    #[test]
    fn test_pending_skip_reason_has_no_state() {
        let json = serde_json::to_value(SkipReason::Pending).unwrap();
        assert_eq!(json, serde_json::json!({"reason": "pending"}));
    }
}
