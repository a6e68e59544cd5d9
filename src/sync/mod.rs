//! Sync core.
//!
//! Keeps the search history and favorites collections consistent between
//! local storage and the remote store:
//!
//! - **Normalize**: legacy and partial records → canonical records
//! - **Merge**: last-writer-wins by recency, local wins ties
//! - **Queue**: FIFO offline mutations, persisted locally
//! - **Cache**: last-known-good remote snapshots for read fallback
//! - **Coordinator**: state machine, sync passes, mutations and replay
//! - **Status**: local/remote comparison for `startsync status`
//!
//! # Example
//!
//! ```ignore
//! use startsync::sync::{CoordinatorSettings, SyncCoordinator};
//!
//! let sync = SyncCoordinator::new(auth, remote, local, CoordinatorSettings::default(), clock)?;
//! if sync.initialize().await {
//!     sync.record_search("rust ownership").await?;
//! }
//! ```

mod cache;
mod coordinator;
mod hash;
mod latch;
mod merge;
mod normalize;
mod queue;
mod status;
mod types;

pub use cache::{CachedBlob, RemoteFileCache};
pub use coordinator::{CoordinatorSettings, SyncCoordinator};
pub use hash::{content_hash, has_changed};
pub use latch::{Latch, LatchGuard};
pub use merge::merge;
pub use normalize::{FromRaw, RawRecord, normalize};
pub use queue::{DrainReport, FailedReplay, OfflineQueue, OperationKind, PendingOperation, QUEUE_KEY};
pub use status::{CollectionStatus, RemoteState, SyncStatus, check_remote, get_sync_status, print_status};
pub use types::{
    CollectionReport, DrainOutcome, MergeStats, MutationOutcome, SkipReason, SyncError, SyncOutcome,
    SyncResult, SyncSession, SyncState,
};
