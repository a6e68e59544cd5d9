//! Offline mutation queue.
//!
//! Mutations that could not reach the remote store wait here and are
//! replayed strictly FIFO. There is no key-based deduplication: each write
//! replay overwrites the remote file, so the last one applied wins.
//!
//! A replay failure stops the drain with the failing operation still at the
//! head and everything behind it untouched. Nothing is ever dropped or
//! duplicated.
//!
//! The queue snapshot is persisted to local storage after every change so
//! queued work survives process restarts.

use std::collections::VecDeque;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;
use crate::model::Collection;
use crate::storage::{LocalStore, read_json, write_json};

/// Local storage key of the queue snapshot.
pub const QUEUE_KEY: &str = "syncQueue";

/// The change a pending operation carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OperationKind {
    /// Replace the remote collection with `records`.
    Write { records: Value },
    /// Remove the entries whose natural key is `key`.
    Delete { key: String },
    /// Reorder the remote collection by index.
    Reorder { order: Vec<usize> },
}

impl OperationKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Write { .. } => "write",
            Self::Delete { .. } => "delete",
            Self::Reorder { .. } => "reorder",
        }
    }
}

/// A queued mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOperation {
    pub id: String,
    pub collection: Collection,
    #[serde(flatten)]
    pub kind: OperationKind,
    pub enqueued_at: i64,
}

impl PendingOperation {
    #[must_use]
    pub fn new(collection: Collection, kind: OperationKind, now: i64) -> Self {
        let id = format!("op_{}", &uuid::Uuid::new_v4().simple().to_string()[..12]);
        Self {
            id,
            collection,
            kind,
            enqueued_at: now,
        }
    }

    /// Short description for logs and listings.
    #[must_use]
    pub fn describe(&self) -> String {
        match &self.kind {
            OperationKind::Write { records } => format!(
                "write {} ({} records)",
                self.collection,
                records.as_array().map_or(0, Vec::len)
            ),
            OperationKind::Delete { key } => format!("delete {} '{key}'", self.collection),
            OperationKind::Reorder { order } => {
                format!("reorder {} ({} positions)", self.collection, order.len())
            }
        }
    }
}

/// The operation a drain stopped at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedReplay {
    pub id: String,
    pub reason: String,
}

/// Result of one drain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    pub replayed: usize,
    pub remaining: usize,
    pub failed: Option<FailedReplay>,
}

/// FIFO queue of pending operations, mirrored to local storage.
pub struct OfflineQueue<S: LocalStore> {
    ops: Mutex<VecDeque<PendingOperation>>,
    store: S,
}

impl<S: LocalStore> OfflineQueue<S> {
    /// Load the persisted snapshot (empty if none).
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the snapshot is malformed.
    pub fn load(store: S) -> Result<Self> {
        let ops: VecDeque<PendingOperation> = read_json(&store, QUEUE_KEY)?.unwrap_or_default();
        if !ops.is_empty() {
            debug!(pending = ops.len(), "Loaded offline queue");
        }
        Ok(Self {
            ops: Mutex::new(ops),
            store,
        })
    }

    /// Append an operation.
    pub fn enqueue(&self, op: PendingOperation) {
        debug!(id = %op.id, op = %op.describe(), "Queued operation");
        let mut ops = self.lock();
        ops.push_back(op);
        self.persist(&ops);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot of the queue, head first.
    #[must_use]
    pub fn iter(&self) -> Vec<PendingOperation> {
        self.lock().iter().cloned().collect()
    }

    /// Drop every pending operation. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut ops = self.lock();
        let removed = ops.len();
        ops.clear();
        self.persist(&ops);
        removed
    }

    /// Replay operations head to tail.
    ///
    /// An operation is removed only after `replay` succeeds for it. The
    /// first failure ends the drain. Operations enqueued while the drain is
    /// running are replayed by the same drain.
    pub async fn drain<F, Fut, E>(&self, mut replay: F) -> DrainReport
    where
        F: FnMut(PendingOperation) -> Fut,
        Fut: Future<Output = std::result::Result<(), E>>,
        E: Display,
    {
        let mut report = DrainReport::default();

        loop {
            let Some(head) = self.lock().front().cloned() else {
                break;
            };
            let id = head.id.clone();

            match replay(head).await {
                Ok(()) => {
                    let mut ops = self.lock();
                    if ops.front().is_some_and(|op| op.id == id) {
                        ops.pop_front();
                    }
                    self.persist(&ops);
                    report.replayed += 1;
                }
                Err(e) => {
                    warn!(id = %id, error = %e, "Replay failed, leaving queue in place");
                    report.failed = Some(FailedReplay {
                        id,
                        reason: e.to_string(),
                    });
                    break;
                }
            }
        }

        report.remaining = self.len();
        report
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<PendingOperation>> {
        self.ops.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, ops: &VecDeque<PendingOperation>) {
        let result = if ops.is_empty() {
            self.store.remove_item(QUEUE_KEY)
        } else {
            write_json(&self.store, QUEUE_KEY, ops)
        };
        if let Err(e) = result {
            warn!(error = %e, "Failed to persist offline queue");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use serde_json::json;
    use std::sync::Arc;

    fn queue() -> (OfflineQueue<Arc<MemoryStorage>>, Arc<MemoryStorage>) {
        let store = Arc::new(MemoryStorage::new());
        (OfflineQueue::load(store.clone()).unwrap(), store)
    }

    fn three_ops(q: &OfflineQueue<Arc<MemoryStorage>>) {
        q.enqueue(PendingOperation::new(
            Collection::History,
            OperationKind::Write {
                records: json!([{"term": "x"}]),
            },
            1,
        ));
        q.enqueue(PendingOperation::new(
            Collection::Favorites,
            OperationKind::Delete {
                key: "https://a.test".into(),
            },
            2,
        ));
        q.enqueue(PendingOperation::new(
            Collection::Favorites,
            OperationKind::Reorder { order: vec![1, 0] },
            3,
        ));
    }

    #[tokio::test]
    async fn test_drain_is_fifo() {
        let (q, _) = queue();
        three_ops(&q);

        let seen = Mutex::new(Vec::new());
        let report = q
            .drain(|op| {
                seen.lock().unwrap().push(op.kind.as_str());
                async { Ok::<_, String>(()) }
            })
            .await;

        assert_eq!(*seen.lock().unwrap(), ["write", "delete", "reorder"]);
        assert_eq!(report.replayed, 3);
        assert_eq!(report.remaining, 0);
        assert!(q.is_empty());
    }

    #[tokio::test]
    async fn test_failed_replay_stops_without_duplicating() {
        let (q, _) = queue();
        three_ops(&q);
        let before = q.iter();

        let report = q
            .drain(|op| async move {
                if matches!(op.kind, OperationKind::Delete { .. }) {
                    Err("remote down".to_string())
                } else {
                    Ok(())
                }
            })
            .await;

        assert_eq!(report.replayed, 1);
        assert_eq!(report.remaining, 2);
        assert_eq!(report.failed.as_ref().unwrap().id, before[1].id);
        assert_eq!(q.iter(), before[1..].to_vec());
    }

    #[tokio::test]
    async fn test_snapshot_survives_reload() {
        let (q, store) = queue();
        three_ops(&q);
        let before = q.iter();
        drop(q);

        let reloaded = OfflineQueue::load(store.clone()).unwrap();
        assert_eq!(reloaded.iter(), before);

        reloaded.clear();
        assert_eq!(store.get_item(QUEUE_KEY).unwrap(), None);
    }

    #[test]
    fn test_operation_ids_and_wire_shape() {
        let op = PendingOperation::new(
            Collection::History,
            OperationKind::Delete { key: "x".into() },
            9,
        );
        assert!(op.id.starts_with("op_"));
        assert_eq!(op.id.len(), 15);

        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["type"], "delete");
        assert_eq!(json["collection"], "history");
        assert_eq!(json["enqueuedAt"], 9);
    }
}
