//! Sync status display.
//!
//! Status is gathered from local state only (collections, queue snapshot,
//! token expiry, event log). With a live coordinator it can additionally
//! compare each local collection against the remote copy by content hash.

use std::sync::Arc;

use colored::Colorize;
use serde::Serialize;
use serde_json::Value;

use super::SyncCoordinator;
use super::hash::{content_hash, has_changed};
use super::normalize::{FromRaw, normalize};
use super::queue::{PendingOperation, QUEUE_KEY};
use crate::auth::{AuthProvider, TokenStore};
use crate::clock::format_ms;
use crate::error::Result;
use crate::model::{Collection, FavoriteEntry, SearchHistoryEntry, sort_canonical};
use crate::remote::RemoteStore;
use crate::storage::{Event, LocalStore, SqliteStorage, read_json};

/// How many log entries `status` shows.
const RECENT_EVENTS: u32 = 5;

/// Local vs remote comparison for one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RemoteState {
    InSync,
    Diverged { remote_entries: usize },
    Unavailable { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionStatus {
    pub collection: Collection,
    pub local_entries: usize,
    pub local_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteState>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncStatus {
    pub authenticated: bool,
    pub token_expiry: Option<i64>,
    pub pending_operations: usize,
    pub last_sync_at: Option<i64>,
    pub collections: Vec<CollectionStatus>,
    pub recent_events: Vec<Event>,
}

/// Gather status from the local database.
///
/// # Errors
///
/// Returns an error if a local read fails.
pub fn get_sync_status(storage: &Arc<SqliteStorage>, now: i64) -> Result<SyncStatus> {
    let tokens = TokenStore::new(Arc::clone(storage));
    let pending: Vec<PendingOperation> = read_json(storage, QUEUE_KEY)?.unwrap_or_default();

    Ok(SyncStatus {
        authenticated: tokens.is_valid_at(now),
        token_expiry: tokens.expiry()?,
        pending_operations: pending.len(),
        last_sync_at: storage.last_sync_at()?,
        collections: vec![
            local_status::<SearchHistoryEntry>(storage, now)?,
            local_status::<FavoriteEntry>(storage, now)?,
        ],
        recent_events: storage.recent_events(RECENT_EVENTS)?,
    })
}

fn local_status<T: FromRaw>(storage: &impl LocalStore, now: i64) -> Result<CollectionStatus> {
    let value = storage
        .get_item(T::COLLECTION.local_key())?
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or(Value::Null);
    let (local_entries, local_hash) = canonical_hash::<T>(&value, now);
    Ok(CollectionStatus {
        collection: T::COLLECTION,
        local_entries,
        local_hash,
        remote: None,
    })
}

/// Entry count and hash of a collection in canonical form.
fn canonical_hash<T: FromRaw>(value: &Value, now: i64) -> (usize, String) {
    let mut records: Vec<T> = normalize(value, now);
    sort_canonical(&mut records);
    (records.len(), content_hash(&records))
}

/// Fill in the remote comparison for every collection.
///
/// Without a connected coordinator every collection is `Unavailable`.
pub async fn check_remote<A, R, L>(sync: &SyncCoordinator<A, R, L>, status: &mut SyncStatus, now: i64)
where
    A: AuthProvider,
    R: RemoteStore,
    L: LocalStore + Clone,
{
    let session = sync.state();
    for entry in &mut status.collections {
        if !session.is_connected() {
            entry.remote = Some(RemoteState::Unavailable {
                reason: format!("not connected ({session})"),
            });
            continue;
        }
        let state = match sync.read_remote(entry.collection).await {
            Ok(value) => {
                let (remote_entries, remote_hash) = match entry.collection {
                    Collection::History => canonical_hash::<SearchHistoryEntry>(&value, now),
                    Collection::Favorites => canonical_hash::<FavoriteEntry>(&value, now),
                };
                if has_changed(&remote_hash, Some(&entry.local_hash)) {
                    RemoteState::Diverged { remote_entries }
                } else {
                    RemoteState::InSync
                }
            }
            Err(e) => RemoteState::Unavailable {
                reason: e.to_string(),
            },
        };
        entry.remote = Some(state);
    }
}

/// Print sync status to stdout in a human-readable format.
pub fn print_status(status: &SyncStatus) {
    println!("{}", "Sync Status".bold().underline());
    println!();

    println!("{}", "Account:".blue().bold());
    match (status.authenticated, status.token_expiry) {
        (true, Some(expiry)) => {
            println!("  {} (token valid until {})", "Signed in".green(), format_ms(expiry));
        }
        (false, Some(expiry)) => println!(
            "  {} (token expired {}, will refresh on next sync)",
            "Expired".yellow(),
            format_ms(expiry)
        ),
        _ => println!(
            "  {}",
            "Not signed in. Run 'startsync auth login' to connect Dropbox.".dimmed()
        ),
    }
    println!();

    println!("{}", "Collections:".blue().bold());
    for entry in &status.collections {
        let remote = match &entry.remote {
            None => String::new(),
            Some(RemoteState::InSync) => format!(" {}", "in sync".green()),
            Some(RemoteState::Diverged { remote_entries }) => {
                format!(" {}", format!("diverged ({remote_entries} remote)").yellow())
            }
            Some(RemoteState::Unavailable { reason }) => {
                format!(" {}", format!("remote unavailable: {reason}").red())
            }
        };
        println!(
            "  {:<10} {:>4} entries{remote}",
            entry.collection.as_str(),
            entry.local_entries
        );
    }
    println!();

    match status.last_sync_at {
        Some(at) => println!("Last sync: {}", format_ms(at)),
        None => println!("{}", "Never synced.".dimmed()),
    }

    if status.pending_operations > 0 {
        println!(
            "{} {} operation(s) waiting",
            "Offline queue:".yellow().bold(),
            status.pending_operations
        );
        println!(
            "{}",
            "Run 'startsync queue drain' once online to replay them.".dimmed()
        );
    } else {
        println!("{}", "Offline queue is empty.".green());
    }

    if !status.recent_events.is_empty() {
        println!();
        println!("{}", "Recent activity:".blue().bold());
        for event in &status.recent_events {
            let scope = event
                .collection
                .map(|c| format!(" [{c}]"))
                .unwrap_or_default();
            let detail = event
                .detail
                .as_deref()
                .map(|d| format!(": {d}"))
                .unwrap_or_default();
            println!(
                "  {} {}{scope}{detail}",
                format_ms(event.created_at).dimmed(),
                event.event_type.as_str()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AUTH_STATE_KEY, StoredAuth};
    use crate::storage::write_json;
    use serde_json::json;

    fn storage() -> Arc<SqliteStorage> {
        Arc::new(SqliteStorage::open_memory().unwrap())
    }

    #[test]
    fn test_status_of_empty_database() {
        let storage = storage();
        let status = get_sync_status(&storage, 0).unwrap();

        assert!(!status.authenticated);
        assert_eq!(status.token_expiry, None);
        assert_eq!(status.pending_operations, 0);
        assert_eq!(status.last_sync_at, None);
        assert!(status.collections.iter().all(|c| c.local_entries == 0));
    }

    #[test]
    fn test_status_counts_local_entries_and_queue() {
        let storage = storage();
        storage
            .set_item("searchHistory", r#"["a", {"term": "b", "lastSearched": 3}]"#)
            .unwrap();
        write_json(
            &storage,
            QUEUE_KEY,
            &json!([{"id": "op_1", "collection": "history", "type": "delete", "key": "a", "enqueuedAt": 1}]),
        )
        .unwrap();
        TokenStore::new(storage.clone())
            .store(
                &StoredAuth {
                    access_token: "t".into(),
                    refresh_token: "r".into(),
                },
                10,
            )
            .unwrap();

        let status = get_sync_status(&storage, 20).unwrap();
        assert!(status.authenticated);
        assert!(storage.get_item(AUTH_STATE_KEY).unwrap().is_some());
        assert_eq!(status.pending_operations, 1);
        assert_eq!(status.collections[0].local_entries, 2);
        assert_eq!(status.collections[1].local_entries, 0);
    }

    #[test]
    fn test_canonical_hash_ignores_stored_order() {
        let a = json!([{"term": "x", "lastSearched": 2}, {"term": "y", "lastSearched": 1}]);
        let b = json!([{"term": "y", "lastSearched": 1}, {"term": "x", "lastSearched": 2}]);
        assert_eq!(
            canonical_hash::<SearchHistoryEntry>(&a, 0),
            canonical_hash::<SearchHistoryEntry>(&b, 0)
        );
    }

    #[tokio::test]
    async fn test_check_remote_compares_by_content() {
        use crate::clock::Clock;
        use crate::sync::CoordinatorSettings;
        use crate::testing::{FakeAuth, FakeRemote};

        let storage = storage();
        storage
            .set_item("searchHistory", r#"[{"term": "x", "lastSearched": 2}]"#)
            .unwrap();
        let remote = Arc::new(FakeRemote::new());
        remote.put_json("/search_history.json", &json!(["x"]));
        remote.put_json("/favorites.json", &json!([]));

        let sync = SyncCoordinator::new(
            FakeAuth::signed_in(),
            Arc::clone(&remote),
            Arc::clone(&storage),
            CoordinatorSettings::default(),
            Clock::fixed(5),
        )
        .unwrap();

        let mut status = get_sync_status(&storage, 5).unwrap();
        check_remote(&sync, &mut status, 5).await;
        assert!(matches!(
            status.collections[0].remote,
            Some(RemoteState::Unavailable { .. })
        ));

        assert!(sync.connect().await);
        check_remote(&sync, &mut status, 5).await;
        // The legacy remote entry normalizes with timestamp `now`, not 2.
        assert_eq!(
            status.collections[0].remote,
            Some(RemoteState::Diverged { remote_entries: 1 })
        );
        assert_eq!(status.collections[1].remote, Some(RemoteState::InSync));
    }
}
