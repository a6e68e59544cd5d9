//! Sync coordinator.
//!
//! Owns the session, the offline queue and the snapshot cache, and is the
//! only component that talks to the remote store. Everything that writes a
//! remote file (sync passes, direct mutations, queue replay) goes through
//! one latch so two writers never race on the same path.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized ─initialize()─▶ Authenticating ─▶ ConnectionVerifying ─▶ Ready ⇄ Syncing
//!                                     │                    │
//!                                     └────────────────────┴─▶ Unauthenticated
//! ```
//!
//! `Unauthenticated` lasts until the next offline → online transition,
//! which re-runs authentication and then drains the queue.
//!
//! # Mutations
//!
//! `write`, `delete` and `reorder` update local storage first, then either
//! apply the change remotely or queue it. Remote failures never escape;
//! callers get a [`MutationOutcome`]. Queue replay calls the same remote
//! handlers as direct calls.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use super::cache::RemoteFileCache;
use super::latch::Latch;
use super::merge::merge;
use super::normalize::{FromRaw, normalize};
use super::queue::{OfflineQueue, OperationKind, PendingOperation};
use super::types::{
    CollectionReport, DrainOutcome, MutationOutcome, SkipReason, SyncError, SyncOutcome,
    SyncResult, SyncSession, SyncState,
};
use crate::auth::AuthProvider;
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::model::history::push_recent;
use crate::model::{Collection, FavoriteEntry, Record, SearchHistoryEntry, sort_canonical};
use crate::net::ConnectivityProbe;
use crate::remote::{RemoteError, RemoteStore, UploadMode};
use crate::storage::{Event, EventType, LocalStore};
use crate::validate::find_similar_keys;

/// Coordinator tuning.
#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    /// Remote folder holding the collection files (`""` = app folder root).
    pub remote_root: String,
    /// Upper bound on one authentication attempt.
    pub auth_timeout: Duration,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            remote_root: String::new(),
            auth_timeout: Duration::from_secs(120),
        }
    }
}

pub struct SyncCoordinator<A, R, L>
where
    A: AuthProvider,
    R: RemoteStore,
    L: LocalStore + Clone,
{
    auth: A,
    remote: R,
    local: L,
    queue: OfflineQueue<L>,
    cache: RemoteFileCache,
    session: Mutex<SyncSession>,
    latch: Latch,
    settings: CoordinatorSettings,
    clock: Clock,
}

impl<A, R, L> SyncCoordinator<A, R, L>
where
    A: AuthProvider,
    R: RemoteStore,
    L: LocalStore + Clone,
{
    /// Build a coordinator, restoring any persisted offline queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue snapshot cannot be read.
    pub fn new(auth: A, remote: R, local: L, settings: CoordinatorSettings, clock: Clock) -> Result<Self> {
        let queue = OfflineQueue::load(local.clone())?;
        Ok(Self {
            auth,
            remote,
            local,
            queue,
            cache: RemoteFileCache::new(),
            session: Mutex::new(SyncSession::default()),
            latch: Latch::new(),
            settings,
            clock,
        })
    }

    // ── Accessors ─────────────────────────────────────────────

    #[must_use]
    pub fn session(&self) -> SyncSession {
        self.lock_session().clone()
    }

    #[must_use]
    pub fn state(&self) -> SyncState {
        self.lock_session().state
    }

    #[must_use]
    pub fn queue(&self) -> &OfflineQueue<L> {
        &self.queue
    }

    #[must_use]
    pub fn cache(&self) -> &RemoteFileCache {
        &self.cache
    }

    #[must_use]
    pub fn auth(&self) -> &A {
        &self.auth
    }

    #[must_use]
    pub fn remote_path(&self, collection: Collection) -> String {
        collection.remote_path(&self.settings.remote_root)
    }

    /// The local collection in canonical form.
    ///
    /// # Errors
    ///
    /// Returns an error if local storage fails.
    pub fn local_records<T: FromRaw>(&self) -> Result<Vec<T>> {
        self.read_local(self.clock.now())
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Authenticate, verify the connection and run a first pass.
    ///
    /// Queued operations are replayed first; the pass is skipped if any
    /// remain.
    pub async fn initialize(&self) -> bool {
        if !self.connect().await {
            return false;
        }
        if !self.queue.is_empty() {
            self.drain_queue().await;
        }
        self.sync_data().await;
        true
    }

    /// Authenticate and verify the connection without syncing.
    ///
    /// Ends in `Ready` on success, `Unauthenticated` otherwise.
    pub async fn connect(&self) -> bool {
        self.set_state(SyncState::Authenticating);
        if let Err(e) = self.auth.initialize().await {
            warn!(error = %e, "Auth provider failed to initialize");
        }

        let authenticated =
            match tokio::time::timeout(self.settings.auth_timeout, self.auth.authenticate()).await {
                Ok(ok) => ok,
                Err(_) => {
                    warn!(
                        timeout_secs = self.settings.auth_timeout.as_secs(),
                        "Authentication timed out"
                    );
                    false
                }
            };
        if !authenticated {
            self.lose_auth("authentication failed");
            return false;
        }

        self.set_state(SyncState::ConnectionVerifying);
        match self.with_refresh(|| self.remote.current_account()).await {
            Ok(account) => {
                info!(account = %account.account_id, "Connected to remote store");
                self.set_state(SyncState::Ready);
                true
            }
            // Refresh failure already moved the session to Unauthenticated.
            Err(SyncError::Unauthenticated) => false,
            Err(e) => {
                warn!(error = %e, "Connection check failed");
                self.lose_auth(&format!("connection check failed: {e}"));
                false
            }
        }
    }

    /// Report a connectivity change.
    ///
    /// Going online re-authenticates if needed and drains the queue.
    pub async fn set_online(&self, online: bool) {
        let was_online = std::mem::replace(&mut self.lock_session().online, online);
        if was_online == online {
            return;
        }
        if !online {
            info!("Connectivity lost, mutations will be queued");
            return;
        }

        info!("Connectivity restored");
        if !self.state().is_connected() && !self.connect().await {
            return;
        }
        self.drain_queue().await;
    }

    /// One background tick: poll connectivity, drain, then sync.
    pub async fn tick<P: ConnectivityProbe>(&self, probe: &P) {
        let online = probe.is_online().await;
        self.set_online(online).await;
        if !online || !self.state().is_connected() {
            trace!(online, state = %self.state(), "Tick skipped");
            return;
        }

        if !self.queue.is_empty() {
            self.drain_queue().await;
        }
        self.sync_data().await;
    }

    /// Run [`tick`](Self::tick) every `interval` until `shutdown` resolves.
    pub async fn run<P, F>(&self, probe: &P, interval: Duration, shutdown: F)
    where
        P: ConnectivityProbe,
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!(interval_secs = interval.as_secs(), "Background sync started");
        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("Background sync stopping");
                    break;
                }
                _ = ticker.tick() => self.tick(probe).await,
            }
        }
    }

    // ── Sync passes ───────────────────────────────────────────

    /// Merge both collections with the remote store.
    ///
    /// A no-op while another pass or a drain is running, while offline,
    /// when not `Ready`, or while operations are queued. Merging with queued
    /// operations pending would copy entries they remove back into local
    /// storage.
    pub async fn sync_data(&self) -> SyncOutcome {
        let Some(_guard) = self.latch.try_acquire() else {
            debug!("Sync already in progress, skipping");
            return SyncOutcome::Skipped {
                skipped: SkipReason::Busy,
            };
        };
        if let Some(skipped) = self.not_ready() {
            debug!(?skipped, "Sync skipped");
            return SyncOutcome::Skipped { skipped };
        }
        if !self.queue.is_empty() {
            debug!(pending = self.queue.len(), "Queue not drained, skipping sync pass");
            return SyncOutcome::Skipped {
                skipped: SkipReason::Pending,
            };
        }

        self.set_state(SyncState::Syncing);
        let (history, favorites) = tokio::join!(
            self.sync_collection::<SearchHistoryEntry>(),
            self.sync_collection::<FavoriteEntry>()
        );
        if self.state() == SyncState::Syncing {
            self.set_state(SyncState::Ready);
        }

        let reports = vec![history, favorites];
        let last_sync_at = if reports.iter().all(CollectionReport::is_ok) {
            let now = self.clock.now();
            self.lock_session().last_sync_at = Some(now);
            self.record(Event::new(EventType::SyncCompleted));
            info!(
                history = reports[0].total,
                favorites = reports[1].total,
                "Sync pass completed"
            );
            Some(now)
        } else {
            for report in reports.iter().filter(|r| !r.is_ok()) {
                self.record(
                    Event::new(EventType::SyncFailed)
                        .with_collection(report.collection)
                        .with_detail(report.error.clone().unwrap_or_default()),
                );
            }
            None
        };

        SyncOutcome::Finished {
            reports,
            last_sync_at,
        }
    }

    async fn sync_collection<T: FromRaw>(&self) -> CollectionReport {
        let collection = T::COLLECTION;
        match self.try_sync_collection::<T>().await {
            Ok(report) => report,
            Err(e) => {
                warn!(%collection, error = %e, "Collection sync failed");
                CollectionReport::failed(collection, e)
            }
        }
    }

    async fn try_sync_collection<T: FromRaw>(&self) -> SyncResult<CollectionReport> {
        let collection = T::COLLECTION;
        let path = self.remote_path(collection);
        let now = self.clock.now();

        let local: Vec<T> = self.read_local(now)?;
        let (remote_value, from_cache) = self.fetch_remote(&path, true).await?;
        let remote: Vec<T> = normalize(&remote_value, now);
        let (merged, stats) = merge(local, remote);
        let value = serde_json::to_value(&merged)?;

        self.write_local(collection, &value)?;
        self.write_remote(&path, &value).await?;

        debug!(%collection, total = merged.len(), ?stats, from_cache, "Collection synced");
        Ok(CollectionReport {
            collection,
            total: merged.len(),
            stats,
            from_cache,
            error: None,
        })
    }

    // ── Mutations ─────────────────────────────────────────────

    /// Replace a collection.
    ///
    /// # Errors
    ///
    /// Returns an error only if local storage fails.
    pub async fn write<T: FromRaw>(&self, records: &[T]) -> Result<MutationOutcome> {
        let kind = OperationKind::Write {
            records: serde_json::to_value(records)?,
        };
        self.mutate(PendingOperation::new(T::COLLECTION, kind, self.clock.now()))
            .await
    }

    /// Remove the entries of `collection` whose natural key is `key`.
    ///
    /// # Errors
    ///
    /// Returns an error only if local storage fails.
    pub async fn delete(&self, collection: Collection, key: &str) -> Result<MutationOutcome> {
        let kind = OperationKind::Delete {
            key: key.to_string(),
        };
        self.mutate(PendingOperation::new(collection, kind, self.clock.now()))
            .await
    }

    /// Reorder `collection`: entry `order[i]` moves to position `i`.
    ///
    /// # Errors
    ///
    /// Returns an error only if local storage fails.
    pub async fn reorder(&self, collection: Collection, order: Vec<usize>) -> Result<MutationOutcome> {
        let kind = OperationKind::Reorder { order };
        self.mutate(PendingOperation::new(collection, kind, self.clock.now()))
            .await
    }

    async fn mutate(&self, op: PendingOperation) -> Result<MutationOutcome> {
        self.apply_local(&op)?;

        if self.must_queue() {
            return Ok(self.enqueue_and_drain(op).await);
        }
        let Some(guard) = self.latch.try_acquire() else {
            return Ok(self.enqueue_and_drain(op).await);
        };
        let result = self.apply_remote(&op).await;
        drop(guard);

        match result {
            Ok(()) => {
                debug!(op = %op.describe(), "Applied remotely");
                Ok(MutationOutcome::Applied)
            }
            Err(e) => {
                warn!(op = %op.describe(), error = %e, "Remote apply failed, queueing");
                self.enqueue(op);
                Ok(MutationOutcome::Queued)
            }
        }
    }

    /// Queue behind older work when offline, unauthenticated, or when
    /// earlier operations are still waiting.
    fn must_queue(&self) -> bool {
        let (online, state) = {
            let session = self.lock_session();
            (session.online, session.state)
        };
        !online || !state.is_connected() || !self.queue.is_empty()
    }

    fn enqueue(&self, op: PendingOperation) {
        self.record(
            Event::new(EventType::OperationQueued)
                .with_collection(op.collection)
                .with_detail(op.describe()),
        );
        self.queue.enqueue(op);
    }

    async fn enqueue_and_drain(&self, op: PendingOperation) -> MutationOutcome {
        self.enqueue(op);
        if self.lock_session().online {
            self.drain_queue().await;
        }
        MutationOutcome::Queued
    }

    fn apply_local(&self, op: &PendingOperation) -> Result<()> {
        match op.collection {
            Collection::History => self.apply_local_as::<SearchHistoryEntry>(&op.kind),
            Collection::Favorites => self.apply_local_as::<FavoriteEntry>(&op.kind),
        }
    }

    fn apply_local_as<T: FromRaw>(&self, kind: &OperationKind) -> Result<()> {
        let now = self.clock.now();
        let records: Vec<T> = match kind {
            OperationKind::Write { records } => normalize(records, now),
            OperationKind::Delete { key } => {
                let mut records = self.read_local::<T>(now)?;
                records.retain(|r| r.key() != key);
                records
            }
            OperationKind::Reorder { order } => reorder_records(self.read_local(now)?, order, now),
        };
        self.write_local(T::COLLECTION, &serde_json::to_value(&records)?)
    }

    async fn apply_remote(&self, op: &PendingOperation) -> SyncResult<()> {
        match op.collection {
            Collection::History => self.apply_remote_as::<SearchHistoryEntry>(&op.kind).await,
            Collection::Favorites => self.apply_remote_as::<FavoriteEntry>(&op.kind).await,
        }
    }

    /// Remote handler shared by direct mutations and queue replay.
    ///
    /// Reads never fall back to the cache here: rewriting a stale snapshot
    /// would clobber remote changes.
    async fn apply_remote_as<T: FromRaw>(&self, kind: &OperationKind) -> SyncResult<()> {
        let path = self.remote_path(T::COLLECTION);
        let now = self.clock.now();

        let value = match kind {
            OperationKind::Write { records } => records.clone(),
            OperationKind::Delete { key } => {
                let (current, _) = self.fetch_remote(&path, false).await?;
                let mut records: Vec<T> = normalize(&current, now);
                let before = records.len();
                records.retain(|r| r.key() != key);
                if records.len() == before {
                    debug!(path, key, "Nothing to delete remotely");
                    return Ok(());
                }
                serde_json::to_value(&records)?
            }
            OperationKind::Reorder { order } => {
                let (current, _) = self.fetch_remote(&path, false).await?;
                let records: Vec<T> = normalize(&current, now);
                serde_json::to_value(reorder_records(records, order, now))?
            }
        };

        self.write_remote(&path, &value).await
    }

    /// Replay queued operations FIFO.
    pub async fn drain_queue(&self) -> DrainOutcome {
        let Some(_guard) = self.latch.try_acquire() else {
            debug!("Drain requested while busy");
            return DrainOutcome::Skipped {
                skipped: SkipReason::Busy,
            };
        };
        if let Some(skipped) = self.not_ready() {
            debug!(?skipped, pending = self.queue.len(), "Drain skipped");
            return DrainOutcome::Skipped { skipped };
        }
        if self.queue.is_empty() {
            return DrainOutcome::Finished(Default::default());
        }

        info!(pending = self.queue.len(), "Draining offline queue");
        let report = self
            .queue
            .drain(|op| async move {
                let result = self.apply_remote(&op).await;
                if result.is_ok() {
                    self.record(
                        Event::new(EventType::OperationReplayed)
                            .with_collection(op.collection)
                            .with_detail(op.describe()),
                    );
                }
                result
            })
            .await;

        if let Some(failed) = &report.failed {
            self.record(
                Event::new(EventType::ReplayFailed)
                    .with_detail(format!("{}: {}", failed.id, failed.reason)),
            );
        }
        info!(
            replayed = report.replayed,
            remaining = report.remaining,
            "Queue drain finished"
        );
        DrainOutcome::Finished(report)
    }

    // ── Convenience operations ────────────────────────────────

    /// Move `term` to the front of the search history.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty term or if local storage fails.
    pub async fn record_search(&self, term: &str) -> Result<MutationOutcome> {
        let term = term.trim();
        if term.is_empty() {
            return Err(Error::InvalidArgument("search term is empty".to_string()));
        }
        let now = self.clock.now();
        let mut history: Vec<SearchHistoryEntry> = self.read_local(now)?;
        push_recent(&mut history, term, now);
        self.push_local(history).await
    }

    /// Add a favorite built from `url`. Re-adding a URL refreshes its tile.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] for a URL without a host, or an error
    /// if local storage fails.
    pub async fn add_favorite(&self, url: &str) -> Result<MutationOutcome> {
        let now = self.clock.now();
        let mut favorite = FavoriteEntry::from_url(url, now)?;
        let mut favorites: Vec<FavoriteEntry> = self.read_local(now)?;

        if let Some(existing) = favorites.iter_mut().find(|f| f.url == favorite.url) {
            existing.title = favorite.title;
            existing.favicon = favorite.favicon;
            existing.touch(now);
        } else {
            favorite.order = favorites
                .iter()
                .filter(|f| !f.pinned)
                .map(|f| f.order + 1)
                .max()
                .unwrap_or(0);
            favorites.push(favorite);
        }
        self.push_local(favorites).await
    }

    /// Pin or unpin a favorite.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryNotFound`] if no favorite has this URL.
    pub async fn set_pinned(&self, url: &str, pinned: bool) -> Result<MutationOutcome> {
        let now = self.clock.now();
        let mut favorites: Vec<FavoriteEntry> = self.read_local(now)?;
        let Some(entry) = favorites.iter_mut().find(|f| f.url == url) else {
            return Err(Error::EntryNotFound {
                collection: Collection::Favorites.to_string(),
                key: url.to_string(),
                similar: find_similar_keys(url, favorites.iter().map(|f| f.url.as_str()), 3),
            });
        };
        entry.pinned = pinned;
        entry.touch(now);
        self.push_local(favorites).await
    }

    /// Store an edited collection locally, then push it with a sync pass
    /// or queue a full write.
    async fn push_local<T: FromRaw>(&self, mut records: Vec<T>) -> Result<MutationOutcome> {
        sort_canonical(&mut records);
        let value = serde_json::to_value(&records)?;
        self.write_local(T::COLLECTION, &value)?;

        if !self.must_queue() {
            if let SyncOutcome::Finished { reports, .. } = self.sync_data().await {
                if reports.iter().any(|r| r.collection == T::COLLECTION && r.is_ok()) {
                    return Ok(MutationOutcome::Applied);
                }
            }
        }

        let op = PendingOperation::new(
            T::COLLECTION,
            OperationKind::Write { records: value },
            self.clock.now(),
        );
        Ok(self.enqueue_and_drain(op).await)
    }

    // ── Remote I/O ────────────────────────────────────────────

    /// Read a remote collection, falling back to the cached snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NoSnapshot`] if the remote read fails and
    /// nothing is cached for the path.
    pub async fn read_remote(&self, collection: Collection) -> SyncResult<Value> {
        let path = self.remote_path(collection);
        self.fetch_remote(&path, true).await.map(|(value, _)| value)
    }

    /// Returns the document and whether it came from the cache.
    async fn fetch_remote(&self, path: &str, allow_cache: bool) -> SyncResult<(Value, bool)> {
        match self.with_refresh(|| self.remote.get_metadata(path)).await {
            Ok(meta) => trace!(path, size = meta.size, "Remote file present"),
            Err(SyncError::Remote(e)) if e.is_not_found() => return self.create_empty(path).await,
            Err(SyncError::Unauthenticated) => {
                return self.fallback(path, allow_cache, SyncError::Unauthenticated);
            }
            Err(e) => debug!(path, error = %e, "Metadata check failed, trying download"),
        }

        match self.with_refresh(|| self.remote.download(path)).await {
            Ok(bytes) => {
                let value = serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                    warn!(path, error = %e, "Remote file is not JSON, treating as empty");
                    Value::Null
                });
                self.cache.put(path, value.clone(), self.clock.now());
                Ok((value, false))
            }
            Err(SyncError::Remote(e)) if e.is_not_found() => Ok((json!([]), false)),
            Err(e) => self.fallback(path, allow_cache, e),
        }
    }

    fn fallback(&self, path: &str, allow_cache: bool, err: SyncError) -> SyncResult<(Value, bool)> {
        if !allow_cache {
            return Err(err);
        }
        match self.cache.get(path) {
            Some(blob) => {
                info!(path, error = %err, cached_at = blob.cached_at, "Remote read failed, using cached snapshot");
                Ok((blob.content, true))
            }
            None => {
                warn!(path, error = %err, "Remote read failed and nothing is cached");
                Err(SyncError::NoSnapshot(path.to_string()))
            }
        }
    }

    async fn create_empty(&self, path: &str) -> SyncResult<(Value, bool)> {
        info!(path, "Remote file missing, creating it");
        if let Err(e) = self
            .with_refresh(|| self.remote.upload(path, b"[]", UploadMode::CreateIfAbsent))
            .await
        {
            warn!(path, error = %e, "Could not create remote file");
        }
        let empty = json!([]);
        self.cache.put(path, empty.clone(), self.clock.now());
        Ok((empty, false))
    }

    async fn write_remote(&self, path: &str, value: &Value) -> SyncResult<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.with_refresh(|| self.remote.upload(path, &bytes, UploadMode::Overwrite))
            .await?;
        self.cache.put(path, value.clone(), self.clock.now());
        Ok(())
    }

    /// Run `call`; on 401 refresh once and retry once.
    async fn with_refresh<T, F, Fut>(&self, call: F) -> SyncResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = std::result::Result<T, RemoteError>>,
    {
        match call().await {
            Err(e) if e.is_unauthorized() => {}
            other => return other.map_err(SyncError::from),
        }

        info!("Remote rejected access token, refreshing");
        if !self.auth.refresh_token().await {
            self.lose_auth("token refresh failed");
            return Err(SyncError::Unauthenticated);
        }
        self.record(Event::new(EventType::TokenRefreshed));
        call().await.map_err(SyncError::from)
    }

    // ── Local I/O ─────────────────────────────────────────────

    fn read_local<T: FromRaw>(&self, now: i64) -> Result<Vec<T>> {
        let key = T::COLLECTION.local_key();
        let value = match self.local.get_item(key)? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(key, error = %e, "Local collection is not JSON, treating as empty");
                Value::Null
            }),
            None => Value::Null,
        };
        Ok(normalize(&value, now))
    }

    fn write_local(&self, collection: Collection, value: &Value) -> Result<()> {
        self.local.set_item(collection.local_key(), &value.to_string())
    }

    // ── Session ───────────────────────────────────────────────

    fn lock_session(&self) -> MutexGuard<'_, SyncSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: SyncState) {
        let previous = std::mem::replace(&mut self.lock_session().state, state);
        if previous != state {
            debug!(from = %previous, to = %state, "Sync state");
        }
    }

    fn not_ready(&self) -> Option<SkipReason> {
        let session = self.lock_session();
        if !session.online {
            return Some(SkipReason::Offline);
        }
        (session.state != SyncState::Ready).then_some(SkipReason::NotReady(session.state))
    }

    fn lose_auth(&self, reason: &str) {
        warn!(reason, "Sync unavailable until the next online transition");
        self.set_state(SyncState::Unauthenticated);
        self.record(Event::new(EventType::AuthLost).with_detail(reason));
    }

    fn record(&self, mut event: Event) {
        event.created_at = self.clock.now();
        if let Err(e) = self.local.record_event(&event) {
            warn!(error = %e, event = event.event_type.as_str(), "Failed to record sync event");
        }
    }
}

/// Pick `records[order[i]]` into position `i`.
///
/// Out-of-range and repeated indices are ignored; entries the order does not
/// mention keep their relative order after the picked ones.
fn reorder_records<T: Record>(records: Vec<T>, order: &[usize], now: i64) -> Vec<T> {
    let mut slots: Vec<Option<T>> = records.into_iter().map(Some).collect();
    let mut picked: Vec<T> = order
        .iter()
        .filter_map(|&i| slots.get_mut(i).and_then(Option::take))
        .collect();
    picked.extend(slots.into_iter().flatten());

    for (position, record) in picked.iter_mut().enumerate() {
        record.place(position, now);
    }
    picked
}
