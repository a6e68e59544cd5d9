//! Shared command plumbing: config, database and coordinator wiring.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use crate::auth::{AuthError, DropboxAuth, DropboxOAuth, TokenStore};
use crate::clock::Clock;
use crate::config::{AppConfig, resolve_db_path};
use crate::error::{Error, Result};
use crate::model::sort_canonical;
use crate::net::{ConnectivityProbe, HttpProbe};
use crate::remote::{DropboxEndpoints, DropboxStore, RemoteError};
use crate::storage::SqliteStorage;
use crate::sync::{FromRaw, MutationOutcome, SyncCoordinator, SyncState, normalize};

/// How long the pre-flight connectivity check may take.
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

pub type Storage = Arc<SqliteStorage>;
pub type Auth = DropboxAuth<Storage, DropboxOAuth>;
pub type Coordinator = SyncCoordinator<Option<Auth>, DropboxStore<Storage>, Storage>;

/// Resolved config plus the opened database.
pub struct App {
    pub config: AppConfig,
    pub db_path: PathBuf,
    pub storage: Storage,
    pub clock: Clock,
}

impl App {
    /// Load config and open an initialized database.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] if the database file does not exist.
    pub fn open(db_path: Option<&PathBuf>) -> Result<Self> {
        let config = AppConfig::resolve()?;
        let db_path = resolve_db_path(db_path.map(PathBuf::as_path), &config)
            .ok_or(Error::NotInitialized)?;

        if !db_path.exists() {
            return Err(Error::NotInitialized);
        }

        let storage = Arc::new(SqliteStorage::open(&db_path)?);
        Ok(Self {
            config,
            db_path,
            storage,
            clock: Clock::system(),
        })
    }

    #[must_use]
    pub fn tokens(&self) -> TokenStore<Storage> {
        TokenStore::new(Arc::clone(&self.storage))
    }

    /// Dropbox auth provider built from the configured app key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] if no app key is configured.
    pub fn dropbox_auth(&self) -> Result<Auth> {
        let oauth = DropboxOAuth::new(
            self.config.client_id.clone().unwrap_or_default(),
            self.config.client_secret.clone(),
            self.config.request_timeout(),
        )?;
        Ok(DropboxAuth::new(self.tokens(), oauth, self.clock.clone()))
    }

    /// Build a coordinator. Without an app key it never authenticates and
    /// every mutation is queued.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted queue cannot be read.
    pub fn coordinator(&self) -> Result<Coordinator> {
        let auth = match self.dropbox_auth() {
            Ok(auth) => Some(auth),
            Err(e) => {
                debug!(error = %e, "Dropbox not configured, working offline");
                None
            }
        };
        let remote = DropboxStore::new(
            self.tokens(),
            DropboxEndpoints::default(),
            self.config.request_timeout(),
        );
        SyncCoordinator::new(
            auth,
            remote,
            Arc::clone(&self.storage),
            self.config.coordinator_settings(),
            self.clock.clone(),
        )
    }

    /// Build a coordinator, connect it when that can succeed and replay
    /// anything queued.
    ///
    /// Skips the network entirely when nothing is configured or stored, so
    /// offline use never waits on timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if local storage fails.
    pub async fn connect(&self) -> Result<Coordinator> {
        let sync = self.coordinator()?;
        if sync.auth().is_none() || self.tokens().load()?.is_none() {
            debug!("No credentials stored, changes will be queued");
            return Ok(sync);
        }

        let probe = HttpProbe::new(HttpProbe::DEFAULT_URL, PROBE_TIMEOUT);
        if !probe.is_online().await {
            info!("Dropbox unreachable, changes will be queued");
            sync.set_online(false).await;
            return Ok(sync);
        }

        if sync.connect().await && !sync.queue().is_empty() {
            sync.drain_queue().await;
        }
        Ok(sync)
    }

    /// Explain why `sync` is not connected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] for missing or rejected credentials and
    /// [`Error::Remote`] when Dropbox is unreachable.
    pub fn ensure_connected(&self, sync: &Coordinator) -> Result<()> {
        if sync.state().is_connected() {
            return Ok(());
        }
        if sync.auth().is_none() {
            return Err(AuthError::MissingCredentials(
                "set DROPBOX_CLIENT_ID or clientId in the config".to_string(),
            )
            .into());
        }
        if self.tokens().load()?.is_none() {
            return Err(AuthError::NoRefreshToken.into());
        }
        if !sync.session().online {
            return Err(RemoteError::Transient("Dropbox is unreachable".to_string()).into());
        }
        let state = sync.state();
        if state == SyncState::Unauthenticated {
            return Err(AuthError::Rejected(
                "Dropbox did not accept the stored credentials".to_string(),
            )
            .into());
        }
        Err(Error::Other(format!("sync coordinator is {state}")))
    }

    /// The remote copy of a collection in display order.
    ///
    /// # Errors
    ///
    /// Returns an error if the coordinator cannot connect or the remote
    /// read fails with nothing cached.
    pub async fn remote_records<T: FromRaw>(&self) -> Result<Vec<T>> {
        let sync = self.connect().await?;
        self.ensure_connected(&sync)?;
        let value = sync.read_remote(T::COLLECTION).await?;
        let mut records: Vec<T> = normalize(&value, self.clock.now());
        sort_canonical(&mut records);
        Ok(records)
    }
}

/// Run `fut` on a fresh multi-threaded runtime.
///
/// # Errors
///
/// Returns an error if the runtime cannot be created, or the future's error.
pub fn block_on<T>(fut: impl Future<Output = Result<T>>) -> Result<T> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))?;
    rt.block_on(fut)
}

#[derive(Serialize)]
struct MutationOutput<'a> {
    action: &'a str,
    key: &'a str,
    outcome: MutationOutcome,
    pending_operations: usize,
}

/// Report a mutation result.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn print_mutation(
    action: &str,
    key: &str,
    outcome: MutationOutcome,
    pending_operations: usize,
    json: bool,
) -> Result<()> {
    if json {
        let output = MutationOutput {
            action,
            key,
            outcome,
            pending_operations,
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    match outcome {
        MutationOutcome::Applied => println!("{action}: {key}"),
        MutationOutcome::Queued => println!(
            "{action}: {key} (queued, {pending_operations} operation(s) waiting for sync)"
        ),
    }
    Ok(())
}
