//! In-memory capabilities for coordinator tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use serde_json::Value;

use crate::auth::{AuthError, AuthProvider};
use crate::remote::{Account, Metadata, RemoteError, RemoteStore, UploadMode};

/// Remote store backed by a map of path → bytes, with failure switches.
#[derive(Debug, Default)]
pub struct FakeRemote {
    files: Mutex<HashMap<String, Vec<u8>>>,
    /// Reads (metadata and download) fail with a transient error.
    pub fail_reads: AtomicBool,
    /// Uploads fail with a transient error.
    pub fail_uploads: AtomicBool,
    /// Number of upcoming calls that answer 401.
    pub unauthorized_calls: AtomicUsize,
    pub uploads: AtomicUsize,
    pub downloads: AtomicUsize,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_json(&self, path: &str, value: &Value) {
        self.lock()
            .insert(path.to_string(), serde_json::to_vec(value).unwrap());
    }

    pub fn json(&self, path: &str) -> Option<Value> {
        self.lock()
            .get(path)
            .map(|bytes| serde_json::from_slice(bytes).unwrap())
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn reject_next(&self, calls: usize) {
        self.unauthorized_calls.store(calls, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn gate(&self) -> Result<(), RemoteError> {
        let pending = self.unauthorized_calls.load(Ordering::SeqCst);
        if pending > 0 {
            self.unauthorized_calls.store(pending - 1, Ordering::SeqCst);
            return Err(RemoteError::Unauthorized);
        }
        Ok(())
    }

    fn read_gate(&self) -> Result<(), RemoteError> {
        self.gate()?;
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RemoteError::Transient("read failure".into()));
        }
        Ok(())
    }

    fn metadata(path: &str, size: usize) -> Metadata {
        Metadata {
            name: path.trim_start_matches('/').to_string(),
            path_display: Some(path.to_string()),
            size: size as u64,
            rev: None,
            server_modified: None,
        }
    }
}

impl RemoteStore for FakeRemote {
    async fn current_account(&self) -> Result<Account, RemoteError> {
        self.gate()?;
        Ok(Account {
            account_id: "dbid:fake".into(),
            email: Some("user@example.com".into()),
        })
    }

    async fn get_metadata(&self, path: &str) -> Result<Metadata, RemoteError> {
        self.read_gate()?;
        self.lock()
            .get(path)
            .map(|bytes| Self::metadata(path, bytes.len()))
            .ok_or_else(|| RemoteError::NotFound(path.to_string()))
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, RemoteError> {
        self.read_gate()?;
        self.downloads.fetch_add(1, Ordering::SeqCst);
        self.lock()
            .get(path)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(path.to_string()))
    }

    async fn upload(&self, path: &str, bytes: &[u8], mode: UploadMode) -> Result<Metadata, RemoteError> {
        self.gate()?;
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(RemoteError::Transient("upload failure".into()));
        }
        let mut files = self.lock();
        if mode == UploadMode::CreateIfAbsent && files.contains_key(path) {
            return Err(RemoteError::Transient("path/conflict".into()));
        }
        files.insert(path.to_string(), bytes.to_vec());
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(Self::metadata(path, bytes.len()))
    }
}

/// Auth provider with switchable outcomes.
#[derive(Debug)]
pub struct FakeAuth {
    pub authenticated: AtomicBool,
    pub refresh_succeeds: AtomicBool,
    pub refresh_calls: AtomicUsize,
    pub authenticate_calls: AtomicUsize,
}

impl FakeAuth {
    pub fn signed_in() -> Self {
        Self {
            authenticated: AtomicBool::new(true),
            refresh_succeeds: AtomicBool::new(true),
            refresh_calls: AtomicUsize::new(0),
            authenticate_calls: AtomicUsize::new(0),
        }
    }

    pub fn signed_out() -> Self {
        let auth = Self::signed_in();
        auth.authenticated.store(false, Ordering::SeqCst);
        auth.refresh_succeeds.store(false, Ordering::SeqCst);
        auth
    }

    pub fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}

impl AuthProvider for FakeAuth {
    async fn initialize(&self) -> Result<(), AuthError> {
        Ok(())
    }

    async fn authenticate(&self) -> bool {
        self.authenticate_calls.fetch_add(1, Ordering::SeqCst);
        self.is_authenticated() || self.refresh_token().await
    }

    async fn refresh_token(&self) -> bool {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let ok = self.refresh_succeeds.load(Ordering::SeqCst);
        self.authenticated.store(ok, Ordering::SeqCst);
        ok
    }

    fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    fn clear_auth(&self) {
        self.authenticated.store(false, Ordering::SeqCst);
    }
}
