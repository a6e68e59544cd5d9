//! Last-known-good remote snapshots.
//!
//! Written after every successful remote read or write and consulted only
//! when a remote read fails. Never pushed back to the remote. Lives for the
//! process; one entry per remote path.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use serde_json::Value;

use super::hash::content_hash;

/// A cached remote document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedBlob {
    pub path: String,
    pub content: Value,
    pub cached_at: i64,
    pub content_hash: String,
}

#[derive(Debug, Default)]
pub struct RemoteFileCache {
    entries: Mutex<HashMap<String, CachedBlob>>,
}

impl RemoteFileCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot for `path`.
    pub fn put(&self, path: &str, content: Value, now: i64) {
        let blob = CachedBlob {
            path: path.to_string(),
            content_hash: content_hash(&content),
            content,
            cached_at: now,
        };
        self.lock().insert(path.to_string(), blob);
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<CachedBlob> {
        self.lock().get(path).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CachedBlob>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_put_replaces_snapshot() {
        let cache = RemoteFileCache::new();
        assert!(cache.get("/favorites.json").is_none());

        cache.put("/favorites.json", json!([]), 1);
        cache.put("/favorites.json", json!([{"url": "https://a.test"}]), 2);

        let blob = cache.get("/favorites.json").unwrap();
        assert_eq!(blob.cached_at, 2);
        assert_eq!(blob.content, json!([{"url": "https://a.test"}]));
        assert_eq!(blob.content_hash, content_hash(&blob.content));
    }
}
