//! Local durable storage for startsync.
//!
//! The sync core treats local storage as always available and synchronous,
//! the way the browser build treats `localStorage`:
//! - [`LocalStore`] - the key/value capability the core depends on
//! - [`sqlite`] - SQLite implementation (WAL, one table of JSON documents)
//! - [`memory`] - in-memory implementation for tests
//! - [`events`] - sync event log
//! - [`schema`] - database schema definitions

pub mod events;
pub mod memory;
pub mod schema;
pub mod sqlite;

pub use events::{Event, EventType};
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use crate::error::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Synchronous key/value storage with `localStorage` semantics.
pub trait LocalStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<()>;

    /// Append an entry to the sync log. Stores without a log ignore it.
    fn record_event(&self, _event: &Event) -> Result<()> {
        Ok(())
    }
}

impl<T: LocalStore + ?Sized> LocalStore for Arc<T> {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        (**self).remove_item(key)
    }

    fn record_event(&self, event: &Event) -> Result<()> {
        (**self).record_event(event)
    }
}

/// Read and deserialize the JSON document under `key`.
///
/// # Errors
///
/// Returns an error if the store fails or the document is not valid JSON
/// for `T`.
pub fn read_json<T: DeserializeOwned>(store: &impl LocalStore, key: &str) -> Result<Option<T>> {
    match store.get_item(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Serialize `value` as JSON and store it under `key`.
///
/// # Errors
///
/// Returns an error if serialization or the store fails.
pub fn write_json<T: Serialize + ?Sized>(store: &impl LocalStore, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    store.set_item(key, &raw)
}
