//! SQLite storage implementation.
//!
//! A key/value table with `localStorage` semantics. Every write is a single
//! autocommitted statement, so the store is always consistent after a crash.

use crate::error::Result;
use crate::storage::LocalStore;
use crate::storage::events::{self, Event, EventType, insert_event};
use crate::storage::schema::apply_schema;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// SQLite-based local store.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open a database at the given path.
    ///
    /// Creates the database and applies schema if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a database with an optional busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open_with_timeout(path: &Path, timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;

        // The daemon and one-shot commands may share the file
        conn.busy_timeout(Duration::from_millis(timeout_ms.unwrap_or(5_000)))?;

        apply_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All stored keys, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn keys(&self) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT key FROM kv_store ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
    }

    /// Most recent sync log entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn recent_events(&self, limit: u32) -> Result<Vec<Event>> {
        Ok(events::recent_events(&self.conn(), limit)?)
    }

    /// When the last sync pass completed (Unix milliseconds).
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn last_sync_at(&self) -> Result<Option<i64>> {
        Ok(events::last_event_at(&self.conn(), EventType::SyncCompleted)?)
    }
}

impl LocalStore for SqliteStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn()
            .query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.conn().execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            rusqlite::params![key, value, chrono::Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.conn()
            .execute("DELETE FROM kv_store WHERE key = ?1", [key])?;
        Ok(())
    }

    fn record_event(&self, event: &Event) -> Result<()> {
        insert_event(&self.conn(), event)?;
        Ok(())
    }
}
