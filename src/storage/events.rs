//! Sync event log.
//!
//! Events record what the sync core did (passes, queued and replayed
//! operations, auth transitions) so `startsync status` can report it after
//! the process that did the work has exited.

use rusqlite::{Connection, Result};
use serde::Serialize;

use crate::model::Collection;

/// Event types for the sync log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    SyncCompleted,
    SyncFailed,
    OperationQueued,
    OperationReplayed,
    ReplayFailed,
    TokenRefreshed,
    AuthLost,
}

impl EventType {
    /// Get the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SyncCompleted => "sync_completed",
            Self::SyncFailed => "sync_failed",
            Self::OperationQueued => "operation_queued",
            Self::OperationReplayed => "operation_replayed",
            Self::ReplayFailed => "replay_failed",
            Self::TokenRefreshed => "token_refreshed",
            Self::AuthLost => "auth_lost",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "sync_completed" => Some(Self::SyncCompleted),
            "sync_failed" => Some(Self::SyncFailed),
            "operation_queued" => Some(Self::OperationQueued),
            "operation_replayed" => Some(Self::OperationReplayed),
            "replay_failed" => Some(Self::ReplayFailed),
            "token_refreshed" => Some(Self::TokenRefreshed),
            "auth_lost" => Some(Self::AuthLost),
            _ => None,
        }
    }
}

/// A sync log record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub id: i64,
    pub event_type: EventType,
    pub collection: Option<Collection>,
    pub detail: Option<String>,
    pub created_at: i64,
}

impl Event {
    /// Create a new event (id will be assigned by database).
    #[must_use]
    pub fn new(event_type: EventType) -> Self {
        Self {
            id: 0,
            event_type,
            collection: None,
            detail: None,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    #[must_use]
    pub fn with_collection(mut self, collection: Collection) -> Self {
        self.collection = Some(collection);
        self
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Insert an event into the database.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_event(conn: &Connection, event: &Event) -> Result<i64> {
    conn.execute(
        "INSERT INTO sync_events (event_type, collection, detail, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            event.event_type.as_str(),
            event.collection.map(|c| c.as_str()),
            event.detail,
            event.created_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Get the most recent events, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn recent_events(conn: &Connection, limit: u32) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT id, event_type, collection, detail, created_at
         FROM sync_events
         ORDER BY created_at DESC, id DESC
         LIMIT ?1",
    )?;

    let rows = stmt.query_map([limit], |row| {
        let event_type: String = row.get(1)?;
        let collection: Option<String> = row.get(2)?;
        Ok((
            row.get::<_, i64>(0)?,
            event_type,
            collection,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, i64>(4)?,
        ))
    })?;

    let mut events = Vec::new();
    for row in rows {
        let (id, event_type, collection, detail, created_at) = row?;
        // Rows written by a newer build with unknown types are skipped
        let Some(event_type) = EventType::parse(&event_type) else {
            continue;
        };
        events.push(Event {
            id,
            event_type,
            collection: collection.as_deref().and_then(parse_collection),
            detail,
            created_at,
        });
    }
    Ok(events)
}

/// Timestamp of the last completed sync pass, if any.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn last_event_at(conn: &Connection, event_type: EventType) -> Result<Option<i64>> {
    conn.query_row(
        "SELECT MAX(created_at) FROM sync_events WHERE event_type = ?1",
        [event_type.as_str()],
        |row| row.get(0),
    )
}

fn parse_collection(s: &str) -> Option<Collection> {
    match s {
        "history" => Some(Collection::History),
        "favorites" => Some(Collection::Favorites),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema::apply_schema;

    #[test]
    fn test_event_insert_and_recent() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();

        let event = Event::new(EventType::OperationQueued)
            .with_collection(Collection::History)
            .with_detail("write op_123");

        let id = insert_event(&conn, &event).unwrap();
        assert!(id > 0);

        let events = recent_events(&conn, 10).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::OperationQueued);
        assert_eq!(events[0].collection, Some(Collection::History));
        assert_eq!(events[0].detail.as_deref(), Some("write op_123"));
    }

    #[test]
    fn test_last_event_at() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();
        assert_eq!(last_event_at(&conn, EventType::SyncCompleted).unwrap(), None);

        let mut event = Event::new(EventType::SyncCompleted);
        event.created_at = 1_000;
        insert_event(&conn, &event).unwrap();
        event.created_at = 2_000;
        insert_event(&conn, &event).unwrap();

        assert_eq!(
            last_event_at(&conn, EventType::SyncCompleted).unwrap(),
            Some(2_000)
        );
    }
}
