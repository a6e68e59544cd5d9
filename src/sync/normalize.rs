//! Raw storage shapes → canonical records.
//!
//! Local storage and remote files may hold either the legacy form (a list of
//! bare key strings) or the structured form (a list of partial objects).
//! Each element is decoded into a [`RawRecord`] and completed with
//! per-collection defaults. Elements without a usable natural key are
//! dropped.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::model::{FavoriteEntry, Record, SearchHistoryEntry};

/// One element of a stored collection before normalization.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawRecord {
    /// Legacy form: just the natural key.
    Term(String),
    /// Structured form with any subset of the fields.
    Partial(Map<String, Value>),
}

/// Completion of a raw record into a canonical one.
pub trait FromRaw: Record {
    /// Build the canonical record, or `None` if no natural key is present.
    fn from_raw(raw: RawRecord, now: i64) -> Option<Self>;
}

/// Normalize a stored collection.
///
/// Non-array input yields an empty collection. Canonical input comes back
/// unchanged.
#[must_use]
pub fn normalize<R: FromRaw>(value: &Value, now: i64) -> Vec<R> {
    let Some(items) = value.as_array() else {
        if !value.is_null() {
            debug!(collection = %R::COLLECTION, "Ignoring non-array collection");
        }
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let record = RawRecord::deserialize(item)
                .ok()
                .and_then(|raw| R::from_raw(raw, now));
            if record.is_none() {
                debug!(collection = %R::COLLECTION, %item, "Dropping record without key");
            }
            record
        })
        .collect()
}

fn key_field(map: &Map<String, Value>, field: &str) -> Option<String> {
    map.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn usable_key(s: String) -> Option<String> {
    (!s.trim().is_empty()).then_some(s)
}

/// Timestamps of `0` or of the wrong type count as missing.
fn timestamp_field(map: &Map<String, Value>, field: &str, now: i64) -> i64 {
    map.get(field)
        .and_then(|v| {
            v.as_i64()
                .or_else(|| v.as_f64().map(|f| f as i64))
        })
        .filter(|ts| *ts != 0)
        .unwrap_or(now)
}

fn string_field(map: &Map<String, Value>, field: &str) -> String {
    map.get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

impl FromRaw for SearchHistoryEntry {
    fn from_raw(raw: RawRecord, now: i64) -> Option<Self> {
        match raw {
            RawRecord::Term(term) => usable_key(term).map(|t| Self::new(t, now)),
            RawRecord::Partial(map) => {
                let term = key_field(&map, "term")?;
                Some(Self::new(term, timestamp_field(&map, "lastSearched", now)))
            }
        }
    }
}

impl FromRaw for FavoriteEntry {
    fn from_raw(raw: RawRecord, now: i64) -> Option<Self> {
        match raw {
            RawRecord::Term(url) => usable_key(url).map(|url| Self {
                url,
                title: String::new(),
                favicon: String::new(),
                pinned: false,
                order: 0,
                last_modified: now,
            }),
            RawRecord::Partial(map) => Some(Self {
                url: key_field(&map, "url")?,
                title: string_field(&map, "title"),
                favicon: string_field(&map, "favicon"),
                pinned: map.get("pinned").and_then(Value::as_bool).unwrap_or(false),
                order: map.get("order").and_then(Value::as_i64).unwrap_or(0),
                last_modified: timestamp_field(&map, "lastModified", now),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn test_history_accepts_legacy_strings() {
        let out: Vec<SearchHistoryEntry> = normalize(&json!(["rust", "tokio"]), NOW);
        assert_eq!(
            out,
            vec![
                SearchHistoryEntry::new("rust", NOW),
                SearchHistoryEntry::new("tokio", NOW)
            ]
        );
    }

    #[test]
    fn test_history_fills_missing_timestamp() {
        let out: Vec<SearchHistoryEntry> =
            normalize(&json!([{"term": "a"}, {"term": "b", "lastSearched": 7}]), NOW);
        assert_eq!(out[0].last_searched, NOW);
        assert_eq!(out[1].last_searched, 7);
    }

    #[test]
    fn test_favorite_defaults() {
        let out: Vec<FavoriteEntry> = normalize(&json!([{"url": "https://a.test"}]), NOW);
        assert_eq!(
            out,
            vec![FavoriteEntry {
                url: "https://a.test".into(),
                title: String::new(),
                favicon: String::new(),
                pinned: false,
                order: 0,
                last_modified: NOW,
            }]
        );
    }

    #[test]
    fn test_drops_records_without_key() {
        let out: Vec<FavoriteEntry> = normalize(
            &json!([{"title": "no url"}, {"url": "  "}, {"url": 42}, 17, null, {"url": "https://ok.test"}]),
            NOW,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].url, "https://ok.test");

        let out: Vec<SearchHistoryEntry> = normalize(&json!(["", {"term": ""}, "kept"]), NOW);
        assert_eq!(out, vec![SearchHistoryEntry::new("kept", NOW)]);
    }

    #[test]
    fn test_non_array_is_empty() {
        assert!(normalize::<SearchHistoryEntry>(&json!({"term": "x"}), NOW).is_empty());
        assert!(normalize::<FavoriteEntry>(&Value::Null, NOW).is_empty());
    }

    #[test]
    fn test_canonical_input_round_trips() {
        let canonical = vec![
            FavoriteEntry {
                url: "https://a.test".into(),
                title: "a.test".into(),
                favicon: "https://a.test/favicon.ico".into(),
                pinned: true,
                order: 3,
                last_modified: 42,
            },
            FavoriteEntry {
                url: "https://b.test".into(),
                title: "B".into(),
                favicon: String::new(),
                pinned: false,
                order: 0,
                last_modified: 41,
            },
        ];
        let value = serde_json::to_value(&canonical).unwrap();
        assert_eq!(normalize::<FavoriteEntry>(&value, NOW), canonical);

        let history = vec![SearchHistoryEntry::new("x", 5)];
        let value = serde_json::to_value(&history).unwrap();
        assert_eq!(normalize::<SearchHistoryEntry>(&value, NOW), history);
    }
}
