//! Search history model.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::{Collection, Record};

/// One remembered search term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHistoryEntry {
    /// The search term (natural key).
    pub term: String,

    /// When the term was last searched (Unix milliseconds).
    pub last_searched: i64,
}

impl SearchHistoryEntry {
    #[must_use]
    pub fn new(term: impl Into<String>, last_searched: i64) -> Self {
        Self {
            term: term.into(),
            last_searched,
        }
    }
}

impl Record for SearchHistoryEntry {
    const COLLECTION: Collection = Collection::History;

    fn key(&self) -> &str {
        &self.term
    }

    fn recency(&self) -> i64 {
        self.last_searched
    }

    /// Most recent first.
    fn display_order(a: &Self, b: &Self) -> Ordering {
        b.last_searched.cmp(&a.last_searched)
    }

    fn touch(&mut self, now: i64) {
        self.last_searched = now;
    }
}

/// Move `term` to the front of the history, stamping it with `now`.
///
/// An existing entry for the same term is replaced rather than duplicated.
pub fn push_recent(entries: &mut Vec<SearchHistoryEntry>, term: &str, now: i64) {
    entries.retain(|e| e.term != term);
    entries.insert(0, SearchHistoryEntry::new(term, now));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_recent_moves_to_front() {
        let mut entries = vec![
            SearchHistoryEntry::new("rust", 10),
            SearchHistoryEntry::new("tokio", 5),
        ];
        push_recent(&mut entries, "tokio", 20);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], SearchHistoryEntry::new("tokio", 20));
        assert_eq!(entries[1].term, "rust");
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(SearchHistoryEntry::new("a", 1)).unwrap();
        assert_eq!(json, serde_json::json!({"term": "a", "lastSearched": 1}));
    }
}
