//! Last-writer-wins merge of two collections.
//!
//! The map is seeded from the local side; a remote entry replaces a local
//! one only when its recency is strictly greater, so exact ties keep the
//! local entry. The result is sorted into the collection's canonical order
//! with a stable sort, so entries that compare equal keep the order they
//! were first seen in.

use std::collections::HashMap;

use crate::model::{Record, sort_canonical};

use super::types::MergeStats;

/// Merge canonical `local` and `remote` collections.
#[must_use]
pub fn merge<R: Record>(local: Vec<R>, remote: Vec<R>) -> (Vec<R>, MergeStats) {
    let mut stats = MergeStats::default();
    let mut merged: Vec<R> = Vec::with_capacity(local.len() + remote.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(merged.capacity());

    for entry in local {
        match index.get(entry.key()) {
            // Duplicate keys within one side: last one wins, position kept.
            Some(&at) => merged[at] = entry,
            None => {
                index.insert(entry.key().to_string(), merged.len());
                merged.push(entry);
            }
        }
    }
    let local_len = merged.len();

    for entry in remote {
        match index.get(entry.key()) {
            Some(&at) if at < local_len => {
                if entry.recency() > merged[at].recency() {
                    stats.taken_remote += 1;
                    merged[at] = entry;
                } else {
                    stats.kept_local += 1;
                }
            }
            Some(&at) => {
                if entry.recency() > merged[at].recency() {
                    merged[at] = entry;
                }
            }
            None => {
                stats.added_remote += 1;
                index.insert(entry.key().to_string(), merged.len());
                merged.push(entry);
            }
        }
    }

    sort_canonical(&mut merged);
    (merged, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FavoriteEntry, SearchHistoryEntry};

    fn fav(url: &str, title: &str, pinned: bool, order: i64, modified: i64) -> FavoriteEntry {
        FavoriteEntry {
            url: url.into(),
            title: title.into(),
            favicon: String::new(),
            pinned,
            order,
            last_modified: modified,
        }
    }

    #[test]
    fn test_newer_remote_wins() {
        let (out, stats) = merge(
            vec![SearchHistoryEntry::new("a", 100)],
            vec![SearchHistoryEntry::new("a", 200)],
        );
        assert_eq!(out, vec![SearchHistoryEntry::new("a", 200)]);
        assert_eq!(stats.taken_remote, 1);
    }

    #[test]
    fn test_older_remote_loses() {
        let (out, stats) = merge(
            vec![SearchHistoryEntry::new("a", 100)],
            vec![SearchHistoryEntry::new("a", 50)],
        );
        assert_eq!(out, vec![SearchHistoryEntry::new("a", 100)]);
        assert_eq!(stats.kept_local, 1);
    }

    #[test]
    fn test_tie_keeps_local() {
        let local = fav("https://a.test", "local", false, 0, 10);
        let remote = fav("https://a.test", "remote", false, 0, 10);
        let (out, _) = merge(vec![local.clone()], vec![remote]);
        assert_eq!(out, vec![local]);
    }

    #[test]
    fn test_history_sorted_most_recent_first() {
        let (out, stats) = merge(
            vec![SearchHistoryEntry::new("old", 1)],
            vec![SearchHistoryEntry::new("new", 3), SearchHistoryEntry::new("mid", 2)],
        );
        let terms: Vec<_> = out.iter().map(|e| e.term.as_str()).collect();
        assert_eq!(terms, ["new", "mid", "old"]);
        assert_eq!(stats.added_remote, 2);
    }

    #[test]
    fn test_pinned_favorites_first() {
        let unpinned = fav("https://b.test", "B", false, 5, 1);
        let pinned = fav("https://a.test", "A", true, 9, 1);
        let (out, _) = merge(vec![unpinned.clone()], vec![pinned.clone()]);
        assert_eq!(out, vec![pinned, unpinned]);
    }

    #[test]
    fn test_favorites_order_then_title() {
        let (out, _) = merge(
            vec![
                fav("https://c.test", "c", false, 1, 1),
                fav("https://b.test", "b", false, 0, 1),
                fav("https://a.test", "a", false, 1, 1),
            ],
            Vec::new(),
        );
        let titles: Vec<_> = out.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["b", "a", "c"]);
    }

    #[test]
    fn test_merge_with_self_is_sorted_input() {
        let history = vec![
            SearchHistoryEntry::new("a", 1),
            SearchHistoryEntry::new("b", 2),
        ];
        let (out, _) = merge(history.clone(), history.clone());
        let mut expected = history;
        sort_canonical(&mut expected);
        assert_eq!(out, expected);

        let favorites = vec![
            fav("https://x.test", "x", false, 2, 5),
            fav("https://y.test", "y", true, 0, 6),
        ];
        let (out, _) = merge(favorites.clone(), favorites.clone());
        let mut expected = favorites;
        sort_canonical(&mut expected);
        assert_eq!(out, expected);
    }

    #[test]
    fn test_equal_sort_keys_keep_first_seen_order() {
        let (out, _) = merge(
            vec![SearchHistoryEntry::new("first", 5)],
            vec![SearchHistoryEntry::new("second", 5)],
        );
        assert_eq!(out[0].term, "first");
        assert_eq!(out[1].term, "second");
    }
}
