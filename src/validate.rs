//! Input validation and typo recovery.
//!
//! Collection names are resolved in three tiers: exact match → synonym
//! lookup → error with suggestion. Unknown entry keys get "did you mean"
//! suggestions by edit distance.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::model::Collection;

pub static COLLECTION_SYNONYMS: LazyLock<HashMap<&str, Collection>> = LazyLock::new(|| {
    [
        ("search", Collection::History),
        ("searches", Collection::History),
        ("searchhistory", Collection::History),
        ("search_history", Collection::History),
        ("terms", Collection::History),
        ("favorite", Collection::Favorites),
        ("favourite", Collection::Favorites),
        ("favourites", Collection::Favorites),
        ("fav", Collection::Favorites),
        ("favs", Collection::Favorites),
        ("sites", Collection::Favorites),
        ("tiles", Collection::Favorites),
        ("mostvisited", Collection::Favorites),
        ("most_visited", Collection::Favorites),
    ]
    .into_iter()
    .collect()
});

/// Resolve a collection name.
///
/// Returns the collection, or the original input with an optional
/// suggestion.
pub fn parse_collection(input: &str) -> Result<Collection, (String, Option<String>)> {
    let lower = input.trim().to_lowercase();

    if let Some(&collection) = Collection::ALL.iter().find(|c| c.as_str() == lower) {
        return Ok(collection);
    }

    if let Some(&collection) = COLLECTION_SYNONYMS.get(lower.as_str()) {
        return Ok(collection);
    }

    let suggestion = Collection::ALL
        .iter()
        .map(|c| (c.as_str(), *c))
        .chain(COLLECTION_SYNONYMS.iter().map(|(k, v)| (*k, *v)))
        .map(|(name, c)| (levenshtein_distance(&lower, name), c))
        .filter(|(dist, _)| *dist <= 3)
        .min_by_key(|(dist, c)| (*dist, c.as_str()))
        .map(|(_, c)| c.as_str().to_string());

    Err((input.to_string(), suggestion))
}

/// clap value parser for collection arguments.
///
/// # Errors
///
/// Returns a message naming the closest collection, if any.
pub fn collection_arg(input: &str) -> Result<Collection, String> {
    parse_collection(input).map_err(|(original, suggestion)| match suggestion {
        Some(s) => format!("unknown collection '{original}' (did you mean '{s}'?)"),
        None => format!("unknown collection '{original}' (expected 'history' or 'favorites')"),
    })
}

// ── Levenshtein distance ─────────────────────────────────────

/// Compute the Levenshtein edit distance between two strings.
#[must_use]
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Find stored keys similar to the searched one.
///
/// Returns up to `max` suggestions with edit distance ≤ 3, sorted by
/// distance then alphabetically.
#[must_use]
pub fn find_similar_keys<'a, I>(searched: &str, existing: I, max: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut candidates: Vec<(usize, &str)> = existing
        .into_iter()
        .map(|key| (levenshtein_distance(searched, key), key))
        .filter(|(dist, _)| *dist <= 3)
        .collect();

    candidates.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
    candidates.dedup_by(|a, b| a.1 == b.1);

    candidates
        .into_iter()
        .take(max)
        .map(|(_, key)| key.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_collection() {
        assert_eq!(parse_collection("history"), Ok(Collection::History));
        assert_eq!(parse_collection("FAVORITES"), Ok(Collection::Favorites));
        assert_eq!(parse_collection("favs"), Ok(Collection::Favorites));
        assert_eq!(parse_collection("searches"), Ok(Collection::History));
    }

    #[test]
    fn test_parse_collection_suggests() {
        let (input, suggestion) = parse_collection("histroy").unwrap_err();
        assert_eq!(input, "histroy");
        assert_eq!(suggestion.as_deref(), Some("history"));

        let (_, suggestion) = parse_collection("zzzzzzzzzz").unwrap_err();
        assert_eq!(suggestion, None);
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("abc", "abc"), 0);
        assert_eq!(levenshtein_distance("abc", "abd"), 1);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn test_find_similar_keys() {
        let keys = ["rust", "rustc", "tokio"];
        let result = find_similar_keys("rsut", keys, 3);
        assert_eq!(result.first().map(String::as_str), Some("rust"));
        assert!(!result.contains(&"tokio".to_string()));
    }
}
