//! Content hashing for snapshot comparison.
//!
//! `status` compares the hash of the local collection with the hash of the
//! last remote snapshot to tell whether the two have diverged since the last
//! pass.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// SHA-256 of the JSON serialization of `value`, as lowercase hex.
///
/// Values that cannot be serialized hash as the empty document.
#[must_use]
pub fn content_hash<T: Serialize + ?Sized>(value: &T) -> String {
    let json = serde_json::to_vec(value).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&json);
    format!("{:x}", hasher.finalize())
}

/// Whether `current` differs from a previously recorded hash.
///
/// A missing record counts as changed.
#[must_use]
pub fn has_changed(current: &str, recorded: Option<&str>) -> bool {
    recorded.is_none_or(|h| h != current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_hash_deterministic() {
        let value = json!([{"term": "rust", "lastSearched": 1}]);
        let a = content_hash(&value);
        assert_eq!(a, content_hash(&value));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_content_hash_changes_with_content() {
        assert_ne!(
            content_hash(&json!([{"term": "a"}])),
            content_hash(&json!([{"term": "b"}]))
        );
    }

    #[test]
    fn test_has_changed() {
        assert!(has_changed("abc", None));
        assert!(has_changed("abc", Some("xyz")));
        assert!(!has_changed("abc", Some("abc")));
    }
}
