//! Collection identifiers.

use serde::{Deserialize, Serialize};

/// The two collections kept in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    History,
    Favorites,
}

impl Collection {
    /// Both collections, in the order a sync pass reports them.
    pub const ALL: [Self; 2] = [Self::History, Self::Favorites];

    /// Get the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::History => "history",
            Self::Favorites => "favorites",
        }
    }

    /// Key under which local storage holds this collection.
    ///
    /// These match the keys the browser build writes to `localStorage`.
    #[must_use]
    pub const fn local_key(&self) -> &'static str {
        match self {
            Self::History => "searchHistory",
            Self::Favorites => "mostVisited",
        }
    }

    /// File name of this collection inside the remote root.
    #[must_use]
    pub const fn remote_file_name(&self) -> &'static str {
        match self {
            Self::History => "search_history.json",
            Self::Favorites => "favorites.json",
        }
    }

    /// Remote path of this collection under `root` (e.g. `""` or `/startpage`).
    #[must_use]
    pub fn remote_path(&self, root: &str) -> String {
        format!("{}/{}", root.trim_end_matches('/'), self.remote_file_name())
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_path_joins_root() {
        assert_eq!(Collection::History.remote_path(""), "/search_history.json");
        assert_eq!(
            Collection::Favorites.remote_path("/startpage/"),
            "/startpage/favorites.json"
        );
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Collection::Favorites).unwrap();
        assert_eq!(json, "\"favorites\"");
    }
}
