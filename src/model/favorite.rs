//! Favorite site model.
//!
//! Favorites are the pinned/most-visited tiles on the start page. Their
//! canonical order is pinned tiles first, then the user's drag order, then
//! title.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::{Collection, Record};
use crate::error::{Error, Result};

/// A favorite site tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteEntry {
    /// Site URL (natural key).
    pub url: String,

    /// Display title.
    pub title: String,

    /// Favicon URL.
    pub favicon: String,

    /// Pinned tiles sort before unpinned ones.
    pub pinned: bool,

    /// Position within the pinned/unpinned group.
    pub order: i64,

    /// Last modification (Unix milliseconds).
    pub last_modified: i64,
}

impl FavoriteEntry {
    /// Build a tile from a URL the user typed.
    ///
    /// The title is the host without a leading `www.` and the favicon is
    /// the conventional `/favicon.ico` of that host.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the URL does not parse or has no host.
    pub fn from_url(url: &str, now: i64) -> Result<Self> {
        let parsed = Url::parse(url).map_err(|e| Error::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let host = parsed.host_str().ok_or_else(|| Error::InvalidUrl {
            url: url.to_string(),
            reason: "URL has no host".to_string(),
        })?;

        Ok(Self {
            url: url.to_string(),
            title: host.trim_start_matches("www.").to_string(),
            favicon: format!("https://{host}/favicon.ico"),
            pinned: false,
            order: 0,
            last_modified: now,
        })
    }
}

impl Record for FavoriteEntry {
    const COLLECTION: Collection = Collection::Favorites;

    fn key(&self) -> &str {
        &self.url
    }

    fn recency(&self) -> i64 {
        self.last_modified
    }

    fn display_order(a: &Self, b: &Self) -> Ordering {
        b.pinned
            .cmp(&a.pinned)
            .then(a.order.cmp(&b.order))
            .then_with(|| a.title.cmp(&b.title))
    }

    fn touch(&mut self, now: i64) {
        self.last_modified = now;
    }

    fn place(&mut self, position: usize, now: i64) {
        self.order = i64::try_from(position).unwrap_or(i64::MAX);
        self.last_modified = now;
    }
}
