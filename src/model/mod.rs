//! Data models for startsync.
//!
//! This module contains the canonical record types of the two synced
//! collections and the trait the sync core is generic over:
//! - [`SearchHistoryEntry`] keyed by `term`
//! - [`FavoriteEntry`] keyed by `url`
//! - [`Collection`] naming the collection, its local key and remote file

pub mod collection;
pub mod favorite;
pub mod history;

pub use collection::Collection;
pub use favorite::FavoriteEntry;
pub use history::SearchHistoryEntry;

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::cmp::Ordering;
use std::fmt::Debug;

/// A canonical record of one synced collection.
///
/// The merge and the offline queue only ever see types implementing this
/// trait; raw storage shapes are converted at the boundary by
/// [`crate::sync::normalize`].
pub trait Record: Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync {
    /// Which collection this record belongs to.
    const COLLECTION: Collection;

    /// Natural key, unique within the collection.
    fn key(&self) -> &str;

    /// Recency field used to break merge conflicts (Unix milliseconds).
    fn recency(&self) -> i64;

    /// Canonical ordering of the collection.
    fn display_order(a: &Self, b: &Self) -> Ordering;

    /// Stamp the record as modified at `now`.
    fn touch(&mut self, now: i64);

    /// Apply a position from a user reorder made at `now`.
    ///
    /// Default is a no-op for collections whose order is derived from recency.
    fn place(&mut self, _position: usize, _now: i64) {}
}

/// Sort a collection into its canonical order (stable).
pub fn sort_canonical<R: Record>(records: &mut [R]) {
    records.sort_by(R::display_order);
}
