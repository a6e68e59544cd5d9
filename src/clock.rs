//! Wall-clock source.
//!
//! Every timestamp the sync core writes (`lastSearched`, `lastModified`,
//! queue `enqueuedAt`, token expiry) comes through a [`Clock`] so tests can
//! pin or advance time.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of Unix epoch milliseconds.
#[derive(Clone)]
pub struct Clock(Arc<dyn Fn() -> i64 + Send + Sync>);

impl Clock {
    /// The system clock.
    #[must_use]
    pub fn system() -> Self {
        Self(Arc::new(|| chrono::Utc::now().timestamp_millis()))
    }

    /// A clock that always reads `ms`.
    #[must_use]
    pub fn fixed(ms: i64) -> Self {
        Self(Arc::new(move || ms))
    }

    /// A clock driven by a shared counter the caller can move.
    #[must_use]
    pub fn manual(start: i64) -> (Self, Arc<AtomicI64>) {
        let now = Arc::new(AtomicI64::new(start));
        let handle = Arc::clone(&now);
        (Self(Arc::new(move || handle.load(Ordering::SeqCst))), now)
    }

    #[must_use]
    pub fn now(&self) -> i64 {
        (self.0)()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::system()
    }
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Clock").field(&self.now()).finish()
    }
}

/// Format a millisecond timestamp as RFC 3339 for display.
#[must_use]
pub fn format_ms(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map_or_else(|| ms.to_string(), |dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let (clock, handle) = Clock::manual(100);
        assert_eq!(clock.now(), 100);
        handle.store(250, Ordering::SeqCst);
        assert_eq!(clock.now(), 250);
    }

    #[test]
    fn test_format_ms() {
        assert_eq!(format_ms(0), "1970-01-01 00:00:00 UTC");
    }
}
