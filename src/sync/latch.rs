//! Single-flight latch shared by sync passes and queue drains.

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct Latch(AtomicBool);

impl Latch {
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Take the latch, or `None` if someone else holds it.
    #[must_use]
    pub fn try_acquire(&self) -> Option<LatchGuard<'_>> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| LatchGuard(&self.0))
    }

    #[must_use]
    pub fn is_held(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Releases the latch on drop.
#[derive(Debug)]
pub struct LatchGuard<'a>(&'a AtomicBool);

impl Drop for LatchGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails_until_release() {
        let latch = Latch::new();
        let guard = latch.try_acquire();
        assert!(guard.is_some());
        assert!(latch.is_held());
        assert!(latch.try_acquire().is_none());

        drop(guard);
        assert!(!latch.is_held());
        assert!(latch.try_acquire().is_some());
    }
}
