//! Task identifiers and their allocator.
//!
//! [`TaskId`] is the join key across the pending queue, the payload
//! registry, and the reply map. Identifiers are issued by [`IdAllocator`],
//! a plain atomic counter: strictly increasing, never reused within one
//! queue instance's lifetime.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Unique identifier of one submitted task, scoped to a single queue instance.
///
/// # Example
/// ```
/// use serialq::TaskId;
///
/// assert!(!TaskId::INVALID.is_valid());
/// assert_eq!(TaskId::INVALID.to_string(), "invalid");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TaskId(u64);

impl TaskId {
    /// Sentinel for handles minted while the owning queue was unreachable.
    ///
    /// A handle carrying this identifier settles immediately with
    /// [`QueueError::InvalidId`](crate::QueueError::InvalidId).
    pub const INVALID: TaskId = TaskId(u64::MAX);

    /// Returns `false` only for the [`TaskId::INVALID`] sentinel.
    #[inline]
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}", self.0)
        } else {
            f.write_str("invalid")
        }
    }
}

/// Issues strictly increasing identifiers, starting from 0.
///
/// A `u64` cannot realistically overflow within one process lifetime, so no
/// wraparound handling is needed.
pub(crate) struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    pub(crate) fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }

    /// Returns the next identifier. Side-effect-free beyond the increment.
    #[inline]
    pub(crate) fn obtain(&self) -> TaskId {
        TaskId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obtain_is_strictly_increasing() {
        let ids = IdAllocator::new();
        let mut prev = ids.obtain();
        for _ in 0..100 {
            let next = ids.obtain();
            assert!(next > prev);
            prev = next;
        }
    }

    #[test]
    fn test_fresh_ids_are_valid() {
        let ids = IdAllocator::new();
        assert!(ids.obtain().is_valid());
    }
}
