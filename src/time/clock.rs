// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Logical clock shared by start and commit timestamps.

use std::sync::atomic::{AtomicU64, Ordering};

use super::Timestamp;

/// Monotonic logical clock.
///
/// Every call to [`tick`](Self::tick) returns a value strictly greater than all
/// previous calls, even under concurrent access. The clock never reissues a value.
#[derive(Debug, Default)]
pub struct LogicalClock {
    next: AtomicU64,
}

impl LogicalClock {
    /// Creates a clock whose first issued timestamp is zero.
    pub fn new() -> Self {
        Self::starting_at(Timestamp::default())
    }

    /// Creates a clock whose first issued timestamp is `start`.
    pub fn starting_at(start: Timestamp) -> Self {
        Self {
            next: AtomicU64::new(start.get()),
        }
    }

    /// Issues the next timestamp and advances the clock.
    ///
    /// # Panics
    ///
    /// Panics if the clock runs past [`Timestamp::MAX`].
    #[inline]
    pub fn tick(&self) -> Timestamp {
        Timestamp::new(self.next.fetch_add(1, Ordering::AcqRel))
    }

    /// Returns the timestamp the next [`tick`](Self::tick) will issue, without advancing.
    #[inline]
    pub fn current(&self) -> Timestamp {
        Timestamp::new(self.next.load(Ordering::Acquire))
    }
}
