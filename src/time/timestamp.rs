// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Logical timestamps and the version stamps derived from them.

use std::sync::atomic::{AtomicU64, Ordering};

/// Bit that marks a stored stamp as belonging to an uncommitted transaction.
const UNCOMMITTED_BIT: u64 = 1 << 63;

/// A logical timestamp drawn from the engine's single monotonic counter.
///
/// Start timestamps and commit timestamps share this type and this sequence,
/// so any two timestamps issued by the same clock are distinct and totally ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The largest timestamp a clock may issue.
    pub const MAX: Timestamp = Timestamp(UNCOMMITTED_BIT - 1);

    /// Creates a timestamp from a raw counter value.
    ///
    /// # Panics
    ///
    /// Panics if `value` does not fit below the uncommitted marker bit.
    #[inline]
    pub const fn new(value: u64) -> Self {
        assert!(value & UNCOMMITTED_BIT == 0, "timestamp overflowed 63 bits");
        Self(value)
    }

    /// Returns the raw counter value.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for Timestamp {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The stamp carried by a transaction and by each of its undo records.
///
/// While a transaction runs, its stamp is `Uncommitted(start_time)`; a version
/// carrying that stamp is a write lock, visible only to its owner. Commit
/// replaces it once with `Committed(commit_time)`, after which the version is
/// history visible to every snapshot that starts later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionStamp {
    /// Owned by the running transaction that started at this timestamp.
    Uncommitted(Timestamp),
    /// Committed at this timestamp.
    Committed(Timestamp),
}

impl VersionStamp {
    /// Returns true if the stamp carries a commit timestamp.
    #[inline]
    pub fn is_committed(self) -> bool {
        matches!(self, Self::Committed(_))
    }

    /// Returns the commit timestamp, if committed.
    #[inline]
    pub fn commit_time(self) -> Option<Timestamp> {
        match self {
            Self::Committed(ts) => Some(ts),
            Self::Uncommitted(_) => None,
        }
    }

    /// Returns true if a version with this stamp is committed strictly before `ts`.
    #[inline]
    pub fn committed_before(self, ts: Timestamp) -> bool {
        matches!(self, Self::Committed(commit) if commit < ts)
    }

    #[inline]
    fn encode(self) -> u64 {
        match self {
            Self::Uncommitted(ts) => ts.0 | UNCOMMITTED_BIT,
            Self::Committed(ts) => ts.0,
        }
    }

    #[inline]
    fn decode(raw: u64) -> Self {
        if raw & UNCOMMITTED_BIT != 0 {
            Self::Uncommitted(Timestamp(raw & !UNCOMMITTED_BIT))
        } else {
            Self::Committed(Timestamp(raw))
        }
    }
}

impl std::fmt::Display for VersionStamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uncommitted(ts) => write!(f, "uncommitted@{ts}"),
            Self::Committed(ts) => write!(f, "committed@{ts}"),
        }
    }
}

/// A [`VersionStamp`] that can be read and replaced concurrently.
///
/// Readers walking a version chain load this field to decide visibility while
/// the owning transaction may be flipping it at commit.
#[derive(Debug)]
pub struct AtomicVersionStamp(AtomicU64);

impl AtomicVersionStamp {
    /// Creates a new atomic stamp.
    #[inline]
    pub fn new(stamp: VersionStamp) -> Self {
        Self(AtomicU64::new(stamp.encode()))
    }

    /// Loads the current stamp.
    #[inline]
    pub fn load(&self) -> VersionStamp {
        VersionStamp::decode(self.0.load(Ordering::Acquire))
    }

    /// Replaces the stamp.
    #[inline]
    pub fn store(&self, stamp: VersionStamp) {
        self.0.store(stamp.encode(), Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncommitted_never_equals_committed() {
        let ts = Timestamp::new(42);
        assert_ne!(VersionStamp::Uncommitted(ts), VersionStamp::Committed(ts));
        assert_ne!(
            VersionStamp::Uncommitted(ts).encode(),
            VersionStamp::Committed(ts).encode()
        );
    }

    #[test]
    fn test_committed_before() {
        let stamp = VersionStamp::Committed(Timestamp::new(10));
        assert!(stamp.committed_before(Timestamp::new(11)));
        assert!(!stamp.committed_before(Timestamp::new(10)));
        assert!(!VersionStamp::Uncommitted(Timestamp::new(1)).committed_before(Timestamp::MAX));
    }

    #[test]
    fn test_atomic_stamp_flip() {
        let stamp = AtomicVersionStamp::new(VersionStamp::Uncommitted(Timestamp::new(7)));
        assert!(!stamp.load().is_committed());

        stamp.store(VersionStamp::Committed(Timestamp::new(9)));
        assert_eq!(stamp.load(), VersionStamp::Committed(Timestamp::new(9)));
        assert_eq!(stamp.load().commit_time(), Some(Timestamp::new(9)));
    }

    #[test]
    fn test_max_timestamp_roundtrips_uncommitted() {
        let stamp = AtomicVersionStamp::new(VersionStamp::Uncommitted(Timestamp::MAX));
        assert_eq!(stamp.load(), VersionStamp::Uncommitted(Timestamp::MAX));
    }

    #[test]
    #[should_panic(expected = "timestamp overflowed 63 bits")]
    fn test_timestamp_rejects_marker_bit() {
        let _ = Timestamp::new(u64::MAX);
    }

    #[test]
    fn test_display() {
        assert_eq!(Timestamp::new(5).to_string(), "5");
        assert_eq!(
            VersionStamp::Uncommitted(Timestamp::new(5)).to_string(),
            "uncommitted@5"
        );
    }
}
