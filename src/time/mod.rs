// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Logical time for the transaction core.
//!
//! A single [`LogicalClock`] issues both start and commit timestamps. A
//! transaction is identified while it runs by the [`VersionStamp::Uncommitted`]
//! form of its start timestamp, which can never be mistaken for a commit
//! timestamp; committing swaps it for [`VersionStamp::Committed`].
//!
//! # Example
//!
//! ```
//! use strontium_mvcc::time::{LogicalClock, VersionStamp};
//!
//! let clock = LogicalClock::new();
//! let start = clock.tick();
//! let commit = clock.tick();
//! assert!(start < commit);
//!
//! let stamp = VersionStamp::Committed(commit);
//! assert!(stamp.committed_before(clock.current()));
//! ```

mod clock;
mod timestamp;

pub use clock::LogicalClock;
pub use timestamp::{AtomicVersionStamp, Timestamp, VersionStamp};
