// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Transaction context and its undo log.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::storage::{UndoArena, UndoHandle, UndoRecord};
use crate::time::{AtomicVersionStamp, Timestamp, VersionStamp};

/// One undo record owned by a transaction.
#[derive(Debug, Clone)]
pub struct UndoEntry {
    pub handle: UndoHandle,
    pub record: Arc<UndoRecord>,
}

/// Ordered, append-only log of a transaction's undo records, oldest first.
#[derive(Debug, Default)]
pub struct UndoLog {
    entries: Vec<UndoEntry>,
}

impl UndoLog {
    pub(crate) fn push(&mut self, entry: UndoEntry) {
        self.entries.push(entry);
    }

    /// Returns the number of records.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the transaction wrote nothing.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the records in the order they were written.
    pub fn iter(&self) -> std::slice::Iter<'_, UndoEntry> {
        self.entries.iter()
    }
}

/// State of one transaction, from Begin until the garbage collector drops it.
///
/// A context is shared: the caller holds it as its transaction handle, the
/// running-transaction registry holds it until Commit or Abort, and the
/// completed queue holds it until the garbage collector drains it.
#[derive(Debug)]
pub struct TransactionContext {
    start_time: Timestamp,
    txn_id: AtomicVersionStamp,
    undo_log: Mutex<UndoLog>,
    undo_arena: Arc<UndoArena>,
}

impl TransactionContext {
    pub(crate) fn new(start_time: Timestamp, undo_arena: Arc<UndoArena>) -> Self {
        Self {
            start_time,
            txn_id: AtomicVersionStamp::new(VersionStamp::Uncommitted(start_time)),
            undo_log: Mutex::new(UndoLog::default()),
            undo_arena,
        }
    }

    /// Returns the start timestamp, which is also the snapshot boundary for reads.
    #[inline]
    pub fn start_time(&self) -> Timestamp {
        self.start_time
    }

    /// Returns the transaction's current stamp.
    ///
    /// `Uncommitted(start_time)` until commit, `Committed(commit_time)` afterwards.
    #[inline]
    pub fn txn_id(&self) -> VersionStamp {
        self.txn_id.load()
    }

    #[inline]
    pub(crate) fn set_txn_id(&self, stamp: VersionStamp) {
        self.txn_id.store(stamp);
    }

    /// Returns true once the transaction has committed.
    #[inline]
    pub fn is_committed(&self) -> bool {
        self.txn_id().is_committed()
    }

    /// Returns the commit timestamp, if committed.
    #[inline]
    pub fn commit_time(&self) -> Option<Timestamp> {
        self.txn_id().commit_time()
    }

    /// Returns the number of undo records written so far.
    pub fn undo_count(&self) -> usize {
        self.undo_log.lock().len()
    }

    /// Returns the arena this transaction allocates undo records from.
    #[inline]
    pub fn undo_arena(&self) -> &Arc<UndoArena> {
        &self.undo_arena
    }

    pub(crate) fn record_undo(&self, handle: UndoHandle, record: Arc<UndoRecord>) {
        self.undo_log.lock().push(UndoEntry { handle, record });
    }

    // Uncontended: only the owning transaction, then the garbage collector, touches the log.
    pub(crate) fn undo_log(&self) -> MutexGuard<'_, UndoLog> {
        self.undo_log.lock()
    }
}
