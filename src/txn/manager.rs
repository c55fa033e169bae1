// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Transaction manager: Begin, Commit, Abort and rollback of uncommitted writes.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use crate::storage::{UndoArena, UndoRecord};
use crate::time::{LogicalClock, Timestamp, VersionStamp};

use super::registry::{CompletedTransactions, TxnTable};
use super::{TransactionContext, TransactionManagerConfig};

/// Owns the logical clock, the running-transaction registry and the
/// completed-transaction queue.
///
/// Two independent locks:
/// - the commit latch, shared by Begin and exclusive for Commit, so no
///   transaction can start while another one's writes are being stamped;
/// - the table lock, held only around single registry or queue operations.
///
/// Abort and rollback take neither; they rely on the version-chain head being
/// owned by the aborting transaction.
pub struct TransactionManager {
    clock: LogicalClock,
    commit_latch: RwLock<()>,
    table: Mutex<TxnTable>,
    undo_arena: Arc<UndoArena>,
    gc_enabled: bool,
}

impl TransactionManager {
    /// Creates a manager whose transactions allocate undo records from `undo_arena`.
    pub fn new(undo_arena: Arc<UndoArena>, config: TransactionManagerConfig) -> Self {
        Self {
            clock: LogicalClock::starting_at(config.initial_timestamp),
            commit_latch: RwLock::new(()),
            table: Mutex::new(TxnTable::default()),
            undo_arena,
            gc_enabled: config.gc_enabled,
        }
    }

    /// Begins a transaction.
    ///
    /// The start timestamp is strictly greater than every timestamp issued before.
    ///
    /// # Panics
    ///
    /// Panics if the start timestamp is already registered.
    pub fn begin(&self) -> Arc<TransactionContext> {
        let start_time = {
            let _latch = self.commit_latch.read();
            let start_time = self.clock.tick();
            // Registered before the latch drops so the oldest start time never
            // runs ahead of a snapshot that a commit could still follow.
            self.table.lock().register(start_time);
            start_time
        };

        let txn = Arc::new(TransactionContext::new(
            start_time,
            Arc::clone(&self.undo_arena),
        ));
        debug!(%start_time, "began transaction");
        txn
    }

    /// Commits a transaction and returns its commit timestamp.
    ///
    /// Every undo record of the transaction is stamped with the commit timestamp,
    /// which publishes the writes to every snapshot that starts afterwards.
    ///
    /// # Panics
    ///
    /// Panics if the transaction is not running (already committed or aborted).
    pub fn commit(&self, txn: &Arc<TransactionContext>) -> Timestamp {
        let start_time = txn.start_time();
        let _latch = self.commit_latch.write();
        self.table.lock().assert_running(start_time, "committed");

        let commit_time = self.clock.tick();
        let committed = VersionStamp::Committed(commit_time);

        let undo_records = {
            let undo_log = txn.undo_log();
            for entry in undo_log.iter() {
                entry.record.set_timestamp(committed);
            }
            undo_log.len()
        };

        let mut table = self.table.lock();
        table.deregister(start_time, "committed");
        txn.set_txn_id(committed);
        if self.gc_enabled {
            table.enqueue_completed(Arc::clone(txn));
        }
        drop(table);

        debug!(%start_time, %commit_time, undo_records, "committed transaction");
        commit_time
    }

    /// Aborts a transaction, restoring every tuple it wrote.
    ///
    /// # Panics
    ///
    /// Panics if the transaction is not running (already committed or aborted).
    pub fn abort(&self, txn: &Arc<TransactionContext>) {
        let start_time = txn.start_time();
        self.table.lock().assert_running(start_time, "aborted");

        // Undo records are transaction-local until commit; no latch needed.
        let txn_id = txn.txn_id();
        let undo_records = {
            let undo_log = txn.undo_log();
            for entry in undo_log.iter().rev() {
                Self::rollback(txn_id, &entry.record, txn.undo_arena());
            }
            undo_log.len()
        };

        let mut table = self.table.lock();
        table.deregister(start_time, "aborted");
        if self.gc_enabled {
            table.enqueue_completed(Arc::clone(txn));
        }
        drop(table);

        debug!(%start_time, undo_records, "aborted transaction");
    }

    /// Restores the tuple targeted by `record` and releases its write lock.
    ///
    /// Restores from the current chain head rather than from `record` itself, so
    /// each call pops exactly one version owned by `txn_id` whatever order the
    /// records are visited in. Does nothing if the head is not owned by `txn_id`.
    fn rollback(txn_id: VersionStamp, record: &UndoRecord, arena: &UndoArena) {
        let target = record.target();
        let table = &target.table;
        let slot = target.slot;

        let head = match table.read_version_ptr(slot).and_then(|h| arena.get(h)) {
            Some(head) if head.timestamp() == txn_id => head,
            _ => {
                trace!(table = ?table.table_id(), ?slot, %txn_id, "rollback found no owned version");
                return;
            }
        };

        table.apply_before_image(slot, head.before_image());
        // Still the lock holder: a plain store both unlinks the version and releases the lock.
        table.write_version_ptr(slot, head.next());
    }

    /// Returns the start timestamp of the oldest running transaction, or the
    /// current clock value if none is running.
    ///
    /// No version committed before this timestamp is needed by any live snapshot
    /// beyond the newest such version of each tuple.
    pub fn oldest_transaction_start_time(&self) -> Timestamp {
        let table = self.table.lock();
        table
            .oldest_start_time()
            .unwrap_or_else(|| self.clock.current())
    }

    /// Takes every completed transaction queued so far, leaving the queue empty.
    pub fn completed_transactions_for_gc(&self) -> CompletedTransactions {
        let drained = self.table.lock().drain_completed();
        trace!(count = drained.len(), "handed completed transactions to gc");
        drained
    }

    /// Releases the undo records of a finished transaction back to the arena
    /// and returns how many were still allocated.
    ///
    /// For managers with GC disabled, where nothing else reclaims them. The
    /// caller must ensure that no transaction running when `txn` finished is
    /// still reading, and for a committed `txn` that no running snapshot
    /// started before its commit. Released handles left on a version chain
    /// resolve to nothing and end the chain there.
    ///
    /// # Panics
    ///
    /// Panics if `txn` is still running.
    pub fn deallocate(&self, txn: &TransactionContext) -> usize {
        let start_time = txn.start_time();
        assert!(
            !self.table.lock().is_running(start_time),
            "transaction {start_time} is still running and cannot be deallocated"
        );

        let mut released = 0;
        for entry in txn.undo_log().iter() {
            if self.undo_arena.release(entry.handle).is_some() {
                released += 1;
            }
        }
        trace!(%start_time, released, "deallocated transaction");
        released
    }

    /// Returns the timestamp the clock will issue next.
    #[inline]
    pub fn current_time(&self) -> Timestamp {
        self.clock.current()
    }

    /// Returns true if `txn` is registered as running.
    pub fn is_running(&self, txn: &TransactionContext) -> bool {
        self.table.lock().is_running(txn.start_time())
    }

    /// Returns the number of running transactions.
    pub fn running_count(&self) -> usize {
        self.table.lock().running_count()
    }

    /// Returns the number of completed transactions awaiting the garbage collector.
    pub fn completed_count(&self) -> usize {
        self.table.lock().completed_count()
    }

    /// Returns true if completed transactions are queued for the garbage collector.
    #[inline]
    pub fn gc_enabled(&self) -> bool {
        self.gc_enabled
    }

    /// Returns the undo record allocator shared by this manager's transactions.
    #[inline]
    pub fn undo_arena(&self) -> &Arc<UndoArena> {
        &self.undo_arena
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new(
            Arc::new(UndoArena::new()),
            TransactionManagerConfig::default(),
        )
    }
}

impl std::fmt::Debug for TransactionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionManager")
            .field("current_time", &self.current_time())
            .field("running", &self.running_count())
            .field("gc_enabled", &self.gc_enabled)
            .finish()
    }
}
