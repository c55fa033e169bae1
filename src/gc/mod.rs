// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Garbage collection of finished transactions.
//!
//! The collector consumes the transaction manager's completed queue and works
//! in two phases so that no reader can follow a link into freed memory:
//!
//! 1. **Unlink**: for every committed transaction older than the oldest running
//!    snapshot, truncate the version chains it wrote so that no chain reaches
//!    below the newest version every live snapshot can see. Aborted
//!    transactions were already unlinked by rollback.
//! 2. **Deallocate**: once every transaction that was running during an unlink
//!    pass has finished, release the unlinked transactions' undo records back
//!    to the arena.

mod config;
mod thread;

use std::sync::Arc;

use tracing::{debug, trace};

use crate::storage::{UndoArena, UndoHandle, UndoRecord};
use crate::time::Timestamp;
use crate::txn::{CompletedTransactions, TransactionManager};

pub use config::GcConfig;
pub use thread::GcThread;

/// Statistics from one garbage collection pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GcStats {
    pub txns_unlinked: u64,
    pub txns_deallocated: u64,
    pub versions_unlinked: u64,
    pub versions_deallocated: u64,
}

/// Reclaims the undo records of finished transactions.
pub struct GarbageCollector {
    txn_manager: Arc<TransactionManager>,
    last_unlinked: Timestamp,
    txns_to_unlink: CompletedTransactions,
    txns_to_deallocate: CompletedTransactions,
}

impl GarbageCollector {
    /// Creates a collector for the transactions of `txn_manager`.
    pub fn new(txn_manager: Arc<TransactionManager>) -> Self {
        Self {
            txn_manager,
            last_unlinked: Timestamp::default(),
            txns_to_unlink: CompletedTransactions::new(),
            txns_to_deallocate: CompletedTransactions::new(),
        }
    }

    /// Runs one deallocate pass followed by one unlink pass.
    pub fn perform_gc(&mut self) -> GcStats {
        let mut stats = GcStats::default();
        self.process_deallocate_queue(&mut stats);
        self.process_unlink_queue(&mut stats);

        if stats != GcStats::default() {
            debug!(
                txns_unlinked = stats.txns_unlinked,
                versions_unlinked = stats.versions_unlinked,
                txns_deallocated = stats.txns_deallocated,
                versions_deallocated = stats.versions_deallocated,
                "gc pass"
            );
        }
        stats
    }

    /// Returns the number of transactions waiting to be unlinked or deallocated.
    pub fn pending(&self) -> usize {
        self.txns_to_unlink.len() + self.txns_to_deallocate.len()
    }

    /// Returns the manager this collector serves.
    pub fn txn_manager(&self) -> &Arc<TransactionManager> {
        &self.txn_manager
    }

    fn process_deallocate_queue(&mut self, stats: &mut GcStats) {
        if self.txns_to_deallocate.is_empty() {
            return;
        }

        let oldest = self.txn_manager.oldest_transaction_start_time();
        if oldest < self.last_unlinked {
            trace!(%oldest, last_unlinked = %self.last_unlinked, "deallocation deferred");
            return;
        }

        let arena = self.txn_manager.undo_arena();
        for txn in self.txns_to_deallocate.drain(..) {
            for entry in txn.undo_log().iter() {
                if arena.release(entry.handle).is_some() {
                    stats.versions_deallocated += 1;
                }
            }
            stats.txns_deallocated += 1;
        }
    }

    fn process_unlink_queue(&mut self, stats: &mut GcStats) {
        let oldest = self.txn_manager.oldest_transaction_start_time();
        self.txns_to_unlink
            .extend(self.txn_manager.completed_transactions_for_gc());

        let arena = Arc::clone(self.txn_manager.undo_arena());
        let mut requeue = CompletedTransactions::new();

        for txn in self.txns_to_unlink.drain(..) {
            match txn.commit_time() {
                // Aborted: rollback already took its versions off every chain.
                None => {}
                Some(commit_time) if commit_time < oldest => {
                    for entry in txn.undo_log().iter() {
                        stats.versions_unlinked +=
                            truncate_version_chain(&entry.record, oldest, &arena);
                    }
                }
                Some(_) => {
                    requeue.push_back(txn);
                    continue;
                }
            }
            stats.txns_unlinked += 1;
            self.txns_to_deallocate.push_back(txn);
        }

        self.txns_to_unlink = requeue;
        if stats.txns_unlinked > 0 {
            self.last_unlinked = self.txn_manager.current_time();
        }
    }
}

impl std::fmt::Debug for GarbageCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GarbageCollector")
            .field("last_unlinked", &self.last_unlinked)
            .field("txns_to_unlink", &self.txns_to_unlink.len())
            .field("txns_to_deallocate", &self.txns_to_deallocate.len())
            .finish()
    }
}

/// Cuts the chain of `record`'s tuple below the newest version committed
/// before `watermark`, returning the number of records cut off.
fn truncate_version_chain(record: &UndoRecord, watermark: Timestamp, arena: &UndoArena) -> u64 {
    let target = record.target();
    let (table, slot) = (&target.table, target.slot);

    loop {
        let head = table.read_version_ptr(slot);
        let Some(head_record) = head.and_then(|h| arena.get(h)) else {
            if head.is_some() {
                // Stale head left behind by a rollback racing an earlier truncation.
                let _ = table.compare_exchange_version_ptr(slot, head, None);
            }
            return 0;
        };

        if head_record.timestamp().committed_before(watermark) {
            match table.compare_exchange_version_ptr(slot, head, None) {
                Ok(()) => return chain_len(head, arena),
                // A writer installed a newer version; start over from it.
                Err(_) => continue,
            }
        }

        let mut curr = head_record;
        loop {
            let next = curr.next();
            let Some(next_record) = next.and_then(|h| arena.get(h)) else {
                return 0;
            };
            if next_record.timestamp().committed_before(watermark) {
                curr.set_next(None);
                return chain_len(next, arena);
            }
            curr = next_record;
        }
    }
}

fn chain_len(mut version: Option<UndoHandle>, arena: &UndoArena) -> u64 {
    let mut len = 0;
    while let Some(record) = version.and_then(|h| arena.get(h)) {
        len += 1;
        version = record.next();
    }
    len
}
