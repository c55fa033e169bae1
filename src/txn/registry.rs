// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Running-transaction registry and completed-transaction queue.

use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use crate::time::Timestamp;

use super::TransactionContext;

/// Completed transactions handed to the garbage collector, oldest completion first.
pub type CompletedTransactions = VecDeque<Arc<TransactionContext>>;

/// Bookkeeping guarded by the manager's table lock.
///
/// Registry violations are invariant breaches, not data errors, and panic.
#[derive(Debug, Default)]
pub(crate) struct TxnTable {
    running: BTreeSet<Timestamp>,
    completed: CompletedTransactions,
}

impl TxnTable {
    /// Registers the start time of a freshly begun transaction.
    ///
    /// # Panics
    ///
    /// Panics if a transaction with the same start time is already registered.
    pub(crate) fn register(&mut self, start_time: Timestamp) {
        let inserted = self.running.insert(start_time);
        assert!(
            inserted,
            "start time {start_time} should be globally unique"
        );
    }

    /// Panics unless a transaction with this start time is registered.
    pub(crate) fn assert_running(&self, start_time: Timestamp, outcome: &str) {
        assert!(
            self.running.contains(&start_time),
            "{outcome} transaction {start_time} did not exist in running transactions table"
        );
    }

    /// Removes a finishing transaction.
    ///
    /// # Panics
    ///
    /// Panics if no transaction with this start time is registered.
    pub(crate) fn deregister(&mut self, start_time: Timestamp, outcome: &str) {
        self.assert_running(start_time, outcome);
        self.running.remove(&start_time);
    }

    pub(crate) fn oldest_start_time(&self) -> Option<Timestamp> {
        self.running.first().copied()
    }

    pub(crate) fn running_count(&self) -> usize {
        self.running.len()
    }

    pub(crate) fn is_running(&self, start_time: Timestamp) -> bool {
        self.running.contains(&start_time)
    }

    pub(crate) fn enqueue_completed(&mut self, txn: Arc<TransactionContext>) {
        self.completed.push_back(txn);
    }

    pub(crate) fn completed_count(&self) -> usize {
        self.completed.len()
    }

    pub(crate) fn drain_completed(&mut self) -> CompletedTransactions {
        std::mem::take(&mut self.completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::UndoArena;

    fn txn(start: u64) -> Arc<TransactionContext> {
        Arc::new(TransactionContext::new(
            Timestamp::new(start),
            Arc::new(UndoArena::new()),
        ))
    }

    #[test]
    fn test_oldest_is_smallest_key() {
        let mut table = TxnTable::default();
        assert_eq!(table.oldest_start_time(), None);

        table.register(Timestamp::new(7));
        table.register(Timestamp::new(3));
        table.register(Timestamp::new(5));
        assert_eq!(table.oldest_start_time(), Some(Timestamp::new(3)));

        table.deregister(Timestamp::new(3), "committed");
        assert_eq!(table.oldest_start_time(), Some(Timestamp::new(5)));
        assert_eq!(table.running_count(), 2);
    }

    #[test]
    #[should_panic(expected = "should be globally unique")]
    fn test_duplicate_registration_panics() {
        let mut table = TxnTable::default();
        table.register(Timestamp::new(1));
        table.register(Timestamp::new(1));
    }

    #[test]
    #[should_panic(expected = "did not exist in running transactions table")]
    fn test_missing_deregistration_panics() {
        let mut table = TxnTable::default();
        table.deregister(Timestamp::new(1), "aborted");
    }

    #[test]
    #[should_panic(expected = "committed transaction 4 did not exist")]
    fn test_assert_running_after_deregistration_panics() {
        let mut table = TxnTable::default();
        table.register(Timestamp::new(4));
        table.assert_running(Timestamp::new(4), "aborted");
        table.deregister(Timestamp::new(4), "aborted");
        table.assert_running(Timestamp::new(4), "committed");
    }

    #[test]
    fn test_drain_leaves_queue_empty() {
        let mut table = TxnTable::default();
        table.enqueue_completed(txn(1));
        table.enqueue_completed(txn(2));

        let drained = table.drain_completed();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].start_time(), Timestamp::new(1));
        assert_eq!(table.completed_count(), 0);
        assert!(table.drain_completed().is_empty());
    }
}
