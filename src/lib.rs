// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! StrontiumDB MVCC: the transaction-lifecycle core of a multi-version storage engine
//!
//! This crate assigns logical timestamps, tracks running transactions, commits
//! or aborts them (rolling back in-place writes), and hands finished
//! transactions to a garbage collector. No snapshot ever observes a
//! half-committed transaction.

pub mod gc;
pub mod storage;
pub mod time;
pub mod txn;

pub use gc::{GarbageCollector, GcConfig, GcStats, GcThread};
pub use storage::{
    ColumnId, DataTable, Delta, StorageError, TableId, TupleSlot, TupleStore, UndoArena,
    UndoHandle, UndoRecord, Value,
};
pub use time::{LogicalClock, Timestamp, VersionStamp};
pub use txn::{
    CompletedTransactions, TransactionContext, TransactionManager, TransactionManagerConfig,
};
