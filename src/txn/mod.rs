// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Transaction lifecycle: Begin, Commit, Abort.
//!
//! # Key Concepts
//!
//! ## Timestamps
//!
//! One logical clock issues both start and commit timestamps. A running
//! transaction is identified by the uncommitted form of its start timestamp;
//! commit replaces it with the commit timestamp.
//!
//! ## Commit Ordering
//!
//! Begin holds the commit latch shared and Commit holds it exclusively while it
//! draws the commit timestamp and stamps every undo record. A transaction can
//! therefore never start while another one's writes are half-stamped: every
//! snapshot sees either all of a transaction's writes or none of them.
//!
//! ## Rollback
//!
//! Writes happen in place. Abort walks the transaction's undo records and, for
//! each tuple whose version-chain head it still owns, copies the before-image
//! back and unlinks the head, which also releases the tuple's write lock.
//!
//! ## Garbage Collection
//!
//! With GC enabled, finished transactions are queued for
//! [`GarbageCollector`](crate::gc::GarbageCollector), which uses
//! [`TransactionManager::oldest_transaction_start_time`] as its reclamation
//! watermark.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use strontium_mvcc::storage::{ColumnId, DataTable, Delta, TableId, Value};
//! use strontium_mvcc::txn::{TransactionManager, TransactionManagerConfig};
//! use strontium_mvcc::UndoArena;
//!
//! let mgr = TransactionManager::new(Arc::new(UndoArena::new()), TransactionManagerConfig::default());
//! let table = Arc::new(DataTable::new(TableId(1), 1));
//! let slot = table.insert(vec![Value::from("A")])?;
//!
//! let txn = mgr.begin();
//! table.update(&txn, slot, &Delta::new().with(ColumnId(0), "B"))?;
//! mgr.abort(&txn);
//! assert_eq!(table.read_live(slot)?, vec![Value::from("A")]);
//!
//! let txn = mgr.begin();
//! table.update(&txn, slot, &Delta::new().with(ColumnId(0), "C"))?;
//! let commit_time = mgr.commit(&txn);
//!
//! let reader = mgr.begin();
//! assert!(commit_time < reader.start_time());
//! assert_eq!(table.select(&reader, slot)?, vec![Value::from("C")]);
//! # Ok::<(), strontium_mvcc::StorageError>(())
//! ```

mod config;
mod context;
mod manager;
mod registry;

pub use config::TransactionManagerConfig;
pub use context::{TransactionContext, UndoEntry, UndoLog};
pub use manager::TransactionManager;
pub use registry::CompletedTransactions;
