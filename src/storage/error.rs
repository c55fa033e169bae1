// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Storage error types.

use super::{ColumnId, TupleSlot};

/// Errors that can occur in tuple storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("write conflict at slot {slot:?}")]
    WriteConflict { slot: TupleSlot },

    #[error("slot {slot:?} out of range (table holds {len} tuples)")]
    SlotOutOfRange { slot: TupleSlot, len: usize },

    #[error("column {column:?} out of range (table has {num_columns} columns)")]
    ColumnOutOfRange { column: ColumnId, num_columns: usize },

    #[error("table full ({len} tuples)")]
    TableFull { len: usize },

    #[error("expected {expected} column values, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },
}
