// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Tuple storage with in-place updates and per-tuple version chains.
//!
//! Writes modify tuples in place. Each write first links an [`UndoRecord`]
//! holding the overwritten values in front of the tuple's version chain; the
//! chain head doubles as the tuple's write lock, since only the transaction
//! whose uncommitted stamp sits at the head may modify the tuple.
//!
//! Readers reconstruct the version their snapshot sees by copying the live
//! tuple and applying before-images from the chain until they reach a version
//! committed before their start timestamp (or written by themselves).
//!
//! The transaction core reaches storage only through the [`TupleStore`] trait;
//! [`DataTable`] is the in-memory implementation.

mod error;
mod table;
mod undo;
mod value;

pub use error::StorageError;
pub use table::DataTable;
pub use undo::{AtomicUndoPtr, UndoArena, UndoHandle, UndoRecord, UndoTarget};
pub use value::{ColumnId, Delta, Value};

/// Identifier of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableId(pub u32);

/// Position of a tuple within its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TupleSlot(pub u32);

impl TupleSlot {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Storage-layer operations the transaction core relies on.
///
/// Implementations must make the version-chain head an atomic location: a
/// plain read, a compare-free write, and a compare-and-swap.
pub trait TupleStore: Send + Sync {
    /// Returns the table's identifier.
    fn table_id(&self) -> TableId;

    /// Atomically reads the head of the slot's version chain.
    fn read_version_ptr(&self, slot: TupleSlot) -> Option<UndoHandle>;

    /// Atomically replaces the head of the slot's version chain.
    ///
    /// The caller must already own the head; no compare is performed.
    fn write_version_ptr(&self, slot: TupleSlot, head: Option<UndoHandle>);

    /// Replaces the head only if it still holds `current`.
    ///
    /// On failure returns the head actually found.
    fn compare_exchange_version_ptr(
        &self,
        slot: TupleSlot,
        current: Option<UndoHandle>,
        new: Option<UndoHandle>,
    ) -> Result<(), Option<UndoHandle>>;

    /// Copies every column of `before_image` back into the live tuple.
    fn apply_before_image(&self, slot: TupleSlot, before_image: &Delta);
}
