// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! In-memory table of fixed-arity tuples.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use crate::txn::TransactionContext;

use super::{
    AtomicUndoPtr, Delta, StorageError, TableId, TupleSlot, TupleStore, UndoArena,
    UndoHandle, UndoRecord, UndoTarget, Value,
};

/// One stored tuple.
///
/// The column lock keeps a row copy and its chain head consistent for readers;
/// it is never held while waiting on anything else.
struct Tuple {
    version_ptr: AtomicUndoPtr,
    columns: RwLock<Vec<Value>>,
}

/// In-memory table.
///
/// All transactions touching a table must allocate their undo records from the
/// same [`UndoArena`], which is the case for every transaction begun by one
/// [`TransactionManager`](crate::txn::TransactionManager).
pub struct DataTable {
    id: TableId,
    num_columns: usize,
    tuples: RwLock<Vec<Arc<Tuple>>>,
}

impl DataTable {
    /// Creates an empty table with `num_columns` columns per tuple.
    pub fn new(id: TableId, num_columns: usize) -> Self {
        Self {
            id,
            num_columns,
            tuples: RwLock::new(Vec::new()),
        }
    }

    /// Returns the number of columns per tuple.
    #[inline]
    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    /// Returns the number of tuples.
    pub fn len(&self) -> usize {
        self.tuples.read().len()
    }

    /// Returns true if the table holds no tuples.
    pub fn is_empty(&self) -> bool {
        self.tuples.read().is_empty()
    }

    /// Loads a tuple outside any transaction.
    ///
    /// The tuple starts with an empty version chain and is visible to every snapshot.
    /// Returns [`StorageError::TableFull`] once every `u32` slot is taken.
    pub fn insert(&self, values: Vec<Value>) -> Result<TupleSlot, StorageError> {
        if values.len() != self.num_columns {
            return Err(StorageError::ArityMismatch {
                expected: self.num_columns,
                actual: values.len(),
            });
        }

        let mut tuples = self.tuples.write();
        let slot = next_slot(tuples.len())?;
        tuples.push(Arc::new(Tuple {
            version_ptr: AtomicUndoPtr::default(),
            columns: RwLock::new(values),
        }));
        Ok(slot)
    }

    /// Overwrites the columns named in `delta` on behalf of `txn`.
    ///
    /// The write first takes the tuple's write lock by installing an undo record
    /// as the chain head, then updates the tuple in place. Returns
    /// [`StorageError::WriteConflict`] if another running transaction holds the
    /// lock or a transaction committed a newer version after `txn` started; the
    /// caller is expected to abort.
    pub fn update(
        self: &Arc<Self>,
        txn: &TransactionContext,
        slot: TupleSlot,
        delta: &Delta,
    ) -> Result<(), StorageError> {
        let tuple = self.tuple(slot)?;
        self.check_columns(delta)?;

        let stamp = txn.txn_id();
        let arena = txn.undo_arena();

        loop {
            let (head, before_image) = {
                let columns = tuple.columns.read();
                let head = tuple.version_ptr.load();
                let mut before_image = Delta::new();
                for (column, _) in delta.iter() {
                    before_image.set(column, columns[column.index()].clone());
                }
                (head, before_image)
            };

            // A stale head was reclaimed below every live snapshot; treat it as empty.
            let next = match head.and_then(|h| arena.get(h)) {
                Some(record) => {
                    let owner = record.timestamp();
                    if owner != stamp && !owner.committed_before(txn.start_time()) {
                        trace!(table = ?self.id, ?slot, %owner, "write conflict");
                        return Err(StorageError::WriteConflict { slot });
                    }
                    head
                }
                None => None,
            };

            let target = UndoTarget {
                table: Arc::clone(self) as Arc<dyn TupleStore>,
                slot,
            };
            let (handle, record) =
                arena.allocate(UndoRecord::new(target, before_image, stamp, next));

            if tuple
                .version_ptr
                .compare_exchange(head, Some(handle))
                .is_err()
            {
                arena.release(handle);
                continue;
            }

            txn.record_undo(handle, record);
            delta.apply_to(&mut tuple.columns.write());
            return Ok(());
        }
    }

    /// Reads the version of a tuple visible to `txn`.
    pub fn select(
        &self,
        txn: &TransactionContext,
        slot: TupleSlot,
    ) -> Result<Vec<Value>, StorageError> {
        let tuple = self.tuple(slot)?;
        let arena = txn.undo_arena();
        let own = txn.txn_id();

        let (mut row, mut version) = {
            let columns = tuple.columns.read();
            (columns.clone(), tuple.version_ptr.load())
        };

        while let Some(handle) = version {
            let Some(record) = arena.get(handle) else {
                break;
            };
            let stamp = record.timestamp();
            if stamp == own || stamp.committed_before(txn.start_time()) {
                break;
            }
            record.before_image().apply_to(&mut row);
            version = record.next();
        }

        Ok(row)
    }

    /// Returns the live column values, ignoring versioning.
    pub fn read_live(&self, slot: TupleSlot) -> Result<Vec<Value>, StorageError> {
        Ok(self.tuple(slot)?.columns.read().clone())
    }

    /// Counts the records reachable from the slot's chain head.
    pub fn version_chain_len(
        &self,
        arena: &UndoArena,
        slot: TupleSlot,
    ) -> Result<usize, StorageError> {
        let mut version = self.tuple(slot)?.version_ptr.load();
        let mut len = 0;
        while let Some(record) = version.and_then(|h| arena.get(h)) {
            len += 1;
            version = record.next();
        }
        Ok(len)
    }

    fn tuple(&self, slot: TupleSlot) -> Result<Arc<Tuple>, StorageError> {
        let tuples = self.tuples.read();
        tuples
            .get(slot.index())
            .cloned()
            .ok_or(StorageError::SlotOutOfRange {
                slot,
                len: tuples.len(),
            })
    }

    fn check_columns(&self, delta: &Delta) -> Result<(), StorageError> {
        match delta.iter().find(|(c, _)| c.index() >= self.num_columns) {
            Some((column, _)) => Err(StorageError::ColumnOutOfRange {
                column,
                num_columns: self.num_columns,
            }),
            None => Ok(()),
        }
    }
}

fn next_slot(len: usize) -> Result<TupleSlot, StorageError> {
    u32::try_from(len)
        .map(TupleSlot)
        .map_err(|_| StorageError::TableFull { len })
}

impl TupleStore for DataTable {
    fn table_id(&self) -> TableId {
        self.id
    }

    fn read_version_ptr(&self, slot: TupleSlot) -> Option<UndoHandle> {
        self.tuple(slot).ok()?.version_ptr.load()
    }

    fn write_version_ptr(&self, slot: TupleSlot, head: Option<UndoHandle>) {
        if let Ok(tuple) = self.tuple(slot) {
            tuple.version_ptr.store(head);
        }
    }

    fn compare_exchange_version_ptr(
        &self,
        slot: TupleSlot,
        current: Option<UndoHandle>,
        new: Option<UndoHandle>,
    ) -> Result<(), Option<UndoHandle>> {
        match self.tuple(slot) {
            Ok(tuple) => tuple.version_ptr.compare_exchange(current, new),
            Err(_) => Err(None),
        }
    }

    fn apply_before_image(&self, slot: TupleSlot, before_image: &Delta) {
        if let Ok(tuple) = self.tuple(slot) {
            before_image.apply_to(&mut tuple.columns.write());
        }
    }
}

impl std::fmt::Debug for DataTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataTable")
            .field("id", &self.id)
            .field("num_columns", &self.num_columns)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ColumnId;
    use crate::txn::{TransactionManager, TransactionManagerConfig};

    const COL: ColumnId = ColumnId(0);

    fn single_column(column: ColumnId, value: &str) -> Delta {
        Delta::new().with(column, value)
    }

    fn setup() -> (TransactionManager, Arc<DataTable>, TupleSlot) {
        let mgr = TransactionManager::new(
            Arc::new(UndoArena::new()),
            TransactionManagerConfig::default(),
        );
        let table = Arc::new(DataTable::new(TableId(1), 2));
        let slot = table
            .insert(vec![Value::from("A"), Value::from("left")])
            .unwrap();
        (mgr, table, slot)
    }

    #[test]
    fn test_insert_arity_checked() {
        let table = DataTable::new(TableId(1), 2);
        let result = table.insert(vec![Value::from("only one")]);
        assert!(matches!(
            result,
            Err(StorageError::ArityMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_update_in_place_and_links_chain() {
        let (mgr, table, slot) = setup();
        let txn = mgr.begin();

        table
            .update(&txn, slot, &single_column(COL, "B"))
            .unwrap();

        assert_eq!(table.read_live(slot).unwrap()[0], Value::from("B"));
        assert_eq!(table.version_chain_len(mgr.undo_arena(), slot).unwrap(), 1);
        assert_eq!(txn.undo_count(), 1);
    }

    #[test]
    fn test_own_writes_visible_others_not() {
        let (mgr, table, slot) = setup();
        let writer = mgr.begin();
        let reader = mgr.begin();

        table
            .update(&writer, slot, &single_column(COL, "B"))
            .unwrap();

        assert_eq!(table.select(&writer, slot).unwrap()[0], Value::from("B"));
        assert_eq!(table.select(&reader, slot).unwrap()[0], Value::from("A"));
        // Untouched columns come from the live tuple.
        assert_eq!(table.select(&reader, slot).unwrap()[1], Value::from("left"));
    }

    #[test]
    fn test_snapshot_ignores_later_commit() {
        let (mgr, table, slot) = setup();
        let old_reader = mgr.begin();

        let writer = mgr.begin();
        table
            .update(&writer, slot, &single_column(COL, "B"))
            .unwrap();
        mgr.commit(&writer);

        let new_reader = mgr.begin();
        assert_eq!(table.select(&old_reader, slot).unwrap()[0], Value::from("A"));
        assert_eq!(table.select(&new_reader, slot).unwrap()[0], Value::from("B"));
    }

    #[test]
    fn test_write_write_conflict_with_running_txn() {
        let (mgr, table, slot) = setup();
        let first = mgr.begin();
        let second = mgr.begin();

        table
            .update(&first, slot, &single_column(COL, "B"))
            .unwrap();
        let result = table.update(&second, slot, &single_column(COL, "C"));

        assert!(matches!(result, Err(StorageError::WriteConflict { .. })));
        assert_eq!(second.undo_count(), 0);
        assert_eq!(table.read_live(slot).unwrap()[0], Value::from("B"));
    }

    #[test]
    fn test_write_conflict_with_newer_commit() {
        let (mgr, table, slot) = setup();
        let stale = mgr.begin();

        let writer = mgr.begin();
        table
            .update(&writer, slot, &single_column(COL, "B"))
            .unwrap();
        mgr.commit(&writer);

        let result = table.update(&stale, slot, &single_column(COL, "C"));
        assert!(matches!(result, Err(StorageError::WriteConflict { .. })));
    }

    #[test]
    fn test_write_after_older_commit_succeeds() {
        let (mgr, table, slot) = setup();

        let writer = mgr.begin();
        table
            .update(&writer, slot, &single_column(COL, "B"))
            .unwrap();
        mgr.commit(&writer);

        let next = mgr.begin();
        table
            .update(&next, slot, &single_column(COL, "C"))
            .unwrap();
        assert_eq!(table.version_chain_len(mgr.undo_arena(), slot).unwrap(), 2);
    }

    #[test]
    fn test_out_of_range_errors() {
        let (mgr, table, _) = setup();
        let txn = mgr.begin();

        assert!(matches!(
            table.update(&txn, TupleSlot(9), &single_column(COL, "x")),
            Err(StorageError::SlotOutOfRange { len: 1, .. })
        ));
        assert!(matches!(
            table.update(&txn, TupleSlot(0), &single_column(ColumnId(5), "x")),
            Err(StorageError::ColumnOutOfRange { num_columns: 2, .. })
        ));
    }

    #[test]
    fn test_next_slot_bounds() {
        assert_eq!(next_slot(0).unwrap(), TupleSlot(0));
        assert_eq!(next_slot(u32::MAX as usize).unwrap(), TupleSlot(u32::MAX));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_next_slot_past_u32_is_table_full() {
        let len = u32::MAX as usize + 1;
        assert!(matches!(
            next_slot(len),
            Err(StorageError::TableFull { len: l }) if l == len
        ));
    }
}
