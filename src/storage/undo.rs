// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Undo records, the arena that owns them, and the handles that link them
//! into version chains.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::time::{AtomicVersionStamp, VersionStamp};

use super::{Delta, TupleSlot, TupleStore};

/// Generation-checked reference to a record in an [`UndoArena`].
///
/// A handle outlives the record it names: once the record is released the slot's
/// generation moves on and the stale handle resolves to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UndoHandle {
    index: u32,
    generation: u32,
}

impl UndoHandle {
    #[inline]
    fn pack(self) -> u64 {
        (u64::from(self.generation) << 32) | u64::from(self.index)
    }

    // Generations start at 1, so a live handle never packs to 0.
    #[inline]
    fn unpack(raw: u64) -> Option<Self> {
        if raw == 0 {
            return None;
        }
        Some(Self {
            index: raw as u32,
            generation: (raw >> 32) as u32,
        })
    }
}

/// An optional [`UndoHandle`] that can be swapped atomically.
///
/// Used for a tuple's version-chain head and for each record's successor link.
#[derive(Debug, Default)]
pub struct AtomicUndoPtr(AtomicU64);

impl AtomicUndoPtr {
    /// Creates a pointer holding `handle`.
    pub fn new(handle: Option<UndoHandle>) -> Self {
        Self(AtomicU64::new(handle.map_or(0, UndoHandle::pack)))
    }

    /// Loads the current handle.
    #[inline]
    pub fn load(&self) -> Option<UndoHandle> {
        UndoHandle::unpack(self.0.load(Ordering::Acquire))
    }

    /// Stores a handle unconditionally.
    #[inline]
    pub fn store(&self, handle: Option<UndoHandle>) {
        self.0.store(handle.map_or(0, UndoHandle::pack), Ordering::Release);
    }

    /// Stores `new` if the pointer still holds `current`.
    ///
    /// On failure returns the handle actually held.
    #[inline]
    pub fn compare_exchange(
        &self,
        current: Option<UndoHandle>,
        new: Option<UndoHandle>,
    ) -> Result<(), Option<UndoHandle>> {
        self.0
            .compare_exchange(
                current.map_or(0, UndoHandle::pack),
                new.map_or(0, UndoHandle::pack),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(UndoHandle::unpack)
    }
}

/// The tuple an undo record restores.
#[derive(Clone)]
pub struct UndoTarget {
    pub table: Arc<dyn TupleStore>,
    pub slot: TupleSlot,
}

impl std::fmt::Debug for UndoTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UndoTarget")
            .field("table", &self.table.table_id())
            .field("slot", &self.slot)
            .finish()
    }
}

/// Before-image of one write, linked into its tuple's version chain.
///
/// The record's stamp equals its transaction's stamp: uncommitted while the
/// transaction runs, which makes the record at a chain head a write lock, then
/// the commit timestamp, which turns it into history.
#[derive(Debug)]
pub struct UndoRecord {
    target: UndoTarget,
    before_image: Delta,
    timestamp: AtomicVersionStamp,
    next: AtomicUndoPtr,
}

impl UndoRecord {
    /// Creates a record for `target`, linked in front of `next`.
    pub fn new(
        target: UndoTarget,
        before_image: Delta,
        stamp: VersionStamp,
        next: Option<UndoHandle>,
    ) -> Self {
        Self {
            target,
            before_image,
            timestamp: AtomicVersionStamp::new(stamp),
            next: AtomicUndoPtr::new(next),
        }
    }

    /// Returns the table and slot this record restores.
    #[inline]
    pub fn target(&self) -> &UndoTarget {
        &self.target
    }

    /// Returns the column values captured before the write.
    #[inline]
    pub fn before_image(&self) -> &Delta {
        &self.before_image
    }

    /// Returns the current stamp.
    #[inline]
    pub fn timestamp(&self) -> VersionStamp {
        self.timestamp.load()
    }

    #[inline]
    pub(crate) fn set_timestamp(&self, stamp: VersionStamp) {
        self.timestamp.store(stamp);
    }

    /// Returns the next older record in the version chain.
    #[inline]
    pub fn next(&self) -> Option<UndoHandle> {
        self.next.load()
    }

    #[inline]
    pub(crate) fn set_next(&self, next: Option<UndoHandle>) {
        self.next.store(next);
    }
}

struct ArenaEntry {
    generation: u32,
    record: Option<Arc<UndoRecord>>,
}

#[derive(Default)]
struct ArenaInner {
    entries: Vec<ArenaEntry>,
    free: Vec<u32>,
    live: usize,
}

/// Allocator for undo records.
///
/// Records are reached through [`UndoHandle`]s; released slots are reused under a
/// new generation. Readers that resolved a record before its release keep their
/// `Arc` alive until they drop it.
#[derive(Default)]
pub struct UndoArena {
    inner: RwLock<ArenaInner>,
}

impl UndoArena {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `record` and returns its handle along with a shared reference to it.
    ///
    /// # Panics
    ///
    /// Panics if the arena already holds `u32::MAX` slots.
    pub fn allocate(&self, record: UndoRecord) -> (UndoHandle, Arc<UndoRecord>) {
        let record = Arc::new(record);
        let mut inner = self.inner.write();

        let handle = match inner.free.pop() {
            Some(index) => {
                let entry = &mut inner.entries[index as usize];
                entry.record = Some(Arc::clone(&record));
                UndoHandle {
                    index,
                    generation: entry.generation,
                }
            }
            None => {
                assert!(
                    inner.entries.len() < u32::MAX as usize,
                    "undo arena exhausted"
                );
                let index = inner.entries.len() as u32;
                inner.entries.push(ArenaEntry {
                    generation: 1,
                    record: Some(Arc::clone(&record)),
                });
                UndoHandle {
                    index,
                    generation: 1,
                }
            }
        };

        inner.live += 1;
        (handle, record)
    }

    /// Resolves a handle, returning `None` if the record was released.
    pub fn get(&self, handle: UndoHandle) -> Option<Arc<UndoRecord>> {
        let inner = self.inner.read();
        inner
            .entries
            .get(handle.index as usize)
            .filter(|entry| entry.generation == handle.generation)
            .and_then(|entry| entry.record.clone())
    }

    /// Releases the record behind `handle` and invalidates every copy of the handle.
    ///
    /// Returns the released record, or `None` if the handle was already stale.
    pub fn release(&self, handle: UndoHandle) -> Option<Arc<UndoRecord>> {
        let mut inner = self.inner.write();
        let entry = inner.entries.get_mut(handle.index as usize)?;
        if entry.generation != handle.generation {
            return None;
        }
        let record = entry.record.take()?;
        entry.generation = match entry.generation.wrapping_add(1) {
            0 => 1,
            g => g,
        };
        inner.free.push(handle.index);
        inner.live -= 1;
        Some(record)
    }

    /// Returns the number of records currently allocated.
    pub fn live_records(&self) -> usize {
        self.inner.read().live
    }
}

impl std::fmt::Debug for UndoArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("UndoArena")
            .field("slots", &inner.entries.len())
            .field("live", &inner.live)
            .finish()
    }
}
