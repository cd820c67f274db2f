//! The sparse map hands out [`Handle`]s and tracks which dense position each one
//! currently points to.
//!
//! It stores no values itself. Instead it should be associated with an array
//! (or a set of arrays) that holds the data.
//!
//! * Each time you call [`SparseMap::insert`], you must push an element onto the array(s)
//! * Each time [`SparseMap::try_remove`] (or one of its variants) succeeds, you must
//!   swap-remove the element at the returned position from the array(s), the same way
//!   [`Vec::swap_remove`] does
//!
//! If you do these two things, then every position the [`SparseMap`] reports is
//! a correct position into your array(s). [`SlotMap`](crate::slot_map::SlotMap)
//! pairs a [`SparseMap`] with a single [`Vec`], and a columnar table can pair one
//! with many type-erased arrays instead.
//!
//! ## Slot reuse
//!
//! Freed sparse slots go onto a free list and are reused by later insertions.
//! Each time a slot is freed its version is bumped, so handles to the old
//! occupant stop resolving. A slot whose version reaches
//! [`Handle::DISABLED_VERSION`] is retired and never reused, which guarantees that
//! no (id, version) pair is ever handed out twice (until [`SparseMap::clear`]).

use alloc::vec::Vec;
use core::{fmt, iter::FusedIterator, marker::PhantomData};

use crate::{
    error::{insert_failed, ArenaError},
    handle::{stale_handle, DefaultTag, Handle},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    /// The slot is in use, and owns this dense position
    Live(u32),
    /// The slot is on the free list, this is the next free slot
    /// (or [`Handle::FREELIST_END_IDX`])
    Free(u32),
    /// The slot's version was exhausted
    Retired,
}

#[derive(Debug, Clone, Copy)]
struct SparseEntry {
    state: SlotState,
    version: u32,
}

/// Allocates [`Handle`]s and maps them to dense positions
///
/// see the [module docs](self) for details
pub struct SparseMap<Tag: ?Sized = DefaultTag> {
    /// dense position -> sparse id that owns it
    dense: Vec<u32>,
    sparse: Vec<SparseEntry>,
    freelist_head: u32,
    retired: usize,
    /// never more than SPARSE_MAX_IDX
    slot_limit: u32,
    _tag: PhantomData<fn() -> Tag>,
}

/// Checks that a sparse sequence of length `len` may grow by one slot
pub(crate) fn check_grow(len: usize, limit: u32) -> Result<(), ArenaError> {
    if len >= limit as usize {
        Err(ArenaError::CapacityExhausted { limit })
    } else {
        Ok(())
    }
}

impl<Tag: ?Sized> SparseMap<Tag> {
    const FREELIST_END: u32 = Handle::<Tag>::FREELIST_END_IDX;

    /// Create a new, empty [`SparseMap`]
    pub const fn new() -> Self {
        Self {
            dense: Vec::new(),
            sparse: Vec::new(),
            freelist_head: Self::FREELIST_END,
            retired: 0,
            slot_limit: Handle::<Tag>::SPARSE_MAX_IDX,
            _tag: PhantomData,
        }
    }

    /// Create a new, empty [`SparseMap`] that never creates more than `limit` sparse slots
    ///
    /// Once every slot is live or retired, [`SparseMap::try_insert`] fails. Limits
    /// above [`Handle::SPARSE_MAX_IDX`] are lowered to it.
    pub fn with_slot_limit(limit: u32) -> Self {
        Self {
            slot_limit: limit.min(Handle::<Tag>::SPARSE_MAX_IDX),
            ..Self::new()
        }
    }

    /// The most sparse slots this map will ever create
    #[inline]
    pub fn slot_limit(&self) -> u32 {
        self.slot_limit
    }

    /// Create a new, empty [`SparseMap`] with room for `capacity` live handles
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            dense: Vec::with_capacity(capacity),
            sparse: Vec::with_capacity(capacity),
            ..Self::new()
        }
    }

    /// The number of live handles
    #[inline]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Returns true if there are no live handles
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// The number of sparse slots ever created (live, free, or retired)
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.sparse.len()
    }

    /// The number of sparse slots that were retired because their version was exhausted
    #[inline]
    pub fn retired_count(&self) -> usize {
        self.retired
    }

    /// Allocate a new handle, whose dense position is `self.len()` before the call
    ///
    /// # Panics
    ///
    /// If the sparse slots are exhausted, see [`SparseMap::try_insert`]
    #[inline]
    pub fn insert(&mut self) -> Handle<Tag> {
        match self.try_insert() {
            Ok(handle) => handle,
            Err(err) => insert_failed(err),
        }
    }

    /// Allocate a new handle, whose dense position is `self.len()` before the call
    ///
    /// Returns an error, without changing anything, if no sparse slot is free
    /// and the sparse slots can't grow past [`SparseMap::slot_limit`]
    pub fn try_insert(&mut self) -> Result<Handle<Tag>, ArenaError> {
        // dense.len() <= sparse.len() < SPARSE_MAX_IDX, so this can't truncate
        let dense = self.dense.len() as u32;
        let id = self.allocate_sparse(dense)?;
        self.dense.push(id);
        Ok(Handle::new(id, self.sparse[id as usize].version))
    }

    fn allocate_sparse(&mut self, dense: u32) -> Result<u32, ArenaError> {
        if let Some(id) = self.freelist_pop() {
            self.sparse[id as usize].state = SlotState::Live(dense);
            return Ok(id);
        }

        let id = self.sparse.len();
        if let Err(err) = check_grow(id, self.slot_limit) {
            log::warn!("sparse map is out of slots ({id} created, {} retired)", self.retired);
            return Err(err);
        }

        self.sparse.push(SparseEntry {
            state: SlotState::Live(dense),
            version: 0,
        });
        Ok(id as u32)
    }

    fn freelist_pop(&mut self) -> Option<u32> {
        let id = self.freelist_head;
        if id == Self::FREELIST_END {
            return None;
        }

        let SlotState::Free(next) = self.sparse[id as usize].state else {
            unreachable!("free list points at slot {id}, which isn't free")
        };
        self.freelist_head = next;
        Some(id)
    }

    fn free_sparse(&mut self, id: u32) {
        let entry = &mut self.sparse[id as usize];
        // live slots never hold DISABLED_VERSION, so this can't overflow
        entry.version += 1;

        if entry.version == Handle::<Tag>::DISABLED_VERSION {
            entry.state = SlotState::Retired;
            self.retired += 1;
            log::debug!("sparse slot {id} exhausted its versions and was retired");
        } else {
            entry.state = SlotState::Free(self.freelist_head);
            self.freelist_head = id;
        }
    }

    /// Get the dense position associated with the handle
    ///
    /// Returns None if the handle is stale or was never issued by this map
    #[inline]
    pub fn get(&self, handle: Handle<Tag>) -> Option<usize> {
        match *self.sparse.get(handle.id() as usize)? {
            SparseEntry {
                state: SlotState::Live(dense),
                version,
            } if version == handle.version() => Some(dense as usize),
            _ => None,
        }
    }

    /// Get the dense position associated with the handle
    ///
    /// # Panics
    ///
    /// If the handle is stale or was never issued by this map
    #[inline]
    pub fn at(&self, handle: Handle<Tag>) -> usize {
        match self.get(handle) {
            Some(dense) => dense,
            None => stale_handle(handle),
        }
    }

    /// Returns true if the handle currently resolves to a dense position
    #[inline]
    pub fn contains(&self, handle: Handle<Tag>) -> bool {
        self.get(handle).is_some()
    }

    /// Get the handle that currently owns a dense position
    ///
    /// Returns None if the position is out of bounds
    #[inline]
    pub fn handle_at(&self, dense: usize) -> Option<Handle<Tag>> {
        let id = *self.dense.get(dense)?;
        Some(Handle::new(id, self.sparse[id as usize].version))
    }

    /// Try to free the handle
    ///
    /// On success, returns the dense position the handle owned. The element at
    /// the last dense position now owns that position instead, so the
    /// associated array(s) must be swap-removed at it.
    ///
    /// Returns None if the handle is stale or was never issued by this map
    pub fn try_remove(&mut self, handle: Handle<Tag>) -> Option<usize> {
        let dense = self.get(handle)? as u32;

        self.dense.swap_remove(dense as usize);

        // If we removed the end of the list, then nothing moved
        if let Some(&moved) = self.dense.get(dense as usize) {
            self.sparse[moved as usize].state = SlotState::Live(dense);
        }

        self.free_sparse(handle.id());
        Some(dense as usize)
    }

    /// Free the handle, and return the dense position it owned
    ///
    /// # Panics
    ///
    /// If the handle is stale or was never issued by this map
    pub fn remove(&mut self, handle: Handle<Tag>) -> usize {
        match self.try_remove(handle) {
            Some(dense) => dense,
            None => stale_handle(handle),
        }
    }

    /// Free the handle
    ///
    /// Returns false if the handle is stale or was never issued by this map
    #[inline]
    pub fn erase(&mut self, handle: Handle<Tag>) -> bool {
        self.try_remove(handle).is_some()
    }

    /// Drop every slot and reset the free list
    ///
    /// NOTE: this is a hard reset, not a version bump. Handles issued before a
    /// `clear` may compare equal to handles issued after it, and may resolve
    /// again. Don't keep handles across a `clear`.
    pub fn clear(&mut self) {
        log::debug!(
            "clearing sparse map ({} live, {} slots)",
            self.dense.len(),
            self.sparse.len()
        );
        self.dense.clear();
        self.sparse.clear();
        self.freelist_head = Self::FREELIST_END;
        self.retired = 0;
    }

    /// Get an iterator over all the live handles, in dense order
    ///
    /// The nth handle yielded owns dense position n. This iterator will yield
    /// exactly `self.len()` elements
    pub fn handles(&self) -> Handles<'_, Tag> {
        Handles {
            dense: self.dense.iter(),
            map: self,
        }
    }
}

impl<Tag: ?Sized> Default for SparseMap<Tag> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Tag: ?Sized> Clone for SparseMap<Tag> {
    fn clone(&self) -> Self {
        Self {
            dense: self.dense.clone(),
            sparse: self.sparse.clone(),
            freelist_head: self.freelist_head,
            retired: self.retired,
            slot_limit: self.slot_limit,
            _tag: PhantomData,
        }
    }
}

impl<Tag: ?Sized> fmt::Debug for SparseMap<Tag> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseMap")
            .field("len", &self.len())
            .field("slots", &self.slot_count())
            .field("retired", &self.retired)
            .finish()
    }
}

/// An iterator over the live handles of a [`SparseMap`], created from
/// [`SparseMap::handles`]
pub struct Handles<'a, Tag: ?Sized> {
    dense: core::slice::Iter<'a, u32>,
    map: &'a SparseMap<Tag>,
}

impl<Tag: ?Sized> Handles<'_, Tag> {
    fn handle(&self, id: u32) -> Handle<Tag> {
        Handle::new(id, self.map.sparse[id as usize].version)
    }
}

impl<Tag: ?Sized> Iterator for Handles<'_, Tag> {
    type Item = Handle<Tag>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = *self.dense.next()?;
        Some(self.handle(id))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        let id = *self.dense.nth(n)?;
        Some(self.handle(id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.dense.size_hint()
    }
}

impl<Tag: ?Sized> DoubleEndedIterator for Handles<'_, Tag> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let id = *self.dense.next_back()?;
        Some(self.handle(id))
    }
}

impl<Tag: ?Sized> ExactSizeIterator for Handles<'_, Tag> {}
impl<Tag: ?Sized> FusedIterator for Handles<'_, Tag> {}

#[cfg(test)]
mod tests {
    use super::*;

    type Map = SparseMap;

    #[test]
    fn insert_assigns_dense_positions_in_order() {
        let mut map = Map::new();
        let a = map.insert();
        let b = map.insert();
        let c = map.insert();

        assert_eq!(map.len(), 3);
        assert_eq!(map.get(a), Some(0));
        assert_eq!(map.get(b), Some(1));
        assert_eq!(map.get(c), Some(2));
        assert_eq!(a.version(), 0);
    }

    #[test]
    fn remove_swaps_last_into_hole() {
        let mut map = Map::new();
        let a = map.insert();
        let b = map.insert();
        let c = map.insert();

        assert_eq!(map.try_remove(a), Some(0));
        assert!(!map.contains(a));
        assert_eq!(map.get(c), Some(0));
        assert_eq!(map.get(b), Some(1));
        assert_eq!(map.handle_at(0), Some(c));
        assert_eq!(map.handle_at(1), Some(b));
        assert_eq!(map.handle_at(2), None);
    }

    #[test]
    fn removing_the_last_element_does_not_swap() {
        let mut map = Map::new();
        let a = map.insert();
        let b = map.insert();

        assert_eq!(map.try_remove(b), Some(1));
        assert_eq!(map.get(a), Some(0));

        assert_eq!(map.try_remove(a), Some(0));
        assert!(map.is_empty());
    }

    #[test]
    fn erase_unknown_is_soft() {
        let mut map = Map::new();
        let a = map.insert();
        assert!(map.erase(a));
        assert!(!map.erase(a));
        assert!(!map.erase(Handle::INVALID));
        assert_eq!(map.get(a), None);
        assert_eq!(map.len(), 0);
    }

    #[test]
    fn freed_slots_are_reused_with_a_new_version() {
        let mut map = Map::new();
        let a = map.insert();
        let _b = map.insert();
        map.remove(a);

        let c = map.insert();
        assert_eq!(c.id(), a.id());
        assert_eq!(c.version(), a.version() + 1);
        assert_ne!(a, c);
        assert!(!map.contains(a));
        assert!(map.contains(c));
        assert_eq!(map.slot_count(), 2);
    }

    #[test]
    fn free_list_is_lifo() {
        let mut map = Map::new();
        let a = map.insert();
        let b = map.insert();
        let c = map.insert();
        map.remove(a);
        map.remove(c);

        assert_eq!(map.insert().id(), c.id());
        assert_eq!(map.insert().id(), a.id());
        assert_eq!(map.insert().id(), 3);
        assert!(map.contains(b));
    }

    #[test]
    fn exhausted_slot_is_never_reused() {
        let mut map = Map::new();
        let a = map.insert();
        map.sparse[a.id() as usize].version = Handle::<DefaultTag>::DISABLED_VERSION - 1;
        let a = map.handle_at(0).unwrap();

        map.remove(a);
        assert_eq!(map.retired_count(), 1);
        assert!(!map.contains(a));

        let b = map.insert();
        assert_ne!(b.id(), a.id());
        assert_eq!(b.version(), 0);
        assert_eq!(map.slot_count(), 2);

        // retired slots don't resolve, even with the exhausted version
        assert!(!map.contains(Handle::new(a.id(), Handle::<DefaultTag>::DISABLED_VERSION)));
    }

    #[test]
    fn clear_resets_everything() {
        let mut map = Map::new();
        let a = map.insert();
        let _ = map.insert();
        map.remove(a);
        map.clear();

        assert!(map.is_empty());
        assert_eq!(map.slot_count(), 0);
        assert_eq!(map.retired_count(), 0);
        assert!(!map.contains(a));

        // a hard reset starts ids and versions over
        assert_eq!(map.insert(), Handle::new(0, 0));
    }

    #[test]
    fn handles_follow_dense_order() {
        let mut map = Map::new();
        let hs: Vec<_> = (0..5).map(|_| map.insert()).collect();
        map.remove(hs[1]);

        let live: Vec<_> = map.handles().collect();
        assert_eq!(live, [hs[0], hs[4], hs[2], hs[3]]);
        assert_eq!(map.handles().len(), 4);
        assert_eq!(map.handles().next_back(), Some(hs[3]));

        for (pos, h) in map.handles().enumerate() {
            assert_eq!(map.get(h), Some(pos));
        }
    }

    #[test]
    #[should_panic = "stale or unknown handle"]
    fn remove_stale_panics() {
        let mut map = Map::new();
        let a = map.insert();
        map.remove(a);
        map.remove(a);
    }

    const MAX: u32 = Handle::<DefaultTag>::SPARSE_MAX_IDX;

    #[test]
    fn growth_stops_at_the_sparse_ceiling() {
        assert_eq!(check_grow(0, MAX), Ok(()));
        assert_eq!(check_grow(MAX as usize - 1, MAX), Ok(()));
        assert_eq!(
            check_grow(MAX as usize, MAX),
            Err(ArenaError::CapacityExhausted { limit: MAX })
        );
        assert!(check_grow(u32::MAX as usize, MAX).is_err());

        assert_eq!(Map::new().slot_limit(), MAX);
        assert_eq!(Map::with_slot_limit(u32::MAX).slot_limit(), MAX);
    }

    #[test]
    fn exhaustion_leaves_the_map_unchanged() {
        let mut map = Map::with_slot_limit(3);
        let a = map.insert();
        let b = map.insert();
        let c = map.insert();

        // freed slots are still handed out at the limit
        map.remove(b);
        let d = map.try_insert().unwrap();
        assert_eq!(d.id(), b.id());

        assert_eq!(
            map.try_insert(),
            Err(ArenaError::CapacityExhausted { limit: 3 })
        );
        assert_eq!(map.len(), 3);
        assert_eq!(map.slot_count(), 3);
        assert_eq!(map.handles().collect::<Vec<_>>(), [a, d, c]);

        // the free list survived the failed insert
        map.remove(c);
        let e = map.try_insert().unwrap();
        assert_eq!(e.id(), c.id());
        assert_eq!(e.version(), c.version() + 1);
        assert!(map.try_insert().is_err());
    }

    #[test]
    fn retired_slots_count_towards_the_limit() {
        let mut map = Map::with_slot_limit(1);
        let a = map.insert();
        map.sparse[a.id() as usize].version = Handle::<DefaultTag>::DISABLED_VERSION - 1;
        map.remove(map.handle_at(0).unwrap());

        assert_eq!(map.retired_count(), 1);
        assert_eq!(
            map.try_insert(),
            Err(ArenaError::CapacityExhausted { limit: 1 })
        );
        assert!(map.is_empty());
    }

    #[test]
    #[should_panic = "sparse slot capacity exhausted: cannot allocate more than 2 slots"]
    fn insert_past_the_limit_panics() {
        let mut map = Map::with_slot_limit(2);
        let _ = map.insert();
        let _ = map.insert();
        let _ = map.insert();
    }
}
