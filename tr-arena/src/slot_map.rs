//! A keyed collection with contiguous value storage
//!
//! see [`SlotMap`] for details

use alloc::vec::Vec;
use core::{fmt, iter::FusedIterator, ops};

use crate::{
    error::{insert_failed, ArenaError},
    handle::{stale_handle, DefaultTag, Handle},
    sparse_map::{self, SparseMap},
};

/// [`SlotMap`] is the canonical way to use a [`SparseMap`]
///
/// It pairs a [`SparseMap`] with a [`Vec<V>`](Vec). Values live contiguously in the
/// vector, in dense order. Removal swaps the last value into the hole, so the
/// iteration order is neither insertion order nor stable across removals.
pub struct SlotMap<V, Tag: ?Sized = DefaultTag> {
    values: Vec<V>,
    mapping: SparseMap<Tag>,
}

impl<V, Tag: ?Sized> SlotMap<V, Tag> {
    /// Create a new, empty [`SlotMap`]
    pub const fn new() -> Self {
        Self {
            values: Vec::new(),
            mapping: SparseMap::new(),
        }
    }

    /// Create a new, empty [`SlotMap`] with room for `capacity` values
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            mapping: SparseMap::with_capacity(capacity),
        }
    }

    /// Create a new, empty [`SlotMap`] that never holds more than `limit` values
    ///
    /// see [`SparseMap::with_slot_limit`]
    pub fn with_slot_limit(limit: u32) -> Self {
        Self {
            values: Vec::new(),
            mapping: SparseMap::with_slot_limit(limit),
        }
    }

    /// The number of values in the [`SlotMap`]
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no values in the [`SlotMap`]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Insert a new value into the [`SlotMap`]
    ///
    /// # Panics
    ///
    /// If the handles are exhausted, see [`SlotMap::try_insert`]
    pub fn insert(&mut self, value: V) -> Handle<Tag> {
        match self.try_insert(value) {
            Ok(handle) => handle,
            Err(err) => insert_failed(err),
        }
    }

    /// Insert a new value into the [`SlotMap`]
    ///
    /// Returns an error if the handles are exhausted, in which case the value is dropped
    pub fn try_insert(&mut self, value: V) -> Result<Handle<Tag>, ArenaError> {
        let handle = self.mapping.try_insert()?;
        debug_assert_eq!(self.mapping.get(handle), Some(self.values.len()));
        self.values.push(value);
        Ok(handle)
    }

    /// Returns true if the handle refers to a value in the [`SlotMap`]
    #[inline]
    pub fn contains(&self, handle: Handle<Tag>) -> bool {
        self.mapping.contains(handle)
    }

    /// Get a reference to the value associated with the handle
    ///
    /// Returns None if the handle is stale or unknown
    #[inline]
    pub fn get(&self, handle: Handle<Tag>) -> Option<&V> {
        let index = self.mapping.get(handle)?;
        self.values.get(index)
    }

    /// Get a mutable reference to the value associated with the handle
    ///
    /// Returns None if the handle is stale or unknown
    #[inline]
    pub fn get_mut(&mut self, handle: Handle<Tag>) -> Option<&mut V> {
        let index = self.mapping.get(handle)?;
        self.values.get_mut(index)
    }

    /// Try to remove the value associated with the handle
    ///
    /// Returns None if the handle is stale or unknown
    pub fn try_remove(&mut self, handle: Handle<Tag>) -> Option<V> {
        let index = self.mapping.try_remove(handle)?;
        // the mapping moved its last position into `index`, so must we
        Some(self.values.swap_remove(index))
    }

    /// Remove the value associated with the handle
    ///
    /// # Panics
    ///
    /// If the handle is stale or unknown
    pub fn remove(&mut self, handle: Handle<Tag>) -> V {
        match self.try_remove(handle) {
            Some(value) => value,
            None => stale_handle(handle),
        }
    }

    /// Remove all values
    ///
    /// NOTE: as with [`SparseMap::clear`], handles issued before the clear
    /// may resolve again after it
    pub fn clear(&mut self) {
        self.values.clear();
        self.mapping.clear();
    }

    /// The values in dense order
    #[inline]
    pub fn values(&self) -> &[V] {
        &self.values
    }

    /// The values in dense order
    #[inline]
    pub fn values_mut(&mut self) -> &mut [V] {
        &mut self.values
    }

    /// The handles of all values, in dense order
    #[inline]
    pub fn handles(&self) -> sparse_map::Handles<'_, Tag> {
        self.mapping.handles()
    }

    /// The [`SparseMap`] that this [`SlotMap`] uses
    #[inline]
    pub fn mapping(&self) -> &SparseMap<Tag> {
        &self.mapping
    }

    /// Iterate over all handles and values, in dense order
    pub fn iter(&self) -> Iter<'_, V, Tag> {
        Iter {
            handles: self.mapping.handles(),
            values: self.values.iter(),
        }
    }

    /// Iterate over all handles and mutable values, in dense order
    pub fn iter_mut(&mut self) -> IterMut<'_, V, Tag> {
        IterMut {
            handles: self.mapping.handles(),
            values: self.values.iter_mut(),
        }
    }
}

impl<V, Tag: ?Sized> Default for SlotMap<V, Tag> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone, Tag: ?Sized> Clone for SlotMap<V, Tag> {
    fn clone(&self) -> Self {
        Self {
            values: self.values.clone(),
            mapping: self.mapping.clone(),
        }
    }
}

impl<V: fmt::Debug, Tag: ?Sized> fmt::Debug for SlotMap<V, Tag> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<V, Tag: ?Sized> ops::Index<Handle<Tag>> for SlotMap<V, Tag> {
    type Output = V;

    fn index(&self, handle: Handle<Tag>) -> &Self::Output {
        match self.get(handle) {
            Some(value) => value,
            None => stale_handle(handle),
        }
    }
}

impl<V, Tag: ?Sized> ops::IndexMut<Handle<Tag>> for SlotMap<V, Tag> {
    fn index_mut(&mut self, handle: Handle<Tag>) -> &mut Self::Output {
        match self.mapping.get(handle) {
            Some(index) => &mut self.values[index],
            None => stale_handle(handle),
        }
    }
}

impl<'a, V, Tag: ?Sized> IntoIterator for &'a SlotMap<V, Tag> {
    type Item = (Handle<Tag>, &'a V);
    type IntoIter = Iter<'a, V, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, V, Tag: ?Sized> IntoIterator for &'a mut SlotMap<V, Tag> {
    type Item = (Handle<Tag>, &'a mut V);
    type IntoIter = IterMut<'a, V, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// An iterator over the handles and values of a [`SlotMap`], created from [`SlotMap::iter`]
pub struct Iter<'a, V, Tag: ?Sized> {
    handles: sparse_map::Handles<'a, Tag>,
    values: core::slice::Iter<'a, V>,
}

impl<'a, V, Tag: ?Sized> Iterator for Iter<'a, V, Tag> {
    type Item = (Handle<Tag>, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        Some((self.handles.next()?, self.values.next()?))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.values.size_hint()
    }
}

impl<V, Tag: ?Sized> DoubleEndedIterator for Iter<'_, V, Tag> {
    fn next_back(&mut self) -> Option<Self::Item> {
        Some((self.handles.next_back()?, self.values.next_back()?))
    }
}

impl<V, Tag: ?Sized> ExactSizeIterator for Iter<'_, V, Tag> {}
impl<V, Tag: ?Sized> FusedIterator for Iter<'_, V, Tag> {}

/// An iterator over the handles and mutable values of a [`SlotMap`], created from
/// [`SlotMap::iter_mut`]
pub struct IterMut<'a, V, Tag: ?Sized> {
    handles: sparse_map::Handles<'a, Tag>,
    values: core::slice::IterMut<'a, V>,
}

impl<'a, V, Tag: ?Sized> Iterator for IterMut<'a, V, Tag> {
    type Item = (Handle<Tag>, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        Some((self.handles.next()?, self.values.next()?))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.values.size_hint()
    }
}

impl<V, Tag: ?Sized> DoubleEndedIterator for IterMut<'_, V, Tag> {
    fn next_back(&mut self) -> Option<Self::Item> {
        Some((self.handles.next_back()?, self.values.next_back()?))
    }
}

impl<V, Tag: ?Sized> ExactSizeIterator for IterMut<'_, V, Tag> {}
impl<V, Tag: ?Sized> FusedIterator for IterMut<'_, V, Tag> {}
