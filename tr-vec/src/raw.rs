//! An owned, aligned, untyped allocation
//!
//! [`RawBuf`] only knows the layout of one element and how many elements it
//! has room for. It never tracks which of those elements are initialized,
//! that's up to [`TypeErasedVec`](crate::TypeErasedVec).

use core::{alloc::Layout, mem, ptr::NonNull};

use alloc::alloc::{alloc, dealloc, handle_alloc_error};

use crate::error::VecError;

pub(crate) struct RawBuf {
    ptr: NonNull<u8>,
    /// in elements, zero while nothing is allocated
    capacity: usize,
    elem: Layout,
}

// SAFETY: RawBuf uniquely owns its allocation, and only ever holds plain old data
unsafe impl Send for RawBuf {}
// SAFETY: shared access to a RawBuf is read-only
unsafe impl Sync for RawBuf {}

impl RawBuf {
    /// An empty buffer, this doesn't allocate
    pub(crate) const fn new(elem: Layout) -> Self {
        Self {
            ptr: NonNull::dangling(),
            capacity: 0,
            elem,
        }
    }

    fn array_layout(elem: Layout, capacity: usize) -> Result<Layout, VecError> {
        let size = elem
            .size()
            .checked_mul(capacity)
            .ok_or(VecError::CapacityOverflow)?;
        Layout::from_size_align(size, elem.align()).map_err(|_| VecError::CapacityOverflow)
    }

    /// A buffer with room for exactly `capacity` elements
    pub(crate) fn with_capacity(elem: Layout, capacity: usize) -> Result<Self, VecError> {
        let layout = Self::array_layout(elem, capacity)?;

        if layout.size() == 0 {
            return Ok(Self::new(elem));
        }

        // SAFETY: the layout has a non-zero size
        let ptr = unsafe { alloc(layout) };
        let Some(ptr) = NonNull::new(ptr) else {
            handle_alloc_error(layout)
        };

        Ok(Self {
            ptr,
            capacity,
            elem,
        })
    }

    /// The number of elements this buffer has room for
    ///
    /// zero-sized elements never need room, so this is unbounded for them
    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        if self.elem.size() == 0 {
            usize::MAX
        } else {
            self.capacity
        }
    }

    /// Returns true if this buffer owns an allocation
    #[inline]
    pub(crate) fn is_allocated(&self) -> bool {
        self.capacity != 0 && self.elem.size() != 0
    }

    /// A pointer to the start of the buffer
    ///
    /// This is dangling if nothing is allocated, and is only aligned for the element
    /// type if [`RawBuf::is_allocated`] returns true
    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// Move to a new allocation with room for `capacity` elements, keeping the first
    /// `live` elements
    ///
    /// If this fails, the buffer is left untouched.
    pub(crate) fn reallocate(&mut self, capacity: usize, live: usize) -> Result<(), VecError> {
        debug_assert!(live <= capacity && live <= self.capacity());

        let mut new = Self::with_capacity(self.elem, capacity)?;
        let bytes = live * self.elem.size();
        if bytes != 0 {
            // SAFETY: both buffers have room for at least `live` elements,
            // and they are separate allocations
            unsafe { core::ptr::copy_nonoverlapping(self.as_ptr(), new.as_ptr(), bytes) }
        }

        mem::swap(self, &mut new);
        // the old allocation is released when `new` goes out of scope
        Ok(())
    }
}

impl Drop for RawBuf {
    fn drop(&mut self) {
        if !self.is_allocated() {
            return;
        }

        if let Ok(layout) = Self::array_layout(self.elem, self.capacity) {
            // SAFETY: the buffer was allocated with exactly this layout in `with_capacity`
            unsafe { dealloc(self.ptr.as_ptr(), layout) }
        }
    }
}
