#![no_std]
#![forbid(
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    unsafe_op_in_unsafe_fn,
    missing_docs,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]

//! # tr-vec
//!
//! [`TypeErasedVec`] is a growable, contiguous array whose element type is
//! chosen at runtime, and checked on every typed access.
//!
//! The vector only remembers the size, alignment and [`TypeId`](core::any::TypeId)
//! of its element type (see [`ElementType`]). Everything it does on its own
//! (growing, copying, swap-removing) is a plain byte copy. That is only
//! correct for plain old data, so element types must implement
//! [`bytemuck::Pod`], which rejects anything with drop glue, padding or
//! pointers at compile time.
//!
//! ```
//! use tr_vec::TypeErasedVec;
//!
//! let mut v = TypeErasedVec::new::<u32>();
//! v.push(10u32).unwrap();
//! v.push(20u32).unwrap();
//!
//! assert_eq!(v.as_slice::<u32>().unwrap(), [10, 20]);
//!
//! // the wrong type is always rejected
//! assert!(v.get::<i32>(0).is_err());
//! ```
//!
//! ## Two-phase insertion
//!
//! Code that only knows the element type at runtime can't produce a typed
//! value, so [`TypeErasedVec::push_uninit`] reserves a slot and returns an
//! [`UninitSlot`], which can later be filled by [`TypeErasedVec::commit`].
//! Reserved slots are zero-filled, so reading one before it is committed
//! yields [`Zeroable::zeroed`](bytemuck::Zeroable::zeroed) rather than
//! undefined behavior.

extern crate alloc;

use core::{fmt, mem, ptr::NonNull, slice};

use bytemuck::Pod;

mod element;
mod error;
mod raw;

pub use element::ElementType;
pub use error::VecError;

use error::capacity_overflow;
use raw::RawBuf;

/// A growable array of a single, runtime-chosen, [`Pod`] element type
///
/// see the [crate docs](crate) for details
pub struct TypeErasedVec {
    buf: RawBuf,
    len: usize,
    ty: ElementType,
}

/// A slot reserved by [`TypeErasedVec::push_uninit`]
///
/// The slot already counts towards the vector's length, and holds zeroes
/// until a value is committed to it with [`TypeErasedVec::commit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a reserved slot holds zeroes until a value is committed to it"]
pub struct UninitSlot {
    index: usize,
}

impl UninitSlot {
    /// The position of the slot in the vector
    pub const fn index(self) -> usize {
        self.index
    }
}

impl TypeErasedVec {
    /// Create an empty vector for elements of type `T`
    pub fn new<T: Pod>() -> Self {
        Self::with_element_type(ElementType::of::<T>())
    }

    /// Create an empty vector for elements of type `T`, with room for `capacity` elements
    ///
    /// # Panics
    ///
    /// If `capacity` elements of `T` don't fit in memory
    pub fn with_capacity<T: Pod>(capacity: usize) -> Self {
        let mut vec = Self::new::<T>();
        vec.reserve(capacity);
        vec
    }

    fn with_element_type(ty: ElementType) -> Self {
        Self {
            buf: RawBuf::new(ty.layout()),
            len: 0,
            ty,
        }
    }

    /// The element type this vector is bound to
    #[inline]
    pub fn element_type(&self) -> ElementType {
        self.ty
    }

    /// Returns true if this vector holds elements of type `T`
    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.ty.is::<T>()
    }

    /// The number of elements in the vector
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the vector has no elements
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The number of elements the vector can hold without reallocating
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Remove all elements, keeping the allocation
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    fn check_type<T: 'static>(&self) -> Result<(), VecError> {
        if self.is::<T>() {
            Ok(())
        } else {
            Err(VecError::TypeMismatch {
                expected: self.ty.name(),
                found: core::any::type_name::<T>(),
            })
        }
    }

    fn check_same_type(&self, other: &Self) -> Result<(), VecError> {
        if self.ty == other.ty {
            Ok(())
        } else {
            Err(VecError::TypeMismatch {
                expected: self.ty.name(),
                found: other.ty.name(),
            })
        }
    }

    /// Grow the allocation so it can hold at least `capacity` elements
    ///
    /// NOTE: unlike [`Vec::reserve`](alloc::vec::Vec::reserve), `capacity` is
    /// the total and not the number of additional elements. Does nothing if the
    /// vector is already large enough.
    ///
    /// # Panics
    ///
    /// If `capacity` elements don't fit in memory
    pub fn reserve(&mut self, capacity: usize) {
        if let Err(err) = self.try_reserve(capacity) {
            debug_assert_eq!(err, VecError::CapacityOverflow);
            capacity_overflow()
        }
    }

    /// Grow the allocation so it can hold at least `capacity` elements
    ///
    /// see [`TypeErasedVec::reserve`], this returns an error instead of panicking
    pub fn try_reserve(&mut self, capacity: usize) -> Result<(), VecError> {
        if capacity <= self.capacity() {
            return Ok(());
        }

        log::trace!(
            "growing TypeErasedVec<{}> from {} to {capacity} elements",
            self.ty.name(),
            self.capacity(),
        );
        self.buf.reallocate(capacity, self.len)
    }

    /// Double the capacity (starting at 1) until `len` elements fit
    fn grow_for(&mut self, len: usize) {
        let mut capacity = self.capacity();
        if len <= capacity {
            return;
        }

        while capacity < len {
            capacity = if capacity == 0 {
                1
            } else {
                capacity.saturating_mul(2)
            };
        }

        self.reserve(capacity)
    }

    fn zero_fill(&mut self, from: usize, to: usize) {
        let size = self.ty.size();
        if size == 0 || from >= to {
            return;
        }

        // SAFETY: `to <= capacity`, so the byte range lies inside the allocation
        unsafe { core::ptr::write_bytes(self.buf.as_ptr().add(from * size), 0, (to - from) * size) }
    }

    /// Reserve a new slot at the end of the vector
    ///
    /// The slot is zero-filled and counts towards [`TypeErasedVec::len`]
    /// right away. Use [`TypeErasedVec::commit`] to write a value to it.
    ///
    /// # Panics
    ///
    /// If the vector needs to grow and the new capacity doesn't fit in memory
    pub fn push_uninit(&mut self) -> UninitSlot {
        let index = self.len;
        self.grow_for(index + 1);
        self.zero_fill(index, index + 1);
        self.len += 1;
        UninitSlot { index }
    }

    /// Write a value to a slot reserved by [`TypeErasedVec::push_uninit`]
    ///
    /// Returns an error if `T` isn't the vector's element type, or if the slot
    /// was removed in the meantime
    pub fn commit<T: Pod>(&mut self, slot: UninitSlot, value: T) -> Result<&mut T, VecError> {
        let elem = self.get_mut::<T>(slot.index)?;
        *elem = value;
        Ok(elem)
    }

    /// Append a value to the end of the vector, and return its position
    ///
    /// Returns an error, without growing the vector, if `T` isn't the
    /// vector's element type
    pub fn push<T: Pod>(&mut self, value: T) -> Result<usize, VecError> {
        self.check_type::<T>()?;
        let slot = self.push_uninit();
        self.commit(slot, value)?;
        Ok(slot.index)
    }

    /// Remove the last element
    ///
    /// Returns [`VecError::Empty`] if there is nothing to remove
    pub fn pop(&mut self) -> Result<(), VecError> {
        if self.is_empty() {
            return Err(VecError::Empty);
        }
        self.len -= 1;
        Ok(())
    }

    /// Remove the element at `index` by moving the last element into its place
    ///
    /// This doesn't preserve ordering, but is O(1).
    pub fn swap_remove(&mut self, index: usize) -> Result<(), VecError> {
        if self.is_empty() {
            return Err(VecError::Empty);
        }
        if index >= self.len {
            return Err(VecError::OutOfBounds {
                index,
                len: self.len,
            });
        }

        let last = self.len - 1;
        let size = self.ty.size();
        if index != last && size != 0 {
            let base = self.buf.as_ptr();
            // SAFETY: both positions are below len, so in bounds of the allocation,
            // and they are different elements so they don't overlap
            unsafe { core::ptr::copy_nonoverlapping(base.add(last * size), base.add(index * size), size) }
        }

        self.len = last;
        Ok(())
    }

    /// Set the length of the vector to exactly `len`
    ///
    /// Shrinking just forgets the trailing elements. Growing appends zero-filled
    /// slots, doubling the capacity as needed.
    ///
    /// # Panics
    ///
    /// If the vector needs to grow and the new capacity doesn't fit in memory
    pub fn resize(&mut self, len: usize) {
        if len > self.len {
            self.grow_for(len);
            self.zero_fill(self.len, len);
        }
        self.len = len;
    }

    fn typed_ptr<T>(&self) -> *mut T {
        if self.buf.is_allocated() {
            self.buf.as_ptr().cast()
        } else {
            NonNull::dangling().as_ptr()
        }
    }

    /// View the elements as a slice of `T`
    ///
    /// Returns an error if `T` isn't the vector's element type
    pub fn as_slice<T: Pod>(&self) -> Result<&[T], VecError> {
        self.check_type::<T>()?;
        // SAFETY: the buffer was allocated for `T`, and the first `len` elements
        // are either committed or zero-filled, which is a valid `T` since `T: Pod`
        Ok(unsafe { slice::from_raw_parts(self.typed_ptr::<T>(), self.len) })
    }

    /// View the elements as a mutable slice of `T`
    ///
    /// Returns an error if `T` isn't the vector's element type
    pub fn as_mut_slice<T: Pod>(&mut self) -> Result<&mut [T], VecError> {
        self.check_type::<T>()?;
        // SAFETY: see `as_slice`, and `&mut self` guarantees unique access
        Ok(unsafe { slice::from_raw_parts_mut(self.typed_ptr::<T>(), self.len) })
    }

    /// Get a reference to the element at `index`
    ///
    /// Returns an error if `T` isn't the vector's element type, or `index` is out of bounds
    pub fn get<T: Pod>(&self, index: usize) -> Result<&T, VecError> {
        let len = self.len;
        self.as_slice::<T>()?
            .get(index)
            .ok_or(VecError::OutOfBounds { index, len })
    }

    /// Get a mutable reference to the element at `index`
    ///
    /// Returns an error if `T` isn't the vector's element type, or `index` is out of bounds
    pub fn get_mut<T: Pod>(&mut self, index: usize) -> Result<&mut T, VecError> {
        let len = self.len;
        self.as_mut_slice::<T>()?
            .get_mut(index)
            .ok_or(VecError::OutOfBounds { index, len })
    }

    /// The raw bytes of all elements
    pub fn as_bytes(&self) -> &[u8] {
        let len = self.len * self.ty.size();
        let ptr = if len == 0 {
            NonNull::dangling().as_ptr()
        } else {
            self.buf.as_ptr()
        };
        // SAFETY: the first `len` elements are initialized, and `Pod` types have no padding
        unsafe { slice::from_raw_parts(ptr, len) }
    }

    /// Replace the contents of this vector with a copy of `other`
    ///
    /// Returns an error, leaving `self` untouched, if the vectors have different element types
    pub fn assign_from(&mut self, other: &Self) -> Result<(), VecError> {
        self.check_same_type(other)?;
        *self = other.clone();
        Ok(())
    }

    /// Move the contents out of this vector
    ///
    /// The returned vector owns the old allocation. `self` stays bound to the
    /// same element type, but is left empty with no capacity.
    pub fn take(&mut self) -> Self {
        let buf = mem::replace(&mut self.buf, RawBuf::new(self.ty.layout()));
        Self {
            buf,
            len: mem::take(&mut self.len),
            ty: self.ty,
        }
    }

    /// Move the contents of `other` into this vector, dropping the old contents
    ///
    /// `other` is left as described in [`TypeErasedVec::take`]. Returns an
    /// error, leaving both vectors untouched, if they have different element types.
    pub fn assign_take(&mut self, other: &mut Self) -> Result<(), VecError> {
        self.check_same_type(other)?;
        *self = other.take();
        Ok(())
    }
}

impl Clone for TypeErasedVec {
    fn clone(&self) -> Self {
        // our own capacity already fits in memory
        let buf = RawBuf::with_capacity(self.ty.layout(), self.buf.capacity())
            .unwrap_or_else(|_| capacity_overflow());

        let bytes = self.as_bytes();
        if !bytes.is_empty() {
            // SAFETY: the new buffer has the same capacity as ours, and they are
            // separate allocations
            unsafe { core::ptr::copy_nonoverlapping(bytes.as_ptr(), buf.as_ptr(), bytes.len()) }
        }

        Self {
            buf,
            len: self.len,
            ty: self.ty,
        }
    }
}

impl fmt::Debug for TypeErasedVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeErasedVec")
            .field("element_type", &self.ty)
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .finish()
    }
}
