//! see [`VecError`]

use thiserror::Error;

/// Contract violations reported by [`TypeErasedVec`](crate::TypeErasedVec)
///
/// Every operation that returns one of these checks before it mutates, so
/// the vector is unchanged when an error comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum VecError {
    /// Tried to remove an element from an empty vector
    #[error("attempted to pop an empty container")]
    Empty,
    /// The position is not below the vector's length
    #[error("index {index} out of bounds for length {len}")]
    OutOfBounds {
        /// The requested position
        index: usize,
        /// The vector's length at the time
        len: usize,
    },
    /// The requested type isn't the type the vector was created for
    #[error("type safety check failed: vector holds `{expected}`, but `{found}` was requested")]
    TypeMismatch {
        /// The type the vector is bound to
        expected: &'static str,
        /// The type the caller asked for
        found: &'static str,
    },
    /// The requested capacity doesn't fit in memory
    #[error("capacity overflow")]
    CapacityOverflow,
}

#[cold]
#[inline(never)]
pub(crate) fn capacity_overflow() -> ! {
    panic!("{}", VecError::CapacityOverflow)
}
