//! see [`TableError`]

use thiserror::Error;
use tr_arena::ArenaError;
use tr_vec::VecError;

/// Failures reported by [`Table`](crate::Table)
///
/// An error always leaves the table unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TableError {
    /// The entity handle is stale or was never issued by this table
    #[error("unknown or stale entity handle")]
    UnknownEntity,
    /// The attribute handle is stale or was never issued by this table
    #[error("unknown or stale attribute handle")]
    UnknownAttribute,
    /// No more entities or attributes can be allocated
    #[error(transparent)]
    Arena(#[from] ArenaError),
    /// The column rejected the access, usually because of a type mismatch
    #[error(transparent)]
    Vec(#[from] VecError),
}

#[cold]
#[inline(never)]
pub(crate) fn create_failed(err: TableError) -> ! {
    panic!("{err}")
}
