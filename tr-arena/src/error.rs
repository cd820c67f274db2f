//! see [`ArenaError`]

use thiserror::Error;

/// Errors reported by the allocating operations of this crate
///
/// Unknown or stale handles are not errors, lookups report them as
/// [`None`] or `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ArenaError {
    /// Every sparse slot id below `limit` is in use or retired
    #[error("sparse slot capacity exhausted: cannot allocate more than {limit} slots")]
    CapacityExhausted {
        /// The number of sparse slots that can ever exist
        limit: u32,
    },
}

#[cold]
#[inline(never)]
pub(crate) fn insert_failed(err: ArenaError) -> ! {
    panic!("{err}")
}
