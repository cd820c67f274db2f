#![no_std]
#![forbid(
    unsafe_code,
    missing_docs,
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]

//! # tr-arena
//!
//! Generational handles, and the structures that hand them out.
//!
//! ## Handles
//!
//! A [`Handle`] is a slot id plus the version that slot had when the handle
//! was issued. Handles are plain `Copy` values with no reference to the
//! structure that issued them, so they can be stored anywhere.
//!
//! Each time a slot is freed its version is bumped. A handle whose version
//! doesn't match its slot any more is stale, and every lookup with it fails.
//! This is how the [ABA problem](https://en.wikipedia.org/wiki/ABA_problem)
//! is avoided:
//!
//! ```
//! use tr_arena::SlotMap;
//!
//! let mut map = SlotMap::<char>::new();
//! let key_a = map.insert('a');
//! let key_b = map.insert('b');
//!
//! assert_eq!(map.remove(key_a), 'a');
//!
//! // this will be inserted into the same slot that 'a' was inserted into
//! let key_c = map.insert('c');
//!
//! assert_eq!(key_a.id(), key_c.id());
//!
//! // even though key_a has the same id as key_c, it no longer resolves,
//! // since the slot's version was bumped when 'a' was removed
//! assert_eq!(map.get(key_a), None);
//! assert_eq!(map.try_remove(key_a), None);
//! assert_eq!(map[key_b], 'b');
//! ```
//!
//! Versions are 32 bits. A slot that exhausts them is retired and never
//! used again, so no handle is ever issued twice. The exception is `clear`,
//! which is a hard reset.
//!
//! ## Structures
//!
//! * [`SparseMap`] only allocates handles and maps them to dense positions.
//!   Pair it with your own array(s) to build dense storage.
//! * [`SlotMap`] pairs a [`SparseMap`] with a [`Vec`](alloc::vec::Vec), giving O(1) insertion,
//!   lookup and removal with all values stored contiguously.
//!
//! ## Failure modes
//!
//! Looking up a stale or unknown handle is expected and is reported with
//! [`None`] or `false`. Removing or indexing with one through the panicking
//! APIs ([`SlotMap::remove`], `map[handle]`) is a bug and panics. Running
//! out of slot ids is reported as an [`ArenaError`] by the `try_insert`
//! methods.

extern crate alloc;

pub mod error;
pub mod handle;
pub mod slot_map;
pub mod sparse_map;

pub use error::ArenaError;
pub use handle::{DefaultTag, Handle};
pub use slot_map::SlotMap;
pub use sparse_map::SparseMap;
