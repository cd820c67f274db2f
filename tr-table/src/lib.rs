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

//! # tr-table
//!
//! A columnar [`Table`] with a schema that changes at runtime, built from
//! the handle allocator in [`tr_arena`] and the runtime-typed arrays in
//! [`tr_vec`].
//!
//! ```
//! use tr_table::{Table, TableError};
//!
//! let mut table = Table::new();
//! let player = table.create_entity();
//!
//! // attributes created later are sized to the existing entities
//! let health = table.create_attribute::<u32>();
//! assert_eq!(table.get::<u32>(health, player), Ok(&0));
//!
//! table.set(health, player, 100u32)?;
//! let enemy = table.create_entity();
//! table.set(health, enemy, 30u32)?;
//! assert_eq!(table.column::<u32>(health)?, [100, 30]);
//!
//! // removing an entity moves the last one into its place
//! table.remove_entity(player);
//! assert_eq!(table.column::<u32>(health)?, [30]);
//! assert_eq!(table.get::<u32>(health, player), Err(TableError::UnknownEntity));
//! # Ok::<(), TableError>(())
//! ```
//!
//! The building blocks are re-exported, so this crate is the only one a
//! user needs to depend on.

#[cfg(test)]
extern crate alloc;

pub mod error;
pub mod table;

pub use error::TableError;
pub use table::{AttributeHandle, AttributeTag, EntityHandle, EntityTag, Table};

pub use tr_arena::{self, ArenaError, DefaultTag, Handle, SlotMap, SparseMap};
pub use tr_vec::{self, ElementType, TypeErasedVec, UninitSlot, VecError};
