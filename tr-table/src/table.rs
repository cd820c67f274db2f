//! see [`Table`]

use core::fmt;

use bytemuck::Pod;
use tr_arena::{sparse_map::Handles, Handle, SlotMap, SparseMap};
use tr_vec::TypeErasedVec;

use crate::error::{create_failed, TableError};

/// Tags the handles of a [`Table`]'s entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityTag {}

/// Tags the handles of a [`Table`]'s attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttributeTag {}

/// A handle to a row of a [`Table`]
pub type EntityHandle = Handle<EntityTag>;

/// A handle to a column of a [`Table`]
pub type AttributeHandle = Handle<AttributeTag>;

/// A columnar table whose columns are added and removed at runtime
///
/// Rows are called entities and columns are called attributes. Each
/// attribute is a [`TypeErasedVec`] bound to one [`Pod`] type, and every
/// attribute has exactly one element per live entity. The element of an
/// entity sits at the same position in every attribute.
///
/// Removing an entity swap-removes its position from every attribute, so
/// positions are not stable. Use [`EntityHandle`]s to refer to entities.
#[derive(Default, Clone)]
pub struct Table {
    entities: SparseMap<EntityTag>,
    attributes: SlotMap<TypeErasedVec, AttributeTag>,
    /// capacity reserved up front by every new column
    column_capacity: usize,
}

impl Table {
    /// Create an empty table
    pub const fn new() -> Self {
        Self {
            entities: SparseMap::new(),
            attributes: SlotMap::new(),
            column_capacity: 0,
        }
    }

    /// Create an empty table with room for `entities` entities
    ///
    /// Both the entity allocator and every attribute created later start
    /// out with room for that many entities.
    pub fn with_capacity(entities: usize) -> Self {
        Self {
            entities: SparseMap::with_capacity(entities),
            attributes: SlotMap::new(),
            column_capacity: entities,
        }
    }

    /// Create an empty table that never holds more than `entities` entities
    /// or more than `attributes` attributes
    ///
    /// Past either limit, [`Table::try_create_entity`] and
    /// [`Table::try_create_attribute`] fail. see [`SparseMap::with_slot_limit`]
    pub fn with_limits(entities: u32, attributes: u32) -> Self {
        Self {
            entities: SparseMap::with_slot_limit(entities),
            attributes: SlotMap::with_slot_limit(attributes),
            column_capacity: 0,
        }
    }

    /// The number of live entities
    ///
    /// This is also the length of every attribute
    #[inline]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// The number of attributes
    #[inline]
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// Returns true if the entity handle is live
    #[inline]
    pub fn contains_entity(&self, entity: EntityHandle) -> bool {
        self.entities.contains(entity)
    }

    /// Returns true if the attribute handle is live
    #[inline]
    pub fn contains_attribute(&self, attribute: AttributeHandle) -> bool {
        self.attributes.contains(attribute)
    }

    /// Get an iterator over all live entities, in column order
    ///
    /// The nth entity yielded owns position n in every attribute
    pub fn entities(&self) -> Handles<'_, EntityTag> {
        self.entities.handles()
    }

    /// Get an iterator over all attributes
    pub fn attributes(&self) -> Handles<'_, AttributeTag> {
        self.attributes.handles()
    }

    /// Add an attribute holding values of type `T`
    ///
    /// The new attribute already has one zeroed element per live entity.
    ///
    /// # Panics
    ///
    /// If no more attributes can be allocated
    pub fn create_attribute<T: Pod>(&mut self) -> AttributeHandle {
        match self.try_create_attribute::<T>() {
            Ok(attribute) => attribute,
            Err(err) => create_failed(err),
        }
    }

    /// Add an attribute holding values of type `T`
    ///
    /// see [`Table::create_attribute`], this returns an error instead of panicking
    pub fn try_create_attribute<T: Pod>(&mut self) -> Result<AttributeHandle, TableError> {
        let mut column = TypeErasedVec::new::<T>();
        column.reserve(self.column_capacity);
        column.resize(self.entities.len());
        Ok(self.attributes.try_insert(column)?)
    }

    /// Remove an attribute and all of its values
    ///
    /// Returns false if the handle is stale or was never issued by this table
    pub fn remove_attribute(&mut self, attribute: AttributeHandle) -> bool {
        self.attributes.try_remove(attribute).is_some()
    }

    /// Add an entity
    ///
    /// Every attribute gets a zeroed element for it, use [`Table::set`] to fill them in.
    ///
    /// # Panics
    ///
    /// If no more entities can be allocated
    pub fn create_entity(&mut self) -> EntityHandle {
        match self.try_create_entity() {
            Ok(entity) => entity,
            Err(err) => create_failed(err),
        }
    }

    /// Add an entity
    ///
    /// see [`Table::create_entity`], this returns an error instead of panicking
    pub fn try_create_entity(&mut self) -> Result<EntityHandle, TableError> {
        let entity = self.entities.try_insert()?;

        for column in self.attributes.values_mut() {
            let _ = column.push_uninit();
        }

        Ok(entity)
    }

    /// Remove an entity, and its element from every attribute
    ///
    /// The last entity takes over the removed entity's position.
    ///
    /// Returns false if the handle is stale or was never issued by this table
    pub fn remove_entity(&mut self, entity: EntityHandle) -> bool {
        let Some(pos) = self.entities.try_remove(entity) else {
            return false;
        };

        for column in self.attributes.values_mut() {
            let removed = column.swap_remove(pos);
            debug_assert!(removed.is_ok(), "column length out of sync with entities");
        }

        true
    }

    /// Get the raw column of an attribute
    #[inline]
    pub fn attribute(&self, attribute: AttributeHandle) -> Option<&TypeErasedVec> {
        self.attributes.get(attribute)
    }

    fn column_at(&self, attribute: AttributeHandle) -> Result<&TypeErasedVec, TableError> {
        self.attributes
            .get(attribute)
            .ok_or(TableError::UnknownAttribute)
    }

    fn position(&self, entity: EntityHandle) -> Result<usize, TableError> {
        self.entities.get(entity).ok_or(TableError::UnknownEntity)
    }

    /// View all values of an attribute, in the order of [`Table::entities`]
    pub fn column<T: Pod>(&self, attribute: AttributeHandle) -> Result<&[T], TableError> {
        Ok(self.column_at(attribute)?.as_slice()?)
    }

    /// Mutably view all values of an attribute, in the order of [`Table::entities`]
    pub fn column_mut<T: Pod>(
        &mut self,
        attribute: AttributeHandle,
    ) -> Result<&mut [T], TableError> {
        let column = self
            .attributes
            .get_mut(attribute)
            .ok_or(TableError::UnknownAttribute)?;
        Ok(column.as_mut_slice()?)
    }

    /// Get an entity's value for an attribute
    pub fn get<T: Pod>(
        &self,
        attribute: AttributeHandle,
        entity: EntityHandle,
    ) -> Result<&T, TableError> {
        let column = self.column_at(attribute)?;
        let pos = self.position(entity)?;
        Ok(column.get(pos)?)
    }

    /// Get a mutable reference to an entity's value for an attribute
    pub fn get_mut<T: Pod>(
        &mut self,
        attribute: AttributeHandle,
        entity: EntityHandle,
    ) -> Result<&mut T, TableError> {
        let column = self
            .attributes
            .get_mut(attribute)
            .ok_or(TableError::UnknownAttribute)?;
        let pos = self.entities.get(entity).ok_or(TableError::UnknownEntity)?;
        Ok(column.get_mut(pos)?)
    }

    /// Set an entity's value for an attribute
    pub fn set<T: Pod>(
        &mut self,
        attribute: AttributeHandle,
        entity: EntityHandle,
        value: T,
    ) -> Result<(), TableError> {
        *self.get_mut(attribute, entity)? = value;
        Ok(())
    }

    /// Remove every entity, keeping the attributes
    ///
    /// This resets the entity allocator, see [`SparseMap::clear`]
    pub fn clear_entities(&mut self) {
        self.entities.clear();
        for column in self.attributes.values_mut() {
            column.clear();
        }
    }

    /// Remove every entity and every attribute
    ///
    /// This resets both allocators, see [`SparseMap::clear`]
    pub fn clear(&mut self) {
        log::debug!(
            "clearing table ({} entities, {} attributes)",
            self.entities.len(),
            self.attributes.len()
        );
        self.entities.clear();
        self.attributes.clear();
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct Columns<'a>(&'a SlotMap<TypeErasedVec, AttributeTag>);

        impl fmt::Debug for Columns<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_map()
                    .entries(self.0.iter().map(|(h, c)| (h, c.element_type())))
                    .finish()
            }
        }

        f.debug_struct("Table")
            .field("entities", &self.entities.len())
            .field("attributes", &Columns(&self.attributes))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use tr_arena::ArenaError;
    use tr_vec::VecError;

    #[test]
    fn attribute_created_after_entities_is_presized() {
        let mut table = Table::new();
        let e1 = table.create_entity();

        let speed = table.create_attribute::<f32>();
        assert_eq!(table.column::<f32>(speed).unwrap(), [0.0]);

        let e2 = table.create_entity();
        assert_eq!(table.column::<f32>(speed).unwrap().len(), 2);

        table.set(speed, e1, 1.5f32).unwrap();
        table.set(speed, e2, 2.5f32).unwrap();
        assert_eq!(table.get::<f32>(speed, e1), Ok(&1.5));
        assert_eq!(table.get::<f32>(speed, e2), Ok(&2.5));
    }

    #[test]
    fn remove_entity_keeps_columns_in_step() {
        let mut table = Table::new();
        let id = table.create_attribute::<u32>();
        let hp = table.create_attribute::<i16>();

        let entities: Vec<_> = (0..4u32)
            .map(|i| {
                let e = table.create_entity();
                table.set(id, e, i).unwrap();
                table.set(hp, e, -(i as i16)).unwrap();
                e
            })
            .collect();

        assert!(table.remove_entity(entities[1]));
        assert!(!table.remove_entity(entities[1]));

        // the last entity took over position 1
        assert_eq!(table.column::<u32>(id).unwrap(), [0, 3, 2]);
        assert_eq!(table.column::<i16>(hp).unwrap(), [0, -3, -2]);
        assert_eq!(
            table.entities().collect::<Vec<_>>(),
            [entities[0], entities[3], entities[2]]
        );

        for (i, &e) in entities.iter().enumerate() {
            if i == 1 {
                assert_eq!(table.get::<u32>(id, e), Err(TableError::UnknownEntity));
            } else {
                assert_eq!(table.get::<u32>(id, e), Ok(&(i as u32)));
            }
        }
    }

    #[test]
    fn access_errors() {
        let mut table = Table::new();
        let e = table.create_entity();
        let a = table.create_attribute::<u64>();

        assert!(matches!(
            table.get::<i64>(a, e),
            Err(TableError::Vec(VecError::TypeMismatch { .. }))
        ));
        assert!(matches!(
            table.set(a, e, 1u8),
            Err(TableError::Vec(VecError::TypeMismatch { .. }))
        ));
        assert!(table.column_mut::<u32>(a).is_err());

        assert!(table.remove_attribute(a));
        assert!(!table.remove_attribute(a));
        assert!(table.attribute(a).is_none());
        assert_eq!(table.get::<u64>(a, e), Err(TableError::UnknownAttribute));
        assert_eq!(table.column::<u64>(a), Err(TableError::UnknownAttribute));

        let b = table.create_attribute::<u64>();
        assert!(table.remove_entity(e));
        assert_eq!(table.get::<u64>(b, e), Err(TableError::UnknownEntity));
        assert_eq!(table.set(b, e, 1u64), Err(TableError::UnknownEntity));
    }

    #[test]
    fn removing_an_attribute_leaves_the_rest() {
        let mut table = Table::new();
        let a = table.create_attribute::<u8>();
        let b = table.create_attribute::<u16>();
        let e = table.create_entity();
        table.set(b, e, 7u16).unwrap();

        table.remove_attribute(a);
        assert_eq!(table.attribute_count(), 1);
        assert_eq!(table.entity_count(), 1);
        assert_eq!(table.get::<u16>(b, e), Ok(&7));
        assert_eq!(table.attributes().collect::<Vec<_>>(), [b]);
    }

    #[test]
    fn clear_entities_keeps_attributes() {
        let mut table = Table::new();
        let a = table.create_attribute::<u32>();
        for _ in 0..3 {
            let _ = table.create_entity();
        }

        table.clear_entities();
        assert_eq!(table.entity_count(), 0);
        assert!(table.contains_attribute(a));
        assert!(table.column::<u32>(a).unwrap().is_empty());

        let e = table.create_entity();
        assert_eq!(table.column::<u32>(a).unwrap(), [0]);
        assert!(table.contains_entity(e));

        table.clear();
        assert_eq!(table.attribute_count(), 0);
        assert_eq!(table.entity_count(), 0);
    }

    #[test]
    fn with_capacity_presizes_new_columns() {
        let mut table = Table::with_capacity(16);
        let a = table.create_attribute::<u32>();
        assert_eq!(table.attribute(a).unwrap().capacity(), 16);

        for _ in 0..16 {
            let _ = table.create_entity();
        }
        assert_eq!(table.attribute(a).unwrap().len(), 16);
        assert_eq!(table.attribute(a).unwrap().capacity(), 16);
    }

    #[test]
    fn failed_creation_leaves_the_table_unchanged() {
        let mut table = Table::with_limits(2, 1);
        let a = table.create_attribute::<u8>();
        assert_eq!(
            table.try_create_attribute::<u16>(),
            Err(TableError::Arena(ArenaError::CapacityExhausted { limit: 1 }))
        );
        assert_eq!(table.attribute_count(), 1);

        let e1 = table.create_entity();
        let e2 = table.create_entity();
        table.set(a, e2, 9u8).unwrap();
        assert_eq!(
            table.try_create_entity(),
            Err(TableError::Arena(ArenaError::CapacityExhausted { limit: 2 }))
        );
        assert_eq!(table.entity_count(), 2);
        assert_eq!(table.column::<u8>(a).unwrap(), [0, 9]);

        assert!(table.remove_entity(e1));
        let e3 = table.try_create_entity().unwrap();
        assert_eq!(table.column::<u8>(a).unwrap(), [9, 0]);
        assert!(table.contains_entity(e3));
    }

    #[test]
    fn arena_errors_keep_their_message() {
        let err = TableError::from(ArenaError::CapacityExhausted { limit: 2 });
        assert_eq!(
            alloc::format!("{err}"),
            "sparse slot capacity exhausted: cannot allocate more than 2 slots"
        );
    }

    #[test]
    #[should_panic = "sparse slot capacity exhausted"]
    fn create_entity_past_the_limit_panics() {
        let mut table = Table::with_limits(0, 0);
        let _ = table.create_entity();
    }

    #[test]
    fn raw_column_access() {
        let mut table = Table::new();
        let a = table.create_attribute::<[u8; 3]>();
        let _ = table.create_entity();

        let column = table.attribute(a).unwrap();
        assert!(column.is::<[u8; 3]>());
        assert_eq!(column.len(), 1);
    }
}
