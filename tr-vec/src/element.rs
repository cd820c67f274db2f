//! see [`ElementType`]

use core::{
    alloc::Layout,
    any::{type_name, TypeId},
    fmt,
    hash::{Hash, Hasher},
};

use bytemuck::Pod;

/// The runtime identity of the element type of a [`TypeErasedVec`](crate::TypeErasedVec)
///
/// This is everything the vector needs to know about its element type: how
/// large it is, how it must be aligned, and which type it is. The name is
/// only kept for error messages.
///
/// Two [`ElementType`]s are equal exactly when they describe the same type.
#[derive(Clone, Copy)]
pub struct ElementType {
    id: TypeId,
    name: &'static str,
    layout: Layout,
}

impl ElementType {
    /// The [`ElementType`] of `T`
    #[inline]
    pub fn of<T: Pod>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            layout: Layout::new::<T>(),
        }
    }

    /// Returns true if this describes `T`
    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// The [`TypeId`] of the element type
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The name of the element type, see [`core::any::type_name`]
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The layout of a single element
    #[inline]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// The size of a single element, in bytes
    #[inline]
    pub fn size(&self) -> usize {
        self.layout.size()
    }

    /// The alignment of a single element, in bytes
    #[inline]
    pub fn align(&self) -> usize {
        self.layout.align()
    }
}

impl PartialEq for ElementType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ElementType {}

impl Hash for ElementType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl fmt::Debug for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
