//! see [`Handle`]

use core::{
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
};

use derive_where::derive_where;

/// The default tag for a [`Handle`], used when the caller doesn't provide one
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DefaultTag {}

/// An opaque, copyable reference to a slot in a [`SparseMap`](crate::sparse_map::SparseMap)
/// or a [`SlotMap`](crate::slot_map::SlotMap)
///
/// A handle is a slot id paired with the generation that slot had when the
/// handle was issued. Once the slot is freed its generation moves on, so the
/// handle stops resolving, even if the same id is handed out again later.
///
/// The `Tag` parameter separates handle families at compile time, so that
/// `Handle<Foo>` can't be passed where a `Handle<Bar>` is expected. It is
/// never instantiated.
///
/// Handles don't know which structure issued them. Using a handle from one
/// structure on another is a logic error that can't be detected.
#[derive_where(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[must_use]
pub struct Handle<Tag: ?Sized = DefaultTag> {
    id: u32,
    version: u32,
    _tag: PhantomData<fn() -> Tag>,
}

impl<Tag: ?Sized> Handle<Tag> {
    /// Marks the absence of a slot
    pub const INVALID_IDX: u32 = u32::MAX;
    /// Terminates the free list threaded through the sparse slots
    pub const FREELIST_END_IDX: u32 = u32::MAX - 1;
    /// The sparse slot count is never allowed to reach this
    pub const SPARSE_MAX_IDX: u32 = Self::FREELIST_END_IDX - 1;
    /// Once a slot's version reaches this value, the slot is retired for good
    pub const DISABLED_VERSION: u32 = u32::MAX;

    /// The null handle, which never resolves to anything
    pub const INVALID: Self = Self {
        id: Self::INVALID_IDX,
        version: 0,
        _tag: PhantomData,
    };

    pub(crate) const fn new(id: u32, version: u32) -> Self {
        Self {
            id,
            version,
            _tag: PhantomData,
        }
    }

    /// The sparse slot this handle refers to
    #[inline]
    pub const fn id(self) -> u32 {
        self.id
    }

    /// The generation of the slot when this handle was issued
    #[inline]
    pub const fn version(self) -> u32 {
        self.version
    }

    /// Returns true for [`Handle::INVALID`]
    ///
    /// NOTE: a handle that isn't invalid may still be stale, use `contains`
    /// on the issuing structure to check that
    #[inline]
    pub const fn is_invalid(self) -> bool {
        self.id == Self::INVALID_IDX
    }
}

impl<Tag: ?Sized> Default for Handle<Tag> {
    fn default() -> Self {
        Self::INVALID
    }
}

impl<Tag: ?Sized> Hash for Handle<Tag> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64((u64::from(self.version) << 32) | u64::from(self.id))
    }
}

impl<Tag: ?Sized> fmt::Debug for Handle<Tag> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_invalid() {
            f.write_str("Handle(invalid)")
        } else {
            write!(f, "Handle({}v{})", self.id, self.version)
        }
    }
}

#[cold]
#[inline(never)]
pub(crate) fn stale_handle<Tag: ?Sized>(handle: Handle<Tag>) -> ! {
    panic!("tried to access a stale or unknown handle: {handle:?}")
}
