//! Static description of a type bound into an erased container.

use core::any::TypeId;

/// Where a bound value lives relative to its container.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Placement {
    /// The value is stored inside the container's own buffer.
    Inline,
    /// The buffer holds a pointer to an allocation owning the value.
    Heap,
}

/// Static record describing a concrete type as it was placed into a
/// container.
///
/// One record exists per (type, placement) pair. Records are compile-time
/// constants promoted to `&'static`, so they are never created at runtime and
/// never destroyed.
///
/// Identity checks go through [`TypeId`] and never through the address of the
/// record: the compiler is free to duplicate or merge constants across
/// codegen units.
#[derive(Copy, Clone)]
pub struct BoundType {
    /// Gets the [`TypeId`] of the bound type.
    type_id: fn() -> TypeId,
    /// Gets the [`core::any::type_name`] of the bound type.
    type_name: fn() -> &'static str,
    /// `size_of` of the bound type.
    size: usize,
    /// `align_of` of the bound type.
    align: usize,
    /// Placement chosen for the bound type.
    placement: Placement,
    /// Whether the type has no drop glue.
    trivial: bool,
}

impl BoundType {
    /// Returns the record for `T` stored inline.
    pub const fn inline<T: 'static>() -> &'static Self {
        const { &Self::describe::<T>(Placement::Inline) }
    }

    /// Returns the record for `T` stored behind a heap pointer.
    pub const fn heap<T: 'static>() -> &'static Self {
        const { &Self::describe::<T>(Placement::Heap) }
    }

    /// Builds the record for `T` at the given placement.
    const fn describe<T: 'static>(placement: Placement) -> Self {
        Self {
            type_id: TypeId::of::<T>,
            type_name: core::any::type_name::<T>,
            size: size_of::<T>(),
            align: align_of::<T>(),
            placement,
            trivial: !core::mem::needs_drop::<T>(),
        }
    }

    /// Returns the [`TypeId`] of the bound type.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        (self.type_id)()
    }

    /// Returns the name of the bound type.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        (self.type_name)()
    }

    /// Returns `true` if the bound type is `T`.
    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id() == TypeId::of::<T>()
    }

    /// Size of the bound type in bytes.
    #[inline]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Alignment of the bound type in bytes.
    #[inline]
    pub const fn align(&self) -> usize {
        self.align
    }

    /// Where values of the bound type are placed.
    #[inline]
    pub const fn placement(&self) -> Placement {
        self.placement
    }

    /// Returns `true` if destroying the bound type is a no-op, which makes it
    /// relocatable and destructible as raw bytes.
    #[inline]
    pub const fn is_trivial(&self) -> bool {
        self.trivial
    }
}

impl core::fmt::Debug for BoundType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BoundType")
            .field("type_name", &self.type_name())
            .field("size", &self.size)
            .field("align", &self.align)
            .field("placement", &self.placement)
            .field("trivial", &self.trivial)
            .finish()
    }
}
