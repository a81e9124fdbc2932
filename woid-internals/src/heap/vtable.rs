//! Vtable for type-erased heap blocks.
//!
//! The fields of [`HeapVtable`] are private to this module, and vtables are
//! only created as `&'static` constants through [`HeapVtable::new`] and
//! [`HeapVtable::new_cloneable`], which pair the function pointers with a
//! concrete value type `T` and allocator `A` at compile time.
//!
//! # Safety Invariant
//!
//! Every function pointer of a vtable was instantiated with the `T` and `A`
//! used to build it, and `T` is the type stored in every block that refers to
//! the vtable.

use core::{any::TypeId, ptr::NonNull};

use crate::{allocator::Allocator, heap::data::HeapBlock, util::Erased};

/// Erased clone of a whole block.
type DuplicateBlock = unsafe fn(NonNull<HeapBlock<Erased>>) -> NonNull<HeapBlock<Erased>>;

/// Function pointers for a heap block whose value type has been erased.
pub(crate) struct HeapVtable {
    /// Gets the [`TypeId`] of the stored value.
    type_id: fn() -> TypeId,
    /// Gets the [`core::any::type_name`] of the stored value.
    type_name: fn() -> &'static str,
    /// Drops the value and gives the block back to its allocator.
    release: unsafe fn(NonNull<HeapBlock<Erased>>),
    /// Allocates a clone of the block; absent for move-only blocks.
    duplicate: Option<DuplicateBlock>,
}

impl HeapVtable {
    /// Creates the vtable for a move-only `T` allocated from `A`.
    pub(super) const fn new<T: 'static, A: Allocator>() -> &'static Self {
        const {
            &Self {
                type_id: TypeId::of::<T>,
                type_name: core::any::type_name::<T>,
                release: release::<T, A>,
                duplicate: None,
            }
        }
    }

    /// Creates the vtable for a cloneable `T` allocated from `A`.
    pub(super) const fn new_cloneable<T: Clone + 'static, A: Allocator>() -> &'static Self {
        const {
            &Self {
                type_id: TypeId::of::<T>,
                type_name: core::any::type_name::<T>,
                release: release::<T, A>,
                duplicate: Some(duplicate::<T, A> as DuplicateBlock),
            }
        }
    }

    /// Gets the [`TypeId`] of the stored value.
    #[inline]
    pub(super) fn type_id(&self) -> TypeId {
        (self.type_id)()
    }

    /// Gets the name of the stored value's type.
    #[inline]
    pub(super) fn type_name(&self) -> &'static str {
        (self.type_name)()
    }

    /// Returns `true` if the stored value is a `T`.
    #[inline]
    pub(super) fn is<T: 'static>(&self) -> bool {
        self.type_id() == TypeId::of::<T>()
    }

    /// Returns `true` if blocks of this vtable can be duplicated.
    #[inline]
    pub(super) fn is_cloneable(&self) -> bool {
        self.duplicate.is_some()
    }

    /// Drops the value in the block and releases the block.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` points to a live block that refers to this vtable.
    /// 2. Ownership of the block is transferred here; the pointer is not used
    ///    afterwards.
    #[inline]
    pub(super) unsafe fn release(&self, ptr: NonNull<HeapBlock<Erased>>) {
        // SAFETY: `self.release` is `release::<T, A>` for the `T` stored in the
        // block (module invariant). 1. and 2. Guaranteed by the caller
        unsafe { (self.release)(ptr) }
    }

    /// Allocates a clone of the block, if this vtable supports it.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` points to a live block that refers to this vtable.
    #[inline]
    pub(super) unsafe fn duplicate(
        &self,
        ptr: NonNull<HeapBlock<Erased>>,
    ) -> Option<NonNull<HeapBlock<Erased>>> {
        let duplicate = self.duplicate?;
        // SAFETY: `duplicate` is `duplicate::<T, A>` for the `T` stored in the
        // block (module invariant). 1. Guaranteed by the caller
        Some(unsafe { duplicate(ptr) })
    }
}

/// Drops a `HeapBlock<T>` allocated from `A`.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `ptr` was allocated by `A` as a `HeapBlock<T>`.
/// 2. The block is not used afterwards.
unsafe fn release<T: 'static, A: Allocator>(ptr: NonNull<HeapBlock<Erased>>) {
    // SAFETY: 1. and 2. Guaranteed by the caller
    unsafe { A::release(ptr.cast::<HeapBlock<T>>()) }
}

/// Allocates a clone of a `HeapBlock<T>` from `A`.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `ptr` points to a live `HeapBlock<T>`.
unsafe fn duplicate<T: Clone + 'static, A: Allocator>(
    ptr: NonNull<HeapBlock<Erased>>,
) -> NonNull<HeapBlock<Erased>> {
    // SAFETY: 1. Guaranteed by the caller
    let block: &HeapBlock<T> = unsafe { ptr.cast::<HeapBlock<T>>().as_ref() };
    let copy = HeapBlock::new(block.vtable(), block.value().clone());
    A::allocate(copy).cast::<HeapBlock<Erased>>()
}
