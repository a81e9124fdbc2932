//! Owning pointer to a type-erased heap block.
//!
//! This module encapsulates the `ptr` field of [`RawHeap`], ensuring it is
//! only visible here. This guarantees the safety invariant: **the pointer
//! always refers to a live `HeapBlock<T>` allocated by the allocator the
//! block's vtable was built with**.
//!
//! # Safety Invariant
//!
//! The `ptr` field is only set by [`RawHeap::new`], [`RawHeap::new_cloneable`]
//! and [`RawHeap::try_duplicate`], each of which allocates the block through
//! the same allocator its vtable releases to. It is never modified afterwards.

use core::{any::TypeId, mem::ManuallyDrop, ptr::NonNull};

use crate::{
    allocator::Allocator,
    heap::{
        data::{self, HeapBlock},
        vtable::HeapVtable,
    },
    util::Erased,
};

/// Owning pointer to a heap block holding a value of some erased type,
/// together with the vtable describing it.
///
/// A `RawHeap` is a single pointer wide, and so is `Option<RawHeap>`. It is
/// neither `Send` nor `Sync`.
#[repr(transparent)]
pub struct RawHeap {
    /// Pointer to the block.
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. The pointer was returned by `A::allocate` for a `HeapBlock<T>`,
    ///    where `T` and `A` are the types the block's vtable was built with.
    /// 2. The block is live for the entire lifetime of this object, except
    ///    during the execution of the `Drop` implementation.
    ptr: NonNull<HeapBlock<Erased>>,
}

impl RawHeap {
    /// Moves `value` into a new block allocated from `A`.
    ///
    /// The block cannot be duplicated.
    #[inline]
    pub fn new<T: 'static, A: Allocator>(value: T) -> Self {
        Self::allocate::<T, A>(HeapBlock::new(HeapVtable::new::<T, A>(), value))
    }

    /// Moves `value` into a new block allocated from `A` that supports
    /// [`RawHeap::try_duplicate`].
    #[inline]
    pub fn new_cloneable<T: Clone + 'static, A: Allocator>(value: T) -> Self {
        Self::allocate::<T, A>(HeapBlock::new(
            HeapVtable::new_cloneable::<T, A>(),
            value,
        ))
    }

    /// Allocates `block` from `A`.
    ///
    /// The vtable of the block must have been built for `T` and `A`, which both
    /// callers guarantee.
    #[inline]
    fn allocate<T: 'static, A: Allocator>(block: HeapBlock<T>) -> Self {
        let ptr = A::allocate(block).cast::<HeapBlock<Erased>>();
        Self { ptr }
    }

    /// Returns the vtable of the block.
    #[inline]
    fn vtable(&self) -> &'static HeapVtable {
        // SAFETY: The block is live (type invariant).
        unsafe { data::vtable_of(self.ptr) }
    }

    /// Returns the [`TypeId`] of the stored value.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.vtable().type_id()
    }

    /// Returns the name of the stored value's type.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.vtable().type_name()
    }

    /// Returns `true` if the stored value is a `T`.
    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.vtable().is::<T>()
    }

    /// Returns `true` if the block was created with
    /// [`RawHeap::new_cloneable`].
    #[inline]
    pub fn is_cloneable(&self) -> bool {
        self.vtable().is_cloneable()
    }

    /// Allocates a clone of the block.
    ///
    /// Returns `None` for blocks created with [`RawHeap::new`].
    #[inline]
    pub fn try_duplicate(&self) -> Option<Self> {
        // SAFETY: The block is live and refers to its own vtable (type invariant).
        let ptr = unsafe { self.vtable().duplicate(self.ptr) }?;
        Some(Self { ptr })
    }

    /// Accesses the stored value as a `T`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The stored value is a `T`.
    #[inline]
    pub unsafe fn downcast_unchecked<T: 'static>(&self) -> &T {
        // SAFETY: The block is live and holds a `T` (type invariant and 1.
        // guaranteed by the caller).
        let ptr = unsafe { data::value_of::<T>(self.ptr) };
        // SAFETY: The value is live for as long as `self` is borrowed.
        unsafe { ptr.as_ref() }
    }

    /// Mutably accesses the stored value as a `T`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The stored value is a `T`.
    #[inline]
    pub unsafe fn downcast_unchecked_mut<T: 'static>(&mut self) -> &mut T {
        // SAFETY: The block is live and holds a `T` (type invariant and 1.
        // guaranteed by the caller).
        let mut ptr = unsafe { data::value_of::<T>(self.ptr) };
        // SAFETY: The value is live and uniquely owned for as long as `self` is
        // mutably borrowed.
        unsafe { ptr.as_mut() }
    }

    /// Moves the stored value out and releases the block.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The stored value is a `T`.
    /// 2. `A` is the allocator the block was created with.
    #[inline]
    pub unsafe fn into_inner_unchecked<T: 'static, A: Allocator>(self) -> T {
        let this = ManuallyDrop::new(self);
        // SAFETY: 1. Guaranteed by the caller
        let value_ptr = unsafe { data::value_of::<T>(this.ptr) };
        // SAFETY: The value is live and read exactly once; the block is released
        // below without dropping it.
        let value = unsafe { value_ptr.read() };
        // SAFETY: The block was allocated by `A` as a `HeapBlock<T>` (2. guaranteed
        // by the caller); `HeapBlock<ManuallyDrop<T>>` has the same layout and
        // drops nothing, and `this` is never dropped.
        unsafe { A::release(this.ptr.cast::<HeapBlock<ManuallyDrop<T>>>()) };
        value
    }
}

impl Drop for RawHeap {
    #[inline]
    fn drop(&mut self) {
        let vtable = self.vtable();
        // SAFETY:
        // 1. The block is live and refers to `vtable` (type invariant).
        // 2. We are in the drop function; the pointer is not used afterwards.
        unsafe { vtable.release(self.ptr) }
    }
}
