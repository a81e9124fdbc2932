//! Managers that keep one function pointer per operation.
//!
//! The fields of [`SplitManager`] and [`SplitCopyManager`] are private to this
//! module, and the only way to obtain one is through the constructors below,
//! which pair the function pointers with the type `T` (and allocator `A`) at
//! compile time.
//!
//! # Safety Invariant
//!
//! `bound`, `destroy`, `relocate` and `duplicate` always describe the same
//! `T` at the same placement.

use core::ptr::NonNull;

use crate::{
    allocator::Allocator,
    manager::{BoundType, CopyManager, Manager, MoveManager, thunks},
    util::Erased,
};

/// Move-only manager made of two independent function pointers.
#[derive(Copy, Clone)]
pub struct SplitManager {
    /// Description of the managed type.
    bound: &'static BoundType,
    /// Drops the managed value in place.
    destroy: unsafe fn(NonNull<Erased>),
    /// Moves the managed value between slots.
    relocate: unsafe fn(NonNull<Erased>, NonNull<Erased>),
}

/// Copy-enabled manager made of three independent function pointers.
#[derive(Copy, Clone)]
pub struct SplitCopyManager {
    /// Description of the managed type.
    bound: &'static BoundType,
    /// Drops the managed value in place.
    destroy: unsafe fn(NonNull<Erased>),
    /// Moves the managed value between slots.
    relocate: unsafe fn(NonNull<Erased>, NonNull<Erased>),
    /// Clones the managed value into another slot.
    duplicate: unsafe fn(NonNull<Erased>, NonNull<Erased>),
}

impl Manager for SplitManager {
    #[inline]
    fn bound(&self) -> &'static BoundType {
        self.bound
    }

    #[inline]
    unsafe fn destroy(&self, slot: NonNull<Erased>) {
        // SAFETY: `self.destroy` matches `self.bound` (module invariant), and the
        // slot holds a live value of that type (guaranteed by the caller).
        unsafe { (self.destroy)(slot) }
    }

    #[inline]
    unsafe fn relocate(&self, src: NonNull<Erased>, dst: NonNull<Erased>) {
        // SAFETY: `self.relocate` matches `self.bound` (module invariant); the slot
        // requirements are guaranteed by the caller.
        unsafe { (self.relocate)(src, dst) }
    }
}

impl MoveManager for SplitManager {
    fn inline<T: 'static>() -> &'static Self {
        const {
            &Self {
                bound: BoundType::inline::<T>(),
                destroy: thunks::destroy_inline::<T>,
                relocate: thunks::relocate_inline::<T>,
            }
        }
    }

    fn boxed<T: 'static, A: Allocator>() -> &'static Self {
        const {
            &Self {
                bound: BoundType::heap::<T>(),
                destroy: thunks::destroy_boxed::<T, A>,
                relocate: thunks::relocate_boxed,
            }
        }
    }
}

impl Manager for SplitCopyManager {
    #[inline]
    fn bound(&self) -> &'static BoundType {
        self.bound
    }

    #[inline]
    unsafe fn destroy(&self, slot: NonNull<Erased>) {
        // SAFETY: `self.destroy` matches `self.bound` (module invariant), and the
        // slot holds a live value of that type (guaranteed by the caller).
        unsafe { (self.destroy)(slot) }
    }

    #[inline]
    unsafe fn relocate(&self, src: NonNull<Erased>, dst: NonNull<Erased>) {
        // SAFETY: `self.relocate` matches `self.bound` (module invariant); the slot
        // requirements are guaranteed by the caller.
        unsafe { (self.relocate)(src, dst) }
    }
}

impl CopyManager for SplitCopyManager {
    fn inline<T: Clone + 'static>() -> &'static Self {
        const {
            &Self {
                bound: BoundType::inline::<T>(),
                destroy: thunks::destroy_inline::<T>,
                relocate: thunks::relocate_inline::<T>,
                duplicate: thunks::duplicate_inline::<T>,
            }
        }
    }

    fn boxed<T: Clone + 'static, A: Allocator>() -> &'static Self {
        const {
            &Self {
                bound: BoundType::heap::<T>(),
                destroy: thunks::destroy_boxed::<T, A>,
                relocate: thunks::relocate_boxed,
                duplicate: thunks::duplicate_boxed::<T, A>,
            }
        }
    }

    #[inline]
    unsafe fn duplicate(&self, src: NonNull<Erased>, dst: NonNull<Erased>) {
        // SAFETY: `self.duplicate` matches `self.bound` (module invariant); the
        // slot requirements are guaranteed by the caller.
        unsafe { (self.duplicate)(src, dst) }
    }
}
