//! Managers that multiplex every operation through one function pointer.
//!
//! Same invariant as the split encoding: the fields are private to this module
//! and `run` always matches `bound`.

use core::ptr::NonNull;

use crate::{
    allocator::Allocator,
    manager::{
        BoundType, CopyManager, Manager, MoveManager,
        thunks::{self, Op},
    },
    util::Erased,
};

/// Move-only manager with a single entry point.
#[derive(Copy, Clone)]
pub struct CombinedManager {
    /// Description of the managed type.
    bound: &'static BoundType,
    /// Entry point selecting the operation through [`Op`]. Never called with
    /// [`Op::Duplicate`].
    run: unsafe fn(Op, NonNull<Erased>, NonNull<Erased>),
}

/// Copy-enabled manager with a single entry point.
#[derive(Copy, Clone)]
pub struct CombinedCopyManager {
    /// Description of the managed type.
    bound: &'static BoundType,
    /// Entry point selecting the operation through [`Op`].
    run: unsafe fn(Op, NonNull<Erased>, NonNull<Erased>),
}

impl Manager for CombinedManager {
    #[inline]
    fn bound(&self) -> &'static BoundType {
        self.bound
    }

    #[inline]
    unsafe fn destroy(&self, slot: NonNull<Erased>) {
        // SAFETY: `self.run` matches `self.bound`; the destination is ignored by
        // `Op::Destroy` and the slot is live (guaranteed by the caller).
        unsafe { (self.run)(Op::Destroy, slot, slot) }
    }

    #[inline]
    unsafe fn relocate(&self, src: NonNull<Erased>, dst: NonNull<Erased>) {
        // SAFETY: `self.run` matches `self.bound`; the slot requirements are
        // guaranteed by the caller.
        unsafe { (self.run)(Op::Relocate, src, dst) }
    }
}

impl MoveManager for CombinedManager {
    fn inline<T: 'static>() -> &'static Self {
        const {
            &Self {
                bound: BoundType::inline::<T>(),
                run: thunks::run_inline::<T>,
            }
        }
    }

    fn boxed<T: 'static, A: Allocator>() -> &'static Self {
        const {
            &Self {
                bound: BoundType::heap::<T>(),
                run: thunks::run_boxed::<T, A>,
            }
        }
    }
}

impl Manager for CombinedCopyManager {
    #[inline]
    fn bound(&self) -> &'static BoundType {
        self.bound
    }

    #[inline]
    unsafe fn destroy(&self, slot: NonNull<Erased>) {
        // SAFETY: `self.run` matches `self.bound`; the destination is ignored by
        // `Op::Destroy` and the slot is live (guaranteed by the caller).
        unsafe { (self.run)(Op::Destroy, slot, slot) }
    }

    #[inline]
    unsafe fn relocate(&self, src: NonNull<Erased>, dst: NonNull<Erased>) {
        // SAFETY: `self.run` matches `self.bound`; the slot requirements are
        // guaranteed by the caller.
        unsafe { (self.run)(Op::Relocate, src, dst) }
    }
}

impl CopyManager for CombinedCopyManager {
    fn inline<T: Clone + 'static>() -> &'static Self {
        const {
            &Self {
                bound: BoundType::inline::<T>(),
                run: thunks::run_inline_cloneable::<T>,
            }
        }
    }

    fn boxed<T: Clone + 'static, A: Allocator>() -> &'static Self {
        const {
            &Self {
                bound: BoundType::heap::<T>(),
                run: thunks::run_boxed_cloneable::<T, A>,
            }
        }
    }

    #[inline]
    unsafe fn duplicate(&self, src: NonNull<Erased>, dst: NonNull<Erased>) {
        // SAFETY: `self.run` matches `self.bound`; the slot requirements are
        // guaranteed by the caller.
        unsafe { (self.run)(Op::Duplicate, src, dst) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_is_smaller_than_split() {
        use crate::manager::{SplitCopyManager, SplitManager};

        assert!(size_of::<CombinedManager>() < size_of::<SplitManager>());
        assert!(size_of::<CombinedCopyManager>() < size_of::<SplitCopyManager>());
        assert_eq!(size_of::<CombinedManager>(), size_of::<CombinedCopyManager>());
    }
}
