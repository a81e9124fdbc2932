//! Typed operations behind the erased manager function pointers.
//!
//! Inline thunks treat the slot as the value itself. Boxed thunks treat the
//! slot as holding a `NonNull<T>` obtained from an [`Allocator`].

use core::ptr::NonNull;

use crate::{allocator::Allocator, util::Erased};

/// Operation selector for the combined (single function) encoding.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(super) enum Op {
    /// Drop the value in `src`; `dst` is ignored.
    Destroy,
    /// Move the value from `src` into `dst`.
    Relocate,
    /// Clone the value in `src` into `dst`.
    Duplicate,
}

/// Drops the `T` stored inline in `slot`.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `slot` holds an initialized `T` that is not used afterwards.
pub(super) unsafe fn destroy_inline<T>(slot: NonNull<Erased>) {
    // SAFETY: `slot` holds a live `T` we are allowed to drop (guaranteed by the
    // caller).
    unsafe { slot.cast::<T>().drop_in_place() }
}

/// Moves the `T` stored inline in `src` into `dst`.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `src` holds an initialized `T` that is treated as uninitialized
///    afterwards.
/// 2. `dst` is valid for writes of a `T` and does not overlap `src`.
pub(super) unsafe fn relocate_inline<T>(src: NonNull<Erased>, dst: NonNull<Erased>) {
    // SAFETY: 1. Guaranteed by the caller
    let value = unsafe { src.cast::<T>().read() };
    // SAFETY: 2. Guaranteed by the caller
    unsafe { dst.cast::<T>().write(value) }
}

/// Clones the `T` stored inline in `src` into `dst`.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `src` holds an initialized `T`.
/// 2. `dst` is valid for writes of a `T` and does not overlap `src`.
pub(super) unsafe fn duplicate_inline<T: Clone>(src: NonNull<Erased>, dst: NonNull<Erased>) {
    // SAFETY: 1. Guaranteed by the caller
    let source: &T = unsafe { src.cast::<T>().as_ref() };
    let copy = source.clone();
    // SAFETY: 2. Guaranteed by the caller
    unsafe { dst.cast::<T>().write(copy) }
}

/// Releases the `T` that `slot` points to.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `slot` holds a `NonNull<T>` returned by `A::allocate`.
/// 2. That pointer is not used afterwards.
pub(super) unsafe fn destroy_boxed<T, A: Allocator>(slot: NonNull<Erased>) {
    // SAFETY: 1. Guaranteed by the caller
    let ptr = unsafe { slot.cast::<NonNull<T>>().read() };
    // SAFETY: 1. and 2. Guaranteed by the caller
    unsafe { A::release(ptr) }
}

/// Moves the heap pointer stored in `src` into `dst`.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `src` holds a heap pointer that is treated as moved-out afterwards.
/// 2. `dst` is valid for writes of a pointer.
pub(super) unsafe fn relocate_boxed(src: NonNull<Erased>, dst: NonNull<Erased>) {
    // SAFETY: 1. Guaranteed by the caller
    let ptr = unsafe { src.cast::<NonNull<Erased>>().read() };
    // SAFETY: 2. Guaranteed by the caller
    unsafe { dst.cast::<NonNull<Erased>>().write(ptr) }
}

/// Allocates a clone of the `T` that `src` points to and stores the new
/// pointer in `dst`.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `src` holds a live `NonNull<T>` returned by `A::allocate`.
/// 2. `dst` is valid for writes of a pointer.
pub(super) unsafe fn duplicate_boxed<T: Clone, A: Allocator>(
    src: NonNull<Erased>,
    dst: NonNull<Erased>,
) {
    // SAFETY: 1. Guaranteed by the caller
    let ptr = unsafe { src.cast::<NonNull<T>>().read() };
    // SAFETY: The pointee is live (1. guaranteed by the caller).
    let source: &T = unsafe { ptr.as_ref() };
    let copy = A::allocate(source.clone());
    // SAFETY: 2. Guaranteed by the caller
    unsafe { dst.cast::<NonNull<T>>().write(copy) }
}

/// Combined entry point for a move-only inline `T`.
///
/// # Safety
///
/// The caller must uphold the requirements of the thunk selected by `op`.
/// `op` must not be [`Op::Duplicate`].
pub(super) unsafe fn run_inline<T>(op: Op, src: NonNull<Erased>, dst: NonNull<Erased>) {
    match op {
        // SAFETY: Guaranteed by the caller
        Op::Destroy => unsafe { destroy_inline::<T>(src) },
        // SAFETY: Guaranteed by the caller
        Op::Relocate => unsafe { relocate_inline::<T>(src, dst) },
        Op::Duplicate => unreachable!("move-only manager asked to duplicate"),
    }
}

/// Combined entry point for a move-only boxed `T`.
///
/// # Safety
///
/// The caller must uphold the requirements of the thunk selected by `op`.
/// `op` must not be [`Op::Duplicate`].
pub(super) unsafe fn run_boxed<T, A: Allocator>(
    op: Op,
    src: NonNull<Erased>,
    dst: NonNull<Erased>,
) {
    match op {
        // SAFETY: Guaranteed by the caller
        Op::Destroy => unsafe { destroy_boxed::<T, A>(src) },
        // SAFETY: Guaranteed by the caller
        Op::Relocate => unsafe { relocate_boxed(src, dst) },
        Op::Duplicate => unreachable!("move-only manager asked to duplicate"),
    }
}

/// Combined entry point for a copyable inline `T`.
///
/// # Safety
///
/// The caller must uphold the requirements of the thunk selected by `op`.
pub(super) unsafe fn run_inline_cloneable<T: Clone>(
    op: Op,
    src: NonNull<Erased>,
    dst: NonNull<Erased>,
) {
    match op {
        // SAFETY: Guaranteed by the caller
        Op::Destroy => unsafe { destroy_inline::<T>(src) },
        // SAFETY: Guaranteed by the caller
        Op::Relocate => unsafe { relocate_inline::<T>(src, dst) },
        // SAFETY: Guaranteed by the caller
        Op::Duplicate => unsafe { duplicate_inline::<T>(src, dst) },
    }
}

/// Combined entry point for a copyable boxed `T`.
///
/// # Safety
///
/// The caller must uphold the requirements of the thunk selected by `op`.
pub(super) unsafe fn run_boxed_cloneable<T: Clone, A: Allocator>(
    op: Op,
    src: NonNull<Erased>,
    dst: NonNull<Erased>,
) {
    match op {
        // SAFETY: Guaranteed by the caller
        Op::Destroy => unsafe { destroy_boxed::<T, A>(src) },
        // SAFETY: Guaranteed by the caller
        Op::Relocate => unsafe { relocate_boxed(src, dst) },
        // SAFETY: Guaranteed by the caller
        Op::Duplicate => unsafe { duplicate_boxed::<T, A>(src, dst) },
    }
}
