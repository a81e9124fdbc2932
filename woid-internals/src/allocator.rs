//! Allocator plug-in point for values placed on the heap.
//!
//! Storage types never talk to the global allocator directly. Every heap
//! placement goes through an [`Allocator`] chosen as a type parameter, so the
//! same container can be backed by the process heap ([`Global`]) or by a
//! bump arena without any runtime state in the container itself.

use alloc::boxed::Box;
use core::ptr::NonNull;

/// Allocator used for values that are too big for inline storage.
///
/// Allocators are stateless: both operations are associated functions, so a
/// container only carries its allocator as a type parameter.
///
/// # Safety
///
/// Implementors must guarantee:
///
/// 1. [`Allocator::allocate`] returns a pointer that is non-null, properly
///    aligned for `T`, and points to an initialized `T` (the value that was
///    passed in).
/// 2. That pointer stays valid, and the pointee is not touched by the
///    allocator, until it is passed to [`Allocator::release`].
pub unsafe trait Allocator: 'static {
    /// Moves `value` into a fresh allocation and returns a pointer to it.
    fn allocate<T>(value: T) -> NonNull<T>;

    /// Drops the value behind `ptr` and gives its memory back.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` was returned by [`Allocator::allocate`] of this allocator,
    ///    instantiated with the same `T` or with a type of identical layout
    ///    (such as [`ManuallyDrop<T>`](core::mem::ManuallyDrop)).
    /// 2. `ptr` has not been released already and is not used afterwards.
    unsafe fn release<T>(ptr: NonNull<T>);
}

/// The process heap, reached through [`Box`].
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct Global;

// SAFETY:
// 1. `Box::leak` yields a valid, aligned, initialized reference.
// 2. The box is only reconstructed in `release`.
unsafe impl Allocator for Global {
    #[inline]
    fn allocate<T>(value: T) -> NonNull<T> {
        NonNull::from(Box::leak(Box::new(value)))
    }

    #[inline]
    unsafe fn release<T>(ptr: NonNull<T>) {
        // SAFETY: The pointer came from `Box::leak` in `allocate` with the same
        // layout and has not been released before (guaranteed by the caller).
        let boxed = unsafe { Box::from_raw(ptr.as_ptr()) };
        core::mem::drop(boxed);
    }
}
