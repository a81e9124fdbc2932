//! Inline byte buffer.

use core::{mem::MaybeUninit, ptr::NonNull};

use crate::util::Erased;

/// Uninitialized storage with the size and alignment of `S`.
///
/// `S` is a "space" type that is never instantiated; only its layout matters.
/// Writes must go through [`Buffer::slot_mut`] so the resulting pointer
/// carries write permission.
#[repr(transparent)]
pub struct Buffer<S> {
    /// The raw bytes.
    bytes: MaybeUninit<S>,
}

impl<S> Buffer<S> {
    /// Number of bytes available inline.
    pub const CAPACITY: usize = size_of::<S>();

    /// Alignment of the inline bytes.
    pub const ALIGN: usize = align_of::<S>();

    /// Creates an uninitialized buffer.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bytes: MaybeUninit::uninit(),
        }
    }

    /// Returns `true` if a `T` can be stored in the buffer: it is no larger
    /// than the capacity and needs no stricter alignment.
    #[inline]
    pub const fn fits<T>() -> bool {
        size_of::<T>() <= Self::CAPACITY && align_of::<T>() <= Self::ALIGN
    }

    /// Returns `true` if the buffer can hold a heap pointer, which every
    /// container needs for its fallback placement.
    #[inline]
    pub const fn holds_pointer() -> bool {
        Self::fits::<NonNull<Erased>>()
    }

    /// Read-only pointer to the start of the buffer.
    #[inline]
    pub fn slot(&self) -> NonNull<Erased> {
        NonNull::from(&self.bytes).cast()
    }

    /// Read-write pointer to the start of the buffer.
    #[inline]
    pub fn slot_mut(&mut self) -> NonNull<Erased> {
        NonNull::from(&mut self.bytes).cast()
    }
}

impl<S> Default for Buffer<S> {
    fn default() -> Self {
        Self::new()
    }
}
