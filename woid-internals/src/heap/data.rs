//! This module encapsulates the fields of the [`HeapBlock`]. Since this is the
//! only place they are visible, the [`HeapVtable`] of a block is guaranteed to
//! match the type of the value stored next to it: they are paired on creation
//! and nothing can change either afterwards.

use core::ptr::NonNull;

use crate::{heap::vtable::HeapVtable, util::Erased};

/// A heap-allocated value together with its vtable.
///
/// `#[repr(C)]` guarantees the vtable sits at offset zero for every `T`, so it
/// can be read through a `NonNull<HeapBlock<Erased>>`.
#[repr(C)]
pub(crate) struct HeapBlock<T: 'static> {
    /// The vtable of this block.
    vtable: &'static HeapVtable,
    /// The stored value.
    value: T,
}

impl<T: 'static> HeapBlock<T> {
    /// Creates a block pairing `value` with `vtable`.
    ///
    /// The pairing is only sound if `vtable` was built for `T`; the
    /// constructors of [`HeapVtable`] only hand out such vtables.
    #[inline]
    pub(super) fn new(vtable: &'static HeapVtable, value: T) -> Self {
        Self { vtable, value }
    }

    /// Returns the vtable of this block.
    #[inline]
    pub(super) fn vtable(&self) -> &'static HeapVtable {
        self.vtable
    }

    /// Returns the stored value.
    #[inline]
    pub(super) fn value(&self) -> &T {
        &self.value
    }
}

/// Returns the vtable of the block `ptr` points to.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `ptr` points to a live `HeapBlock<T>` for some `T`.
#[inline]
pub(super) unsafe fn vtable_of(ptr: NonNull<HeapBlock<Erased>>) -> &'static HeapVtable {
    let ptr = ptr.as_ptr();
    // SAFETY: We don't know the actual value type, but we do know that the
    // pointer refers to a `HeapBlock<T>` for some `T` (guaranteed by the
    // caller). Since `HeapBlock<T>` is `#[repr(C)]`, it is sound to project to
    // the fields in front of the value without creating a reference to the
    // whole block.
    let vtable_ptr: *const &'static HeapVtable = unsafe { &raw const (*ptr).vtable };

    // SAFETY: The field is initialized for the lifetime of the block.
    unsafe { *vtable_ptr }
}

/// Returns a pointer to the value inside the block `ptr` points to.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `ptr` points to a live `HeapBlock<T>`.
#[inline]
pub(super) unsafe fn value_of<T: 'static>(ptr: NonNull<HeapBlock<Erased>>) -> NonNull<T> {
    debug_assert!(
        // SAFETY: Guaranteed by the caller
        unsafe { vtable_of(ptr) }.is::<T>()
    );

    let ptr = ptr.cast::<HeapBlock<T>>().as_ptr();
    // SAFETY: The block holds a `T` (guaranteed by the caller), so projecting
    // to its `value` field stays inside the allocation.
    let value_ptr: *mut T = unsafe { &raw mut (*ptr).value };

    // SAFETY: Field projections of a non-null pointer are non-null.
    unsafe { NonNull::new_unchecked(value_ptr) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heap_block_field_offsets() {
        use core::mem::offset_of;

        #[repr(align(32))]
        struct LargeAlignment {
            _value: u8,
        }

        assert_eq!(offset_of!(HeapBlock<u8>, vtable), 0);
        assert_eq!(offset_of!(HeapBlock<[u64; 4]>, vtable), 0);
        assert_eq!(offset_of!(HeapBlock<LargeAlignment>, vtable), 0);

        assert!(offset_of!(HeapBlock<u8>, value) >= size_of::<&'static HeapVtable>());
        assert!(
            offset_of!(HeapBlock<LargeAlignment>, value) >= size_of::<&'static HeapVtable>()
        );
    }
}
