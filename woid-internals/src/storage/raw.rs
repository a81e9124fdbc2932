//! Type-erased bounded storage.
//!
//! This module encapsulates the fields of [`RawStorage`]. Since this is the
//! only place they are visible, the manager is guaranteed to always describe
//! the value that actually sits in the buffer.
//!
//! # Safety Invariant
//!
//! - If `manager` is `None`, the buffer holds nothing.
//! - If `manager` is `Some(m)`, the buffer holds a live value described by
//!   `m`: the value itself when `m.bound().placement()` is
//!   [`Placement::Inline`], or a `NonNull<T>` owning an allocation when it is
//!   [`Placement::Heap`].
//! - A type `T` is stored inline exactly when [`Buffer::fits::<T>`] holds.
//!
//! Every method that destroys or moves the value clears `manager` *before*
//! calling into the manager, so a panic escaping from user code can never
//! leave a destroyed value marked as live.
//!
//! [`Placement::Inline`]: crate::manager::Placement::Inline
//! [`Placement::Heap`]: crate::manager::Placement::Heap

use core::{marker::PhantomData, mem::ManuallyDrop, ptr::NonNull};

use crate::{
    allocator::Allocator,
    manager::{BoundType, CopyManager, Manager, Placement},
    storage::Buffer,
};

/// Inline buffer paired with the manager of the value it holds.
///
/// The storage is neither `Send` nor `Sync`, since it can hold values of any
/// type.
pub struct RawStorage<S, M: Manager> {
    /// The inline bytes.
    buffer: Buffer<S>,
    /// Manager of the held value; `None` when empty.
    ///
    /// # Safety
    ///
    /// See the module documentation.
    manager: Option<&'static M>,
    /// Opts out of `Send` and `Sync`.
    _not_send: PhantomData<*const ()>,
}

impl<S, M: Manager> RawStorage<S, M> {
    /// Creates an empty storage.
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            buffer: Buffer::new(),
            manager: None,
            _not_send: PhantomData,
        }
    }

    /// Creates a storage holding `value` inline.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `manager` describes `T` at [`Placement::Inline`].
    /// 2. [`Buffer::<S>::fits::<T>`](Buffer::fits) holds.
    #[inline]
    pub unsafe fn new_inline<T: 'static>(value: T, manager: &'static M) -> Self {
        debug_assert!(Buffer::<S>::fits::<T>());
        debug_assert!(manager.bound().is::<T>());
        debug_assert_eq!(manager.bound().placement(), Placement::Inline);

        let mut buffer = Buffer::new();
        // SAFETY: The buffer is large and aligned enough for `T` (2. guaranteed by
        // the caller) and is currently uninitialized.
        unsafe { buffer.slot_mut().cast::<T>().write(value) };
        Self {
            buffer,
            manager: Some(manager),
            _not_send: PhantomData,
        }
    }

    /// Creates a storage holding `value` in an allocation from `A`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `manager` describes `T` at [`Placement::Heap`] allocated from `A`.
    /// 2. [`Buffer::<S>::fits::<T>`](Buffer::fits) does not hold, and the
    ///    buffer can hold a pointer.
    #[inline]
    pub unsafe fn new_boxed<T: 'static, A: Allocator>(value: T, manager: &'static M) -> Self {
        let ptr = A::allocate(value);
        // SAFETY: `ptr` comes from `A::allocate`; the rest is guaranteed by the
        // caller.
        unsafe { Self::adopt(ptr, manager) }
    }

    /// Creates a storage taking ownership of an existing allocation.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` was returned by `A::allocate` for the allocator `A` that
    ///    `manager` was built with, and ownership is transferred here.
    /// 2. `manager` describes `T` at [`Placement::Heap`].
    /// 3. [`Buffer::<S>::fits::<T>`](Buffer::fits) does not hold, and the
    ///    buffer can hold a pointer.
    #[inline]
    pub unsafe fn adopt<T: 'static>(ptr: NonNull<T>, manager: &'static M) -> Self {
        debug_assert!(Buffer::<S>::holds_pointer());
        debug_assert!(!Buffer::<S>::fits::<T>());
        debug_assert!(manager.bound().is::<T>());
        debug_assert_eq!(manager.bound().placement(), Placement::Heap);

        let mut buffer = Buffer::new();
        // SAFETY: The buffer can hold a pointer (3. guaranteed by the caller) and is
        // currently uninitialized.
        unsafe { buffer.slot_mut().cast::<NonNull<T>>().write(ptr) };
        Self {
            buffer,
            manager: Some(manager),
            _not_send: PhantomData,
        }
    }

    /// Returns `true` if no value is held.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.manager.is_none()
    }

    /// Returns the manager of the held value.
    #[inline]
    pub fn manager(&self) -> Option<&'static M> {
        self.manager
    }

    /// Returns the description of the held value's type.
    #[inline]
    pub fn bound(&self) -> Option<&'static BoundType> {
        self.manager.map(Manager::bound)
    }

    /// Destroys the held value, if any, leaving the storage empty.
    #[inline]
    pub fn reset(&mut self) {
        if let Some(manager) = self.manager.take() {
            // SAFETY: The buffer holds a live value described by `manager` (type
            // invariant). The storage is already marked empty, so the slot is
            // treated as uninitialized afterwards even if the destructor panics.
            unsafe { manager.destroy(self.buffer.slot_mut()) }
        }
    }

    /// Moves the held value into a new storage, leaving `self` empty.
    #[inline]
    #[must_use]
    pub fn take(&mut self) -> Self {
        let mut target = Self::empty();
        target.relocate_from(self);
        target
    }

    /// Destroys the held value and moves the value of `source` in, leaving
    /// `source` empty.
    #[inline]
    pub fn relocate_from(&mut self, source: &mut Self) {
        self.reset();
        if let Some(manager) = source.manager.take() {
            // SAFETY: `source` held a live value described by `manager` (type
            // invariant) and is now marked empty. `self` is empty, so its buffer is
            // free for writes, and the two buffers cannot overlap since we hold
            // two distinct mutable references.
            unsafe { manager.relocate(source.buffer.slot_mut(), self.buffer.slot_mut()) };
            self.manager = Some(manager);
        }
    }

    /// Returns a pointer to the held `T`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The storage is not empty and holds a `T`.
    #[inline]
    unsafe fn value_ptr<T: 'static>(&self) -> NonNull<T> {
        debug_assert!(self.bound().is_some_and(BoundType::is::<T>));

        if Buffer::<S>::fits::<T>() {
            self.buffer.slot().cast::<T>()
        } else {
            // SAFETY: A `T` that does not fit is stored behind a pointer (type
            // invariant), and the storage holds a `T` (1. guaranteed by the caller).
            unsafe { self.buffer.slot().cast::<NonNull<T>>().read() }
        }
    }

    /// Returns a write-capable pointer to the held `T`.
    ///
    /// # Safety
    ///
    /// Same as [`RawStorage::value_ptr`].
    #[inline]
    unsafe fn value_ptr_mut<T: 'static>(&mut self) -> NonNull<T> {
        debug_assert!(self.bound().is_some_and(BoundType::is::<T>));

        if Buffer::<S>::fits::<T>() {
            self.buffer.slot_mut().cast::<T>()
        } else {
            // SAFETY: A `T` that does not fit is stored behind a pointer (type
            // invariant), and the storage holds a `T` (guaranteed by the caller).
            unsafe { self.buffer.slot().cast::<NonNull<T>>().read() }
        }
    }

    /// Accesses the held value as a `T`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The storage is not empty and holds a `T`.
    #[inline]
    pub unsafe fn downcast_unchecked<T: 'static>(&self) -> &T {
        // SAFETY: 1. Guaranteed by the caller
        let ptr = unsafe { self.value_ptr::<T>() };
        // SAFETY: The pointer refers to a live `T` owned by this storage, and the
        // returned reference borrows `self`.
        unsafe { ptr.as_ref() }
    }

    /// Mutably accesses the held value as a `T`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The storage is not empty and holds a `T`.
    #[inline]
    pub unsafe fn downcast_unchecked_mut<T: 'static>(&mut self) -> &mut T {
        // SAFETY: 1. Guaranteed by the caller
        let mut ptr = unsafe { self.value_ptr_mut::<T>() };
        // SAFETY: The pointer refers to a live `T` owned by this storage, and the
        // returned reference mutably borrows `self`.
        unsafe { ptr.as_mut() }
    }

    /// Moves the held `T` out, leaving the storage empty.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The storage is not empty and holds a `T`.
    /// 2. If `T` is stored on the heap, `A` is the allocator it came from.
    #[inline]
    pub unsafe fn take_unchecked<T: 'static, A: Allocator>(&mut self) -> T {
        // SAFETY: 1. Guaranteed by the caller
        let ptr = unsafe { self.value_ptr_mut::<T>() };
        self.manager = None;

        // SAFETY: The value is live and the storage no longer claims it, so it is
        // read exactly once.
        let value = unsafe { ptr.read() };
        if !Buffer::<S>::fits::<T>() {
            // SAFETY: The allocation came from `A` (2. guaranteed by the caller). The
            // value was moved out above, so it is released as `ManuallyDrop<T>`,
            // which has the same layout and drops nothing.
            unsafe { A::release(ptr.cast::<ManuallyDrop<T>>()) }
        }
        value
    }
}

impl<S, M: CopyManager> RawStorage<S, M> {
    /// Returns a storage holding a clone of the held value.
    ///
    /// If cloning panics, nothing leaks and `self` is untouched.
    #[inline]
    #[must_use]
    pub fn duplicate(&self) -> Self {
        let mut target = Self::empty();
        self.duplicate_into(&mut target);
        target
    }

    /// Destroys the value held by `target` and replaces it with a clone of the
    /// value held by `self`.
    ///
    /// `target` is emptied before cloning, so if cloning panics `target` is
    /// left empty.
    #[inline]
    pub fn duplicate_into(&self, target: &mut Self) {
        target.reset();
        if let Some(manager) = self.manager {
            // SAFETY: `self` holds a live value described by `manager` (type
            // invariant). `target` is empty and distinct from `self` (one is
            // borrowed mutably), so its buffer is free for writes. If the clone
            // panics `target.manager` is still `None`.
            unsafe { manager.duplicate(self.buffer.slot(), target.buffer.slot_mut()) };
            target.manager = Some(manager);
        }
    }
}

impl<S, M: Manager> Default for RawStorage<S, M> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<S, M: Manager> Drop for RawStorage<S, M> {
    #[inline]
    fn drop(&mut self) {
        self.reset();
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::*;
    use crate::{
        allocator::Global,
        manager::{CombinedCopyManager, CombinedManager, MoveManager},
    };

    type Small = RawStorage<[usize; 1], CombinedManager>;

    #[test]
    fn test_raw_storage_size() {
        assert_eq!(size_of::<Small>(), 2 * size_of::<usize>());
        assert_eq!(
            size_of::<RawStorage<[usize; 4], CombinedCopyManager>>(),
            5 * size_of::<usize>()
        );
    }

    #[test]
    fn test_inline_and_heap_values() {
        // SAFETY: `u32` fits one word and the manager matches.
        let mut inline = unsafe { Small::new_inline(7_u32, CombinedManager::inline::<u32>()) };
        // SAFETY: `String` is three words, so it is placed on the heap.
        let boxed = unsafe {
            Small::new_boxed::<String, Global>(
                String::from("heap"),
                CombinedManager::boxed::<String, Global>(),
            )
        };

        // SAFETY: The storages hold the requested types.
        unsafe {
            *inline.downcast_unchecked_mut::<u32>() += 1;
        }
        // SAFETY: The storage holds a `u32`.
        assert_eq!(unsafe { *inline.downcast_unchecked::<u32>() }, 8);
        // SAFETY: The storage holds a `String`.
        assert_eq!(unsafe { boxed.downcast_unchecked::<String>() }, "heap");
        assert_eq!(boxed.bound().map(BoundType::placement), Some(Placement::Heap));
    }

    #[test]
    fn test_take_leaves_source_empty() {
        // SAFETY: `String` does not fit one word.
        let mut source = unsafe {
            Small::new_boxed::<String, Global>(
                String::from("moved"),
                CombinedManager::boxed::<String, Global>(),
            )
        };
        let mut target = source.take();
        assert!(source.is_empty());
        // SAFETY: The storage holds a `String` on the heap from `Global`.
        let value = unsafe { target.take_unchecked::<String, Global>() };
        assert_eq!(value, "moved");
        assert!(target.is_empty());
    }

    static_assertions::assert_not_impl_any!(Small: Send, Sync);
}
