//! Always-heap storage.
//!
//! [`HeapAny`] places every value in its own allocation. The block carries a
//! vtable next to the value, so the container itself is a single pointer and
//! never needs to branch on placement.

use core::{any::TypeId, fmt, marker::PhantomData};

use woid_internals::{
    RawHeap,
    allocator::{Allocator, Global},
};

use crate::{
    BadAnyCast, OwningStorage, Storage,
    markers::{CopyPolicy, Copyable, StorableFor},
};

/// A container owning one value of any type, always in an allocation from
/// `A`.
///
/// Cloning a [`Copyable`] `HeapAny` always allocates a fresh block, and
/// [`Clone::clone_from`] always gives the strong guarantee: the clone is made
/// before the target is touched.
///
/// # Examples
///
/// ```
/// use woid::HeapAny;
///
/// let value: HeapAny = HeapAny::new(vec![1, 2, 3]);
/// let copy = value.clone();
/// assert_eq!(copy.downcast_ref::<Vec<i32>>().unwrap().len(), 3);
/// assert!(value.downcast_ref::<String>().is_err());
/// ```
pub struct HeapAny<C: CopyPolicy = Copyable, A: Allocator = Global> {
    /// The block, or `None` when empty.
    heap: Option<RawHeap>,
    /// The policies that have no runtime footprint.
    _policies: PhantomData<(C, A)>,
}

impl<C: CopyPolicy, A: Allocator> HeapAny<C, A> {
    /// Creates an empty container.
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            heap: None,
            _policies: PhantomData,
        }
    }

    /// Creates a container holding `value`.
    #[inline]
    pub fn new<T: StorableFor<C>>(value: T) -> Self {
        Self {
            heap: Some(value.into_heap::<A>()),
            _policies: PhantomData,
        }
    }

    /// Creates a container holding the value returned by `make`.
    #[inline]
    pub fn new_with<T: StorableFor<C>>(make: impl FnOnce() -> T) -> Self {
        Self::new(make())
    }

    /// Moves the held value into a new container, leaving `self` empty.
    ///
    /// The allocation moves along with the value.
    #[inline]
    #[must_use]
    pub fn take(&mut self) -> Self {
        Self {
            heap: self.heap.take(),
            _policies: PhantomData,
        }
    }

    /// Returns `true` if the container holds no value.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_none()
    }

    /// Destroys the held value, if any, leaving the container empty.
    #[inline]
    pub fn reset(&mut self) {
        self.heap = None;
    }

    /// Returns the [`TypeId`] of the held value.
    #[inline]
    pub fn type_id(&self) -> Option<TypeId> {
        self.heap.as_ref().map(RawHeap::type_id)
    }

    /// Returns the name of the held value's type.
    #[inline]
    pub fn type_name(&self) -> Option<&'static str> {
        self.heap.as_ref().map(RawHeap::type_name)
    }

    /// Returns `true` if the container holds a `T`.
    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.heap.as_ref().is_some_and(RawHeap::is::<T>)
    }

    /// Verifies that the container holds a `T`.
    fn checked<T: 'static>(&self) -> Result<(), BadAnyCast> {
        match &self.heap {
            Some(heap) if heap.is::<T>() => Ok(()),
            found => Err(BadAnyCast::new::<T>(found.as_ref().map(RawHeap::type_name))),
        }
    }

    /// Returns a reference to the held value as a `T`.
    ///
    /// # Errors
    ///
    /// Returns [`BadAnyCast`] if the container is empty or holds another type.
    #[inline]
    pub fn downcast_ref<T: 'static>(&self) -> Result<&T, BadAnyCast> {
        self.checked::<T>()?;
        // SAFETY: The container holds a `T`, as checked above.
        Ok(unsafe { self.downcast_ref_unchecked::<T>() })
    }

    /// Returns a mutable reference to the held value as a `T`.
    ///
    /// # Errors
    ///
    /// Returns [`BadAnyCast`] if the container is empty or holds another type.
    #[inline]
    pub fn downcast_mut<T: 'static>(&mut self) -> Result<&mut T, BadAnyCast> {
        self.checked::<T>()?;
        // SAFETY: The container holds a `T`, as checked above.
        Ok(unsafe { self.downcast_mut_unchecked::<T>() })
    }

    /// Returns a clone of the held value as a `T`.
    ///
    /// Works for every copy policy: only `T` has to be [`Clone`].
    ///
    /// # Errors
    ///
    /// Returns [`BadAnyCast`] if the container is empty or holds another type.
    #[inline]
    pub fn downcast_cloned<T: Clone + 'static>(&self) -> Result<T, BadAnyCast> {
        self.downcast_ref::<T>().cloned()
    }

    /// Moves the held value out as a `T`, leaving the container empty.
    ///
    /// # Errors
    ///
    /// Returns [`BadAnyCast`] if the container is empty or holds another type.
    /// The container is left untouched in that case.
    #[inline]
    pub fn downcast_take<T: 'static>(&mut self) -> Result<T, BadAnyCast> {
        self.checked::<T>()?;
        // SAFETY: The container holds a `T`, as checked above.
        Ok(unsafe { self.take_unchecked::<T>() })
    }

    /// Returns a reference to the held value as a `T`, without checking.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The container is not empty and holds a `T`.
    #[inline]
    pub unsafe fn downcast_ref_unchecked<T: 'static>(&self) -> &T {
        // SAFETY: 1. Guaranteed by the caller
        let heap = unsafe { self.heap.as_ref().unwrap_unchecked() };
        // SAFETY: 1. Guaranteed by the caller
        unsafe { heap.downcast_unchecked::<T>() }
    }

    /// Returns a mutable reference to the held value as a `T`, without
    /// checking.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The container is not empty and holds a `T`.
    #[inline]
    pub unsafe fn downcast_mut_unchecked<T: 'static>(&mut self) -> &mut T {
        // SAFETY: 1. Guaranteed by the caller
        let heap = unsafe { self.heap.as_mut().unwrap_unchecked() };
        // SAFETY: 1. Guaranteed by the caller
        unsafe { heap.downcast_unchecked_mut::<T>() }
    }

    /// Moves the held value out as a `T`, without checking, leaving the
    /// container empty.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The container is not empty and holds a `T`.
    #[inline]
    pub unsafe fn take_unchecked<T: 'static>(&mut self) -> T {
        // SAFETY: 1. Guaranteed by the caller
        let heap = unsafe { self.heap.take().unwrap_unchecked() };
        // SAFETY: 1. Guaranteed by the caller. Every block of this container was
        // allocated from `A` in `new`.
        unsafe { heap.into_inner_unchecked::<T, A>() }
    }
}

impl<A: Allocator> Clone for HeapAny<Copyable, A> {
    /// Returns a container holding a clone of the held value in a new block.
    fn clone(&self) -> Self {
        let heap = self.heap.as_ref().map(|heap| match heap.try_duplicate() {
            Some(copy) => copy,
            None => unreachable!("blocks of copyable containers are always cloneable"),
        });
        Self {
            heap,
            _policies: PhantomData,
        }
    }
}

impl<C: CopyPolicy, A: Allocator> Default for HeapAny<C, A> {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl<C: CopyPolicy, A: Allocator> fmt::Debug for HeapAny<C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.type_name() {
            Some(name) => f.debug_tuple("HeapAny").field(&name).finish(),
            None => f.write_str("HeapAny(<empty>)"),
        }
    }
}

impl<C: CopyPolicy, A: Allocator> Storage for HeapAny<C, A> {
    #[inline]
    fn is_empty(&self) -> bool {
        self.heap.is_none()
    }

    #[inline]
    unsafe fn get_unchecked<T: 'static>(&self) -> &T {
        // SAFETY: Guaranteed by the caller
        unsafe { self.downcast_ref_unchecked::<T>() }
    }

    #[inline]
    unsafe fn get_unchecked_mut<T: 'static>(&mut self) -> &mut T {
        // SAFETY: Guaranteed by the caller
        unsafe { self.downcast_mut_unchecked::<T>() }
    }
}

impl<C: CopyPolicy, A: Allocator> OwningStorage for HeapAny<C, A> {
    type Policy = C;

    #[inline]
    fn from_value<T: StorableFor<C>>(value: T) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use alloc::{rc::Rc, string::String, vec::Vec};
    use core::cell::Cell;
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;
    use crate::markers::MoveOnly;

    #[derive(Clone)]
    struct Noisy(Rc<Cell<usize>>);

    impl Drop for Noisy {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_heap_any_is_one_pointer() {
        assert_eq!(size_of::<HeapAny>(), size_of::<usize>());
        assert_eq!(size_of::<HeapAny<MoveOnly>>(), size_of::<usize>());
    }

    #[test]
    fn test_small_values_still_allocate() {
        let value: HeapAny = HeapAny::new(3_u8);
        let copy = value.clone();
        let first: *const u8 = value.downcast_ref::<u8>().unwrap();
        let second: *const u8 = copy.downcast_ref::<u8>().unwrap();
        assert_ne!(first, second);
        assert_eq!(copy.downcast_ref::<u8>(), Ok(&3));
    }

    #[test]
    fn test_clone_from_is_strong() {
        struct Bomb;

        impl Clone for Bomb {
            fn clone(&self) -> Self {
                panic!("bomb went off");
            }
        }

        let source: HeapAny = HeapAny::new(Bomb);
        let mut target: HeapAny = HeapAny::new(String::from("kept"));
        let result = catch_unwind(AssertUnwindSafe(|| target.clone_from(&source)));
        assert!(result.is_err());
        assert_eq!(target.downcast_ref::<String>().unwrap(), "kept");
    }

    #[test]
    fn test_take_and_reset() {
        let drops = Rc::new(Cell::new(0));
        let mut value: HeapAny<MoveOnly> = HeapAny::new(Noisy(Rc::clone(&drops)));
        let moved = value.take();
        assert!(value.is_empty());
        assert!(moved.is::<Noisy>());
        drop(moved);
        assert_eq!(drops.get(), 1);

        let mut value: HeapAny = HeapAny::new(Noisy(Rc::clone(&drops)));
        value.reset();
        assert!(value.is_empty());
        assert_eq!(drops.get(), 2);
    }

    #[test]
    fn test_checked_access() {
        let mut value: HeapAny = HeapAny::new_with(|| Vec::from([4_u16, 5]));
        assert!(value.type_name().is_some_and(|name| name.contains("u16")));
        value.downcast_mut::<Vec<u16>>().unwrap().push(6);
        assert_eq!(value.downcast_cloned::<Vec<u16>>().unwrap(), [4, 5, 6]);
        assert!(value.downcast_cloned::<String>().is_err());

        let error = value.downcast_take::<Vec<u32>>().unwrap_err();
        assert!(error.requested().contains("u32"));
        assert_eq!(value.downcast_take::<Vec<u16>>().unwrap(), [4, 5, 6]);

        let error = value.downcast_ref::<Vec<u16>>().unwrap_err();
        assert_eq!(error.found(), None);
        assert_eq!(alloc::format!("{value:?}"), "HeapAny(<empty>)");
    }

    static_assertions::assert_not_impl_any!(HeapAny: Send, Sync);
    static_assertions::assert_not_impl_any!(HeapAny<MoveOnly>: Clone);
}
