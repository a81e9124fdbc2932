//! Storage that relocates as plain bytes.
//!
//! [`TrivialAny`] only keeps values inline when they have no drop glue. Such
//! values can be moved and forgotten without running any code of their own,
//! so the container needs no memory manager: moving it is a byte copy and
//! dropping it does nothing. Every other value goes to a heap block, whose
//! [`RawHeap`] pointer is itself trivially relocatable.

use core::{fmt, marker::PhantomData, mem};

use woid_internals::{
    RawHeap,
    allocator::{Allocator, Global},
    manager::DuplicateFn,
    storage::Buffer,
};

use crate::{
    OwningStorage, Storage,
    markers::{CopyPolicy, Copyable, StorableFor},
    space::S2,
};

/// What the buffer of a [`TrivialAny`] currently holds.
#[derive(Clone, Copy)]
enum Occupant {
    /// Nothing.
    Vacant,
    /// A value without drop glue, stored in place. `duplicate` clones it and
    /// is only present for copyable containers.
    Inline { duplicate: Option<DuplicateFn> },
    /// A [`RawHeap`] pointing to the value.
    Heap,
}

/// A container owning one value of any type, which can be relocated without
/// running per-type code.
///
/// Values that fit the space `S` and do not need dropping are kept inline.
/// Anything else is placed in an allocation from `A`. The container does not
/// remember the held type, so extraction is always unchecked.
///
/// # Examples
///
/// ```
/// use woid::{TrivialAny, space::S2};
///
/// let mut point: TrivialAny<S2> = TrivialAny::new([3_i32, 4]);
/// assert!(!point.is_heap());
/// let moved = point.take();
/// assert!(point.is_empty());
/// // SAFETY: `moved` holds a `[i32; 2]`.
/// assert_eq!(unsafe { moved.downcast_ref_unchecked::<[i32; 2]>() }, &[3, 4]);
///
/// let name: TrivialAny<S2> = TrivialAny::new(String::from("spills"));
/// assert!(name.is_heap());
/// ```
pub struct TrivialAny<S = S2, C: CopyPolicy = Copyable, A: Allocator = Global> {
    /// Either the value itself or a `RawHeap`, as told by `occupant`.
    buffer: Buffer<S>,
    /// The kind of content of `buffer`.
    occupant: Occupant,
    /// The policies that have no runtime footprint. The raw pointer keeps the
    /// container from being `Send` or `Sync`.
    _policies: PhantomData<(C, A, *const ())>,
}

impl<S, C: CopyPolicy, A: Allocator> TrivialAny<S, C, A> {
    /// Checked at compile time: the space must be able to hold the heap
    /// pointer.
    const HOLDS_HEAP: () = assert!(
        Buffer::<S>::fits::<RawHeap>(),
        "the space type must be at least as large and as aligned as a pointer"
    );

    /// Creates an empty container.
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            buffer: Buffer::new(),
            occupant: Occupant::Vacant,
            _policies: PhantomData,
        }
    }

    /// Creates a container holding `value`.
    pub fn new<T: StorableFor<C>>(value: T) -> Self {
        let () = Self::HOLDS_HEAP;

        let mut buffer = Buffer::new();
        let occupant = if Self::stores_inline::<T>() {
            // SAFETY: `T` fits the buffer (`stores_inline`), and the slot is writable.
            unsafe { buffer.slot_mut().cast::<T>().write(value) };
            Occupant::Inline {
                duplicate: T::inline_duplicate(),
            }
        } else {
            let heap = value.into_heap::<A>();
            // SAFETY: A `RawHeap` fits the buffer (`HOLDS_HEAP`), and the slot is
            // writable.
            unsafe { buffer.slot_mut().cast::<RawHeap>().write(heap) };
            Occupant::Heap
        };
        Self {
            buffer,
            occupant,
            _policies: PhantomData,
        }
    }

    /// Creates a container holding the value returned by `make`.
    #[inline]
    pub fn new_with<T: StorableFor<C>>(make: impl FnOnce() -> T) -> Self {
        Self::new(make())
    }

    /// Returns `true` if a `T` is stored inline in this container type.
    #[inline]
    pub const fn stores_inline<T>() -> bool {
        Buffer::<S>::fits::<T>() && !mem::needs_drop::<T>()
    }

    /// Returns `true` if the container holds no value.
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self.occupant, Occupant::Vacant)
    }

    /// Returns `true` if the held value lives in an allocation.
    #[inline]
    pub fn is_heap(&self) -> bool {
        matches!(self.occupant, Occupant::Heap)
    }

    /// Destroys the held value, if any, leaving the container empty.
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::empty();
    }

    /// Moves the held value into a new container, leaving `self` empty.
    ///
    /// This copies the buffer and never runs code of the held type.
    #[inline]
    #[must_use]
    pub fn take(&mut self) -> Self {
        mem::replace(self, Self::empty())
    }

    /// Returns the heap block.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The occupant is [`Occupant::Heap`].
    #[inline]
    unsafe fn heap(&self) -> &RawHeap {
        // SAFETY: The buffer holds a `RawHeap` (1. guaranteed by the caller).
        unsafe { self.buffer.slot().cast::<RawHeap>().as_ref() }
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
        if Self::stores_inline::<T>() {
            // SAFETY: A held `T` is stored inline (1. guaranteed by the caller).
            unsafe { self.buffer.slot().cast::<T>().as_ref() }
        } else {
            // SAFETY: A held `T` is stored on the heap (1. guaranteed by the
            // caller).
            let heap = unsafe { self.heap() };
            // SAFETY: 1. Guaranteed by the caller
            unsafe { heap.downcast_unchecked::<T>() }
        }
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
        let slot = self.buffer.slot_mut();
        if Self::stores_inline::<T>() {
            // SAFETY: A held `T` is stored inline (1. guaranteed by the caller), and
            // the slot is borrowed mutably for as long as the result lives.
            unsafe { slot.cast::<T>().as_mut() }
        } else {
            // SAFETY: A held `T` is stored on the heap, so the buffer holds a
            // `RawHeap` (1. guaranteed by the caller).
            let heap = unsafe { slot.cast::<RawHeap>().as_mut() };
            // SAFETY: 1. Guaranteed by the caller
            unsafe { heap.downcast_unchecked_mut::<T>() }
        }
    }

    /// Moves the held value out as a `T`, without checking, leaving the
    /// container empty.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The container is not empty and holds a `T`.
    pub unsafe fn take_unchecked<T: 'static>(&mut self) -> T {
        self.occupant = Occupant::Vacant;
        let slot = self.buffer.slot();
        if Self::stores_inline::<T>() {
            // SAFETY: The buffer held a `T` (1. guaranteed by the caller), and it is
            // marked vacant above so it is read exactly once.
            unsafe { slot.cast::<T>().read() }
        } else {
            // SAFETY: The buffer held a `RawHeap` (1. guaranteed by the caller), and
            // it is marked vacant above so it is read exactly once.
            let heap = unsafe { slot.cast::<RawHeap>().read() };
            // SAFETY: 1. Guaranteed by the caller. Every block of this container was
            // allocated from `A` in `new`.
            unsafe { heap.into_inner_unchecked::<T, A>() }
        }
    }
}

impl<S, A: Allocator> Clone for TrivialAny<S, Copyable, A> {
    /// Returns a container holding a clone of the held value.
    ///
    /// Inline values are cloned into a fresh buffer, heap values into a fresh
    /// block.
    fn clone(&self) -> Self {
        let mut copy = Self::empty();
        match self.occupant {
            Occupant::Vacant => {}
            Occupant::Inline { duplicate } => {
                let Some(duplicate) = duplicate else {
                    unreachable!("inline values of copyable containers are always cloneable");
                };
                // SAFETY: `duplicate` was captured for the type held inline, and the
                // fresh buffer of `copy` fits that type and does not overlap ours.
                unsafe { duplicate(self.buffer.slot(), copy.buffer.slot_mut()) };
                copy.occupant = self.occupant;
            }
            Occupant::Heap => {
                // SAFETY: The occupant is `Heap`.
                let heap = unsafe { self.heap() };
                let Some(block) = heap.try_duplicate() else {
                    unreachable!("blocks of copyable containers are always cloneable");
                };
                // SAFETY: A `RawHeap` fits the buffer, and the buffer of `copy` is
                // vacant.
                unsafe { copy.buffer.slot_mut().cast::<RawHeap>().write(block) };
                copy.occupant = Occupant::Heap;
            }
        }
        copy
    }
}

impl<S, C: CopyPolicy, A: Allocator> Drop for TrivialAny<S, C, A> {
    fn drop(&mut self) {
        if let Occupant::Heap = self.occupant {
            self.occupant = Occupant::Vacant;
            // SAFETY: The buffer holds a `RawHeap`, which is dropped exactly once
            // since the container is now vacant. Inline values need no dropping.
            unsafe { self.buffer.slot_mut().cast::<RawHeap>().drop_in_place() }
        }
    }
}

impl<S, C: CopyPolicy, A: Allocator> Default for TrivialAny<S, C, A> {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl<S, C: CopyPolicy, A: Allocator> fmt::Debug for TrivialAny<S, C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.occupant {
            Occupant::Vacant => f.write_str("TrivialAny(<empty>)"),
            Occupant::Inline { .. } => f.write_str("TrivialAny(<inline>)"),
            Occupant::Heap => f.write_str("TrivialAny(<heap>)"),
        }
    }
}

impl<S: 'static, C: CopyPolicy, A: Allocator> Storage for TrivialAny<S, C, A> {
    #[inline]
    fn is_empty(&self) -> bool {
        matches!(self.occupant, Occupant::Vacant)
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

impl<S: 'static, C: CopyPolicy, A: Allocator> OwningStorage for TrivialAny<S, C, A> {
    type Policy = C;

    #[inline]
    fn from_value<T: StorableFor<C>>(value: T) -> Self {
        Self::new(value)
    }
}
