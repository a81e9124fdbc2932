//! Bounded inline storage with heap fallback.
//!
//! [`Any`] keeps small values inside its own buffer and moves bigger (or
//! over-aligned) values to an allocation from its [`Allocator`]. Which of the
//! two happens is decided per type at compile time: a value is stored inline
//! exactly when its size and alignment do not exceed those of the space type
//! `S`.
//!
//! - [`cast`]: checked and unchecked extraction in the four access modes
//! - [`assign`]: cloning, copy-assignment and relocation

mod assign;
mod cast;

use core::{any::TypeId, fmt, marker::PhantomData, mem::ManuallyDrop, ptr::NonNull};

use alloc::boxed::Box;
use woid_internals::{
    allocator::{Allocator, Global},
    manager::{BoundType, Placement},
    storage::{Buffer, RawStorage},
};

use crate::{
    OwningStorage, Storage,
    markers::{
        CastCheck, Combined, CopyPolicy, Copyable, ExceptionGuarantee, ManagerLayout,
        NoGuarantee, StorableFor, Unchecked,
    },
    space::S1,
};

/// A container owning one value of any type, stored inline when it fits.
///
/// The generic parameters select the container's behavior; see
/// [`markers`](crate::markers) for details:
///
/// - `S`: space type fixing inline capacity and alignment (see
///   [`space`](crate::space))
/// - `C`: copy policy, [`Copyable`] or [`MoveOnly`](crate::markers::MoveOnly)
/// - `G`: exception guarantee of copy-assignment
/// - `L`: memory-manager layout, [`Combined`] or
///   [`Split`](crate::markers::Split)
/// - `K`: [`Checked`](crate::markers::Checked) or [`Unchecked`] extraction
/// - `A`: allocator for values that do not fit inline
///
/// An `Any` is either empty or holds exactly one value. It is empty after
/// [`Default::default`], after its value was moved out with
/// [`take`](Any::take) or [`move_from`](Any::move_from), and after
/// [`reset`](Any::reset).
///
/// The container is neither `Send` nor `Sync`, since it can hold values of any
/// type.
///
/// # Examples
///
/// ```
/// use woid::{Any, space::S1};
///
/// let mut first: Any<S1> = Any::new(42_i32);
/// let second = first.take();
/// assert!(first.is_empty());
/// // SAFETY: `second` holds an `i32`.
/// assert_eq!(unsafe { *second.downcast_ref_unchecked::<i32>() }, 42);
/// ```
pub struct Any<
    S = S1,
    C: CopyPolicy = Copyable,
    G: ExceptionGuarantee = NoGuarantee,
    L: ManagerLayout = Combined,
    K: CastCheck = Unchecked,
    A: Allocator = Global,
> {
    /// The raw storage, driven by a manager for the copy policy and layout.
    raw: RawStorage<S, C::Manager<L>>,
    /// The policies that have no runtime footprint.
    _policies: PhantomData<(G, K, A)>,
}

impl<S, C, G, L, K, A> Any<S, C, G, L, K, A>
where
    C: CopyPolicy,
    G: ExceptionGuarantee,
    L: ManagerLayout,
    K: CastCheck,
    A: Allocator,
{
    /// Checked at compile time: the space must be able to hold the pointer
    /// used for heap placement.
    const HOLDS_POINTER: () = assert!(
        Buffer::<S>::holds_pointer(),
        "the space type must be at least as large and as aligned as a pointer"
    );

    /// Wraps a raw storage.
    #[inline]
    fn from_raw_storage(raw: RawStorage<S, C::Manager<L>>) -> Self {
        Self {
            raw,
            _policies: PhantomData,
        }
    }

    /// Creates an empty container.
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            raw: RawStorage::empty(),
            _policies: PhantomData,
        }
    }

    /// Creates a container holding `value`.
    ///
    /// The value is stored inline if it fits the space `S`, and in an
    /// allocation from `A` otherwise.
    #[inline]
    pub fn new<T: StorableFor<C>>(value: T) -> Self {
        let () = Self::HOLDS_POINTER;

        let raw = if Self::stores_inline::<T>() {
            // SAFETY: The manager describes `T` stored inline, and `T` fits.
            unsafe { RawStorage::new_inline(value, T::inline_manager::<L>()) }
        } else {
            // SAFETY: The manager describes `T` stored in an allocation from `A`, `T`
            // does not fit, and the buffer holds a pointer (`HOLDS_POINTER`).
            unsafe { RawStorage::new_boxed::<T, A>(value, T::boxed_manager::<L, A>()) }
        };
        Self::from_raw_storage(raw)
    }

    /// Creates a container holding the value returned by `make`.
    ///
    /// This is the closest equivalent of constructing the value in place: for
    /// values placed on the heap, the allocation receives the value directly.
    #[inline]
    pub fn new_with<T: StorableFor<C>>(make: impl FnOnce() -> T) -> Self {
        Self::new(make())
    }

    /// Creates a container taking ownership of a value already allocated by
    /// `A`.
    ///
    /// If `T` is too big for inline storage the allocation is adopted as is.
    /// Otherwise the value is moved inline and the allocation is released.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` was returned by `A::allocate` for a `T`.
    /// 2. Ownership is transferred to the container: `ptr` is not used or
    ///    released by the caller afterwards.
    #[inline]
    pub unsafe fn from_raw<T: StorableFor<C>>(ptr: NonNull<T>) -> Self {
        let () = Self::HOLDS_POINTER;

        if Self::stores_inline::<T>() {
            // SAFETY: The pointee is a live `T` we own (1. and 2. guaranteed by the
            // caller), read exactly once.
            let value = unsafe { ptr.read() };
            // SAFETY: The allocation came from `A` (1. guaranteed by the caller). The
            // value was moved out above, so the block is released as
            // `ManuallyDrop<T>`, which has the same layout and drops nothing.
            unsafe { A::release(ptr.cast::<ManuallyDrop<T>>()) };
            Self::new(value)
        } else {
            // SAFETY: 1. and 2. Guaranteed by the caller. The manager describes `T`
            // stored in an allocation from `A`, `T` does not fit, and the buffer
            // holds a pointer (`HOLDS_POINTER`).
            let raw = unsafe { RawStorage::adopt(ptr, T::boxed_manager::<L, A>()) };
            Self::from_raw_storage(raw)
        }
    }

    /// Returns `true` if a `T` is stored inline in this container type.
    #[inline]
    pub const fn stores_inline<T>() -> bool {
        Buffer::<S>::fits::<T>()
    }

    /// Returns `true` if the container holds no value.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Destroys the held value, if any, leaving the container empty.
    #[inline]
    pub fn reset(&mut self) {
        self.raw.reset();
    }

    /// Returns the description of the held value's type.
    #[inline]
    pub fn bound_type(&self) -> Option<&'static BoundType> {
        self.raw.bound()
    }

    /// Returns the [`TypeId`] of the held value.
    #[inline]
    pub fn type_id(&self) -> Option<TypeId> {
        self.bound_type().map(BoundType::type_id)
    }

    /// Returns the name of the held value's type.
    #[inline]
    pub fn type_name(&self) -> Option<&'static str> {
        self.bound_type().map(BoundType::type_name)
    }

    /// Returns `true` if the container holds a `T`.
    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.bound_type().is_some_and(BoundType::is::<T>)
    }

    /// Returns where the held value lives.
    #[inline]
    pub fn placement(&self) -> Option<Placement> {
        self.bound_type().map(BoundType::placement)
    }

    /// Returns `true` if the held value lives in an allocation.
    #[inline]
    pub fn is_heap(&self) -> bool {
        self.placement() == Some(Placement::Heap)
    }
}

impl<S, C, G, L, K> Any<S, C, G, L, K, Global>
where
    C: CopyPolicy,
    G: ExceptionGuarantee,
    L: ManagerLayout,
    K: CastCheck,
{
    /// Creates a container taking ownership of a boxed value.
    ///
    /// Big values keep their allocation; values that fit are moved inline.
    #[inline]
    pub fn from_box<T: StorableFor<C>>(boxed: Box<T>) -> Self {
        let ptr = NonNull::from(Box::leak(boxed));
        // SAFETY: `Global` allocates through `Box`, so the leaked box is a pointer
        // `Global::allocate` could have returned, and we own it.
        unsafe { Self::from_raw(ptr) }
    }
}

impl<S, C, G, L, K, A> Default for Any<S, C, G, L, K, A>
where
    C: CopyPolicy,
    G: ExceptionGuarantee,
    L: ManagerLayout,
    K: CastCheck,
    A: Allocator,
{
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl<S, C, G, L, K, A> fmt::Debug for Any<S, C, G, L, K, A>
where
    C: CopyPolicy,
    G: ExceptionGuarantee,
    L: ManagerLayout,
    K: CastCheck,
    A: Allocator,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bound_type() {
            Some(bound) => f
                .debug_struct("Any")
                .field("type", &bound.type_name())
                .field("placement", &bound.placement())
                .finish(),
            None => f.write_str("Any(<empty>)"),
        }
    }
}

impl<S, C, G, L, K, A> Storage for Any<S, C, G, L, K, A>
where
    S: 'static,
    C: CopyPolicy,
    G: ExceptionGuarantee,
    L: ManagerLayout,
    K: CastCheck,
    A: Allocator,
{
    #[inline]
    fn is_empty(&self) -> bool {
        self.raw.is_empty()
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

impl<S, C, G, L, K, A> OwningStorage for Any<S, C, G, L, K, A>
where
    S: 'static,
    C: CopyPolicy,
    G: ExceptionGuarantee,
    L: ManagerLayout,
    K: CastCheck,
    A: Allocator,
{
    type Policy = C;

    #[inline]
    fn from_value<T: StorableFor<C>>(value: T) -> Self {
        Self::new(value)
    }
}
