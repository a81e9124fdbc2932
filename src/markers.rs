//! Marker types and traits selecting the behavior of erased containers.
//!
//! Every container in this crate is configured entirely at the type level.
//! The markers in this module appear as generic parameters of
//! [`Any<S, C, G, L, K, A>`](crate::Any), [`HeapAny<C, A>`](crate::HeapAny),
//! [`TrivialAny<S, C, A>`](crate::TrivialAny) and
//! [`Interface<I, S, O>`](crate::Interface), and they cost nothing at runtime.
//!
//! # Design Philosophy
//!
//! The constraints encoded by these markers are enforced at construction time.
//! It is impossible to put a value that is not [`Clone`] into a container
//! marked [`Copyable`], and it is impossible to call a checked cast on a
//! container marked [`Unchecked`]. Behavior that a configuration does not
//! support is missing from the API rather than failing at runtime.
//!
//! # Copy Policy
//!
//! - [`Copyable`]: the container implements [`Clone`]; every stored value
//!   must implement [`Clone`] as well
//! - [`MoveOnly`]: the container cannot be cloned, and accepts any value
//!
//! # Exception Guarantee
//!
//! Panics take the role of exceptions. The guarantee only matters for
//! [`Clone::clone_from`] on copy-enabled containers, since moves never fail:
//!
//! - [`Strong`]: clone into a temporary first, then replace. If cloning
//!   panics, the target still holds its old value.
//! - [`Basic`]: destroy the old value, then clone in place. If cloning panics,
//!   the target is left empty and nothing leaks.
//! - [`NoGuarantee`]: promises nothing beyond memory safety. Currently
//!   behaves like [`Basic`].
//!
//! # Cast Check
//!
//! - [`Checked`]: enables extraction methods that verify the requested type
//!   and report [`BadAnyCast`](crate::BadAnyCast) on mismatch
//! - [`Unchecked`]: only the `unsafe` extraction methods are available
//!
//! # Manager Layout
//!
//! - [`Combined`]: the memory manager is a single function pointer that takes
//!   an operation tag
//! - [`Split`]: the memory manager keeps one function pointer per operation
//!
//! Both behave identically; they differ in the size of the static descriptor
//! and the shape of the dispatch.
//!
//! # Table Ownership
//!
//! - [`Dedicated`]: each interface instance embeds its own dispatch table
//! - [`Shared`]: instances holding the same concrete type point to one
//!   process-wide table
//!
//! # Examples
//!
//! ```
//! use woid::{
//!     Any,
//!     markers::{Checked, Combined, Copyable, MoveOnly, NoGuarantee, Strong},
//!     space::S2,
//! };
//!
//! // Cloneable, strong copy-assignment, checked casts.
//! type Value = Any<S2, Copyable, Strong, Combined, Checked>;
//! let value = Value::new(String::from("hello"));
//! let copy = value.clone();
//! assert_eq!(copy.downcast_ref::<String>().unwrap(), "hello");
//!
//! // Move-only containers accept values that cannot be cloned.
//! struct Token;
//! type Owned = Any<S2, MoveOnly, NoGuarantee, Combined, Checked>;
//! let token = Owned::new(Token);
//! assert!(token.downcast_ref::<Token>().is_ok());
//! ```

use woid_internals::{
    RawHeap,
    allocator::Allocator,
    manager::{CopyManager, DuplicateFn, Manager, MoveManager},
};
pub use woid_internals::manager::{Combined, ManagerLayout, Split};

use crate::interface::DispatchTable;

/// Marker type for containers that can be cloned.
///
/// Values stored in a `Copyable` container must implement [`Clone`]; the
/// container calls that implementation when it is cloned.
///
/// # Examples
///
/// ```
/// use woid::{Any, markers::Copyable, space::S1};
///
/// let value: Any<S1, Copyable> = Any::new(5_u32);
/// let copy = value.clone();
/// // SAFETY: Both containers hold a `u32`.
/// assert_eq!(unsafe { *copy.downcast_ref_unchecked::<u32>() }, 5);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct Copyable;

/// Marker type for containers that can only be moved.
///
/// A `MoveOnly` container accepts any `'static` value, including values that
/// do not implement [`Clone`], and does not implement [`Clone`] itself.
///
/// ```compile_fail
/// use woid::{Any, markers::MoveOnly, space::S1};
///
/// let value: Any<S1, MoveOnly> = Any::new(5_u32);
/// let copy = value.clone(); // Move-only containers are not `Clone`
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct MoveOnly;

/// Marker type for the strong guarantee: a failed copy-assignment leaves the
/// target untouched.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct Strong;

/// Marker type for the basic guarantee: a failed copy-assignment leaves the
/// target empty and leaks nothing.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct Basic;

/// Marker type for containers that promise nothing about the state left
/// behind by a failed copy-assignment, beyond memory safety.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct NoGuarantee;

/// Marker type enabling checked extraction.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct Checked;

/// Marker type disabling checked extraction.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct Unchecked;

/// Marker type for interfaces that embed their dispatch table.
///
/// Binding is free, but every instance carries one function pointer per
/// method.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct Dedicated;

/// Marker type for interfaces that point to a process-wide dispatch table.
///
/// Every instance carries a single pointer. The table for a concrete type is
/// built the first time that type is bound and lives for the rest of the
/// process; later binds, from any thread, reuse it.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct Shared;

mod sealed_copy_policy {
    use super::*;

    pub trait Sealed: 'static {}

    impl Sealed for MoveOnly {}
    impl Sealed for Copyable {}
}

mod sealed_guarantee {
    use super::*;

    pub trait Sealed: 'static {}

    impl Sealed for NoGuarantee {}
    impl Sealed for Basic {}
    impl Sealed for Strong {}
}

mod sealed_cast_check {
    use super::*;

    pub trait Sealed: 'static {}

    impl Sealed for Checked {}
    impl Sealed for Unchecked {}
}

mod sealed_table_ownership {
    use super::*;

    pub trait Sealed: 'static {}

    impl Sealed for Dedicated {}
    impl Sealed for Shared {}
}

/// Marker trait for the copy policy of a container.
///
/// This trait is sealed and implemented for [`MoveOnly`] and [`Copyable`].
pub trait CopyPolicy: sealed_copy_policy::Sealed {
    /// The memory-manager type used under this policy with the layout `L`.
    ///
    /// For [`Copyable`] this is a manager that can also duplicate values.
    type Manager<L: ManagerLayout>: Manager;
}

impl CopyPolicy for MoveOnly {
    type Manager<L: ManagerLayout> = L::MoveOnly;
}

impl CopyPolicy for Copyable {
    type Manager<L: ManagerLayout> = L::Copyable;
}

/// The failure behavior of copy-assignment.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum GuaranteeLevel {
    /// Nothing beyond memory safety.
    None,
    /// The target is left empty on failure.
    Basic,
    /// The target is left untouched on failure.
    Strong,
}

/// Marker trait for the exception guarantee of a container.
///
/// This trait is sealed and implemented for [`NoGuarantee`], [`Basic`] and
/// [`Strong`].
pub trait ExceptionGuarantee: sealed_guarantee::Sealed {
    /// The level this marker stands for.
    const LEVEL: GuaranteeLevel;
}

impl ExceptionGuarantee for NoGuarantee {
    const LEVEL: GuaranteeLevel = GuaranteeLevel::None;
}

impl ExceptionGuarantee for Basic {
    const LEVEL: GuaranteeLevel = GuaranteeLevel::Basic;
}

impl ExceptionGuarantee for Strong {
    const LEVEL: GuaranteeLevel = GuaranteeLevel::Strong;
}

/// Marker trait for whether a container offers checked extraction.
///
/// This trait is sealed and implemented for [`Checked`] and [`Unchecked`].
pub trait CastCheck: sealed_cast_check::Sealed {
    /// `true` for [`Checked`].
    const CHECKED: bool;
}

impl CastCheck for Checked {
    const CHECKED: bool = true;
}

impl CastCheck for Unchecked {
    const CHECKED: bool = false;
}

/// Marker trait for how an interface owns its dispatch table.
///
/// This trait is sealed and implemented for [`Dedicated`] and [`Shared`].
pub trait TableOwnership: sealed_table_ownership::Sealed {
    /// What an interface instance stores to reach its table.
    type Handle<Tb: DispatchTable>: Copy;

    /// Produces the handle for the table of the concrete type `T`.
    #[doc(hidden)]
    fn bind<Tb: DispatchTable, T: 'static>(build: impl FnOnce() -> Tb) -> Self::Handle<Tb>;

    /// Reaches the table through its handle.
    #[doc(hidden)]
    fn resolve<Tb: DispatchTable>(handle: &Self::Handle<Tb>) -> &Tb;
}

impl TableOwnership for Dedicated {
    type Handle<Tb: DispatchTable> = Tb;

    #[inline]
    fn bind<Tb: DispatchTable, T: 'static>(build: impl FnOnce() -> Tb) -> Tb {
        build()
    }

    #[inline]
    fn resolve<Tb: DispatchTable>(handle: &Tb) -> &Tb {
        handle
    }
}

impl TableOwnership for Shared {
    type Handle<Tb: DispatchTable> = &'static Tb;

    #[inline]
    fn bind<Tb: DispatchTable, T: 'static>(build: impl FnOnce() -> Tb) -> &'static Tb {
        crate::interface::registry::shared_table::<Tb, T>(build)
    }

    #[inline]
    fn resolve<Tb: DispatchTable>(handle: &Self::Handle<Tb>) -> &Tb {
        handle
    }
}

/// Marker trait tying a value type to the copy policy of its container.
///
/// Containers are only constructible with values satisfying the policy:
///
/// - For `C = MoveOnly`: implemented for all `Sized + 'static` types.
/// - For `C = Copyable`: implemented for all `Clone + 'static` types.
///
/// The hidden methods hand out the static descriptors the containers need;
/// they are not meant to be called directly.
///
/// ```compile_fail
/// use woid::{Any, markers::Copyable, space::S1};
///
/// struct NotClone;
/// // `NotClone` does not satisfy `StorableFor<Copyable>`
/// let value: Any<S1, Copyable> = Any::new(NotClone);
/// ```
pub trait StorableFor<C: CopyPolicy>: Sized + 'static {
    /// Returns the manager for this type stored inline.
    #[doc(hidden)]
    fn inline_manager<L: ManagerLayout>() -> &'static C::Manager<L>;

    /// Returns the manager for this type stored in an allocation from `A`.
    #[doc(hidden)]
    fn boxed_manager<L: ManagerLayout, A: Allocator>() -> &'static C::Manager<L>;

    /// Moves the value into a heap block allocated from `A`.
    #[doc(hidden)]
    fn into_heap<A: Allocator>(self) -> RawHeap;

    /// Returns the clone operation for an inline value, if the policy needs
    /// one.
    #[doc(hidden)]
    fn inline_duplicate() -> Option<DuplicateFn>;
}

impl<T: Sized + 'static> StorableFor<MoveOnly> for T {
    #[inline(always)]
    fn inline_manager<L: ManagerLayout>() -> &'static <MoveOnly as CopyPolicy>::Manager<L> {
        <L::MoveOnly as MoveManager>::inline::<T>()
    }

    #[inline(always)]
    fn boxed_manager<L: ManagerLayout, A: Allocator>()
    -> &'static <MoveOnly as CopyPolicy>::Manager<L> {
        <L::MoveOnly as MoveManager>::boxed::<T, A>()
    }

    #[inline(always)]
    fn into_heap<A: Allocator>(self) -> RawHeap {
        RawHeap::new::<T, A>(self)
    }

    #[inline(always)]
    fn inline_duplicate() -> Option<DuplicateFn> {
        None
    }
}

impl<T: Clone + 'static> StorableFor<Copyable> for T {
    #[inline(always)]
    fn inline_manager<L: ManagerLayout>() -> &'static <Copyable as CopyPolicy>::Manager<L> {
        <L::Copyable as CopyManager>::inline::<T>()
    }

    #[inline(always)]
    fn boxed_manager<L: ManagerLayout, A: Allocator>()
    -> &'static <Copyable as CopyPolicy>::Manager<L> {
        <L::Copyable as CopyManager>::boxed::<T, A>()
    }

    #[inline(always)]
    fn into_heap<A: Allocator>(self) -> RawHeap {
        RawHeap::new_cloneable::<T, A>(self)
    }

    #[inline(always)]
    fn inline_duplicate() -> Option<DuplicateFn> {
        Some(woid_internals::manager::inline_duplicate::<T>())
    }
}
