//! Memory-manager descriptors.
//!
//! A manager is the static record that lets an erased container destroy,
//! relocate and (optionally) duplicate the value it holds without knowing its
//! type. Two encodings exist and behave identically:
//!
//! - **[`Split`]**: one function pointer per operation ([`SplitManager`],
//!   [`SplitCopyManager`]).
//! - **[`Combined`]**: a single function pointer taking an operation tag
//!   ([`CombinedManager`], [`CombinedCopyManager`]).
//!
//! Every manager also points to a [`BoundType`] describing the managed type.
//! Managers are `&'static` compile-time constants; they are shared by all
//! containers holding the same type at the same placement.

mod bound;
mod combined;
mod split;
mod thunks;

use core::ptr::NonNull;

pub use self::{
    bound::{BoundType, Placement},
    combined::{CombinedCopyManager, CombinedManager},
    split::{SplitCopyManager, SplitManager},
};
use crate::{allocator::Allocator, util::Erased};

/// Erased clone operation: clones the value in the first slot into the
/// second.
pub type DuplicateFn = unsafe fn(NonNull<Erased>, NonNull<Erased>);

/// Operations every manager supports.
pub trait Manager: Sync + 'static {
    /// Returns the description of the managed type.
    fn bound(&self) -> &'static BoundType;

    /// Destroys the value held in `slot`.
    ///
    /// For inline placement this drops the value in place; for heap placement
    /// the slot holds a pointer and the allocation is released.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `slot` holds a live value described by this manager.
    /// 2. The slot is treated as uninitialized afterwards.
    unsafe fn destroy(&self, slot: NonNull<Erased>);

    /// Moves the value held in `src` into `dst`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `src` holds a live value described by this manager, and is treated
    ///    as uninitialized afterwards.
    /// 2. `dst` is valid for writes of the managed representation and does not
    ///    overlap `src`.
    unsafe fn relocate(&self, src: NonNull<Erased>, dst: NonNull<Erased>);
}

/// Constructors for managers of move-only containers.
pub trait MoveManager: Manager {
    /// Returns the manager for `T` stored inline.
    fn inline<T: 'static>() -> &'static Self;

    /// Returns the manager for `T` stored in an allocation from `A`.
    fn boxed<T: 'static, A: Allocator>() -> &'static Self;
}

/// Constructors and the duplicate operation for copy-enabled containers.
pub trait CopyManager: Manager {
    /// Returns the manager for `T` stored inline.
    fn inline<T: Clone + 'static>() -> &'static Self;

    /// Returns the manager for `T` stored in an allocation from `A`.
    fn boxed<T: Clone + 'static, A: Allocator>() -> &'static Self;

    /// Clones the value held in `src` into `dst`.
    ///
    /// If the clone panics, `dst` is left uninitialized and nothing leaks.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `src` holds a live value described by this manager.
    /// 2. `dst` is valid for writes of the managed representation and does not
    ///    overlap `src`.
    unsafe fn duplicate(&self, src: NonNull<Erased>, dst: NonNull<Erased>);
}

/// Selects the manager encoding used by a container.
pub trait ManagerLayout: 'static {
    /// Manager type for move-only containers.
    type MoveOnly: MoveManager;
    /// Manager type for copy-enabled containers.
    type Copyable: CopyManager;
}

/// Encoding with one function pointer per operation.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct Split;

/// Encoding with one function pointer for all operations.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct Combined;

impl ManagerLayout for Split {
    type Copyable = SplitCopyManager;
    type MoveOnly = SplitManager;
}

impl ManagerLayout for Combined {
    type Copyable = CombinedCopyManager;
    type MoveOnly = CombinedManager;
}

/// Returns the erased clone operation for a `T` stored in place.
///
/// Used by storages that keep no manager for inline values but still need to
/// clone them.
pub fn inline_duplicate<T: Clone + 'static>() -> DuplicateFn {
    thunks::duplicate_inline::<T>
}
