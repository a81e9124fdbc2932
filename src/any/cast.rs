//! Extraction of the held value.
//!
//! Four access modes are supported: shared reference, mutable reference, a
//! clone of the value, and moving the value out. Checked variants exist only
//! on containers marked [`Checked`]; the `unsafe` unchecked variants exist on
//! every container.

use woid_internals::{allocator::Allocator, manager::BoundType};

use crate::{
    Any, BadAnyCast,
    markers::{CastCheck, Checked, CopyPolicy, ExceptionGuarantee, ManagerLayout},
};

impl<S, C, G, L, K, A> Any<S, C, G, L, K, A>
where
    C: CopyPolicy,
    G: ExceptionGuarantee,
    L: ManagerLayout,
    K: CastCheck,
    A: Allocator,
{
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
        unsafe { self.raw.downcast_unchecked::<T>() }
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
        unsafe { self.raw.downcast_unchecked_mut::<T>() }
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
        // SAFETY: 1. Guaranteed by the caller. Heap values of this container always
        // come from `A`.
        unsafe { self.raw.take_unchecked::<T, A>() }
    }
}

impl<S, C, G, L, A> Any<S, C, G, L, Checked, A>
where
    C: CopyPolicy,
    G: ExceptionGuarantee,
    L: ManagerLayout,
    A: Allocator,
{
    /// Verifies that the container holds a `T`.
    #[inline]
    fn check<T: 'static>(&self) -> Result<(), BadAnyCast> {
        match self.bound_type() {
            Some(bound) if bound.is::<T>() => Ok(()),
            found => Err(BadAnyCast::new::<T>(found.map(BoundType::type_name))),
        }
    }

    /// Returns a reference to the held value as a `T`.
    ///
    /// # Errors
    ///
    /// Returns [`BadAnyCast`] if the container is empty or holds another type.
    #[inline]
    pub fn downcast_ref<T: 'static>(&self) -> Result<&T, BadAnyCast> {
        self.check::<T>()?;
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
        self.check::<T>()?;
        // SAFETY: The container holds a `T`, as checked above.
        Ok(unsafe { self.downcast_mut_unchecked::<T>() })
    }

    /// Returns a clone of the held value as a `T`.
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
        self.check::<T>()?;
        // SAFETY: The container holds a `T`, as checked above.
        Ok(unsafe { self.take_unchecked::<T>() })
    }
}
