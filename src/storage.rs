//! The contracts shared by every storage strategy.

use core::{marker::PhantomData, ptr::NonNull};

use crate::markers::{CopyPolicy, StorableFor};

/// A container giving access to one value of an erased type.
///
/// This is what the dispatch machinery of [`Interface`](crate::Interface)
/// builds on: once the caller knows the type of the value, it can reach that
/// value again through a reference.
///
/// Implemented by the owning containers [`Any`](crate::Any),
/// [`HeapAny`](crate::HeapAny) and [`TrivialAny`](crate::TrivialAny), and by
/// the borrowing [`Borrowed`] storage.
pub trait Storage: Sized + 'static {
    /// Returns `true` if the storage holds no value.
    fn is_empty(&self) -> bool;

    /// Accesses the stored value as a `T`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The storage is not empty and holds a `T`.
    unsafe fn get_unchecked<T: 'static>(&self) -> &T;

    /// Mutably accesses the stored value as a `T`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The storage is not empty and holds a `T`.
    /// 2. The storage grants exclusive access to the value.
    unsafe fn get_unchecked_mut<T: 'static>(&mut self) -> &mut T;
}

/// A [`Storage`] that owns its value and can be created from it.
///
/// Any typed wrapper (a callable wrapper, for instance) can build on this
/// contract: construct from a value, then reach the value again once the
/// type is known.
///
/// # Examples
///
/// A minimal callable wrapper over any owning storage:
///
/// ```
/// use woid::{Any, OwningStorage, markers::MoveOnly, space::S2};
///
/// struct Callback<S: OwningStorage> {
///     storage: S,
///     invoke: unsafe fn(&S, u32) -> u32,
/// }
///
/// impl<S: OwningStorage> Callback<S> {
///     fn new<F>(f: F) -> Self
///     where
///         F: Fn(u32) -> u32 + woid::markers::StorableFor<S::Policy>,
///     {
///         unsafe fn invoke<S: OwningStorage, F: Fn(u32) -> u32 + 'static>(storage: &S, x: u32) -> u32 {
///             // SAFETY: `storage` was created from an `F`.
///             unsafe { storage.get_unchecked::<F>()(x) }
///         }
///         Self { storage: S::from_value(f), invoke: invoke::<S, F> }
///     }
///
///     fn call(&self, x: u32) -> u32 {
///         // SAFETY: `invoke` was instantiated with the stored type.
///         unsafe { (self.invoke)(&self.storage, x) }
///     }
/// }
///
/// let offset = 10;
/// let add = Callback::<Any<S2, MoveOnly>>::new(move |x| x + offset);
/// assert_eq!(add.call(5), 15);
/// ```
pub trait OwningStorage: Storage {
    /// The copy policy values must satisfy to be stored.
    type Policy: CopyPolicy;

    /// Creates a storage holding `value`.
    fn from_value<T: StorableFor<Self::Policy>>(value: T) -> Self;
}

/// Storage pointing to a value owned elsewhere.
///
/// There is no public way to create one: it only exists inside
/// [`RefInterface`](crate::interface::RefInterface) and
/// [`MutInterface`](crate::interface::MutInterface), which tie it to the
/// lifetime of the borrow it came from.
#[allow(missing_copy_implementations)]
pub struct Borrowed {
    /// The borrowed value.
    ///
    /// # Safety
    ///
    /// 1. Points to a live value for as long as the owning interface exists.
    /// 2. Was derived from a `&mut` borrow whenever mutable access is used.
    value: NonNull<()>,
    /// Keeps the storage from being `Send` or `Sync`.
    _not_send: PhantomData<*const ()>,
}

impl Borrowed {
    /// Points to a shared borrow.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The storage does not outlive the borrow.
    /// 2. [`Storage::get_unchecked_mut`] is never called on it.
    #[inline]
    pub(crate) unsafe fn from_ref<T>(value: &T) -> Self {
        Self {
            value: NonNull::from(value).cast::<()>(),
            _not_send: PhantomData,
        }
    }

    /// Points to an exclusive borrow.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The storage does not outlive the borrow.
    #[inline]
    pub(crate) unsafe fn from_mut<T>(value: &mut T) -> Self {
        Self {
            value: NonNull::from(value).cast::<()>(),
            _not_send: PhantomData,
        }
    }

    /// Points to the same value as `self`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `self` came from [`from_ref`](Self::from_ref), and the copy obeys
    ///    the same requirements.
    #[inline]
    pub(crate) unsafe fn alias(&self) -> Self {
        Self {
            value: self.value,
            _not_send: PhantomData,
        }
    }
}

impl Storage for Borrowed {
    #[inline]
    fn is_empty(&self) -> bool {
        false
    }

    #[inline]
    unsafe fn get_unchecked<T: 'static>(&self) -> &T {
        // SAFETY: The pointer came from a live borrow of a `T` (guaranteed by the
        // caller and by the constructors).
        unsafe { self.value.cast::<T>().as_ref() }
    }

    #[inline]
    unsafe fn get_unchecked_mut<T: 'static>(&mut self) -> &mut T {
        // SAFETY: The pointer came from a live `&mut T` (guaranteed by the caller
        // and by `from_mut`).
        unsafe { self.value.cast::<T>().as_mut() }
    }
}
