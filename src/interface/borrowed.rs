//! Interfaces over values owned elsewhere.

use core::{fmt, marker::PhantomData};

use crate::{
    interface::{BindTo, Call, CallMut, ExclusiveEntry, Interface, MethodSet, SharedEntry},
    markers::{Dedicated, TableOwnership},
    storage::Borrowed,
};

/// An interface over a shared borrow.
///
/// Binds the method set `I` to a value the caller keeps ownership of. Only
/// `shared` methods can be called, through [`Call`].
///
/// # Examples
///
/// ```
/// use woid::{interface::RefInterface, prelude::*};
///
/// trait Named {
///     fn name(&self) -> &str;
/// }
///
/// struct User(String);
///
/// impl Named for User {
///     fn name(&self) -> &str {
///         &self.0
///     }
/// }
///
/// woid::method_keys! { Name }
///
/// woid::interface! {
///     interface Names: Named {
///         table NameTable;
///         shared {
///             name: Name() -> String = name_of;
///         }
///     }
/// }
///
/// fn name_of<T: Named>(value: &T) -> String {
///     value.name().to_owned()
/// }
///
/// let user = User(String::from("ada"));
/// let named: RefInterface<'_, Names> = RefInterface::new(&user);
/// assert_eq!(named.call(Name, ()), "ada");
/// ```
///
/// The interface cannot outlive the borrow:
///
/// ```compile_fail
/// # use woid::{interface::RefInterface, prelude::*};
/// # trait Named { fn name(&self) -> u8; }
/// # impl Named for u8 { fn name(&self) -> u8 { *self } }
/// # woid::method_keys! { Name }
/// # woid::interface! {
/// #     interface Names: Named { table NameTable; shared { name: Name() -> u8 = Named::name; } }
/// # }
/// let named: RefInterface<'_, Names> = {
///     let value = 1_u8;
///     RefInterface::new(&value)
/// };
/// named.call(Name, ());
/// ```
pub struct RefInterface<'a, I: MethodSet, O: TableOwnership = Dedicated> {
    /// The table and the pointer to the borrowed value.
    inner: Interface<I, Borrowed, O>,
    /// The borrow the pointer came from.
    _borrow: PhantomData<&'a ()>,
}

impl<'a, I: MethodSet, O: TableOwnership> RefInterface<'a, I, O> {
    /// Creates an interface over `value`.
    #[inline]
    pub fn new<T: 'static>(value: &'a T) -> Self
    where
        I: BindTo<T>,
    {
        // SAFETY:
        // 1. The interface holds the storage and is bound to `'a`.
        // 2. Only `Call` is implemented, which never reaches the value mutably.
        let storage = unsafe { Borrowed::from_ref(value) };
        Self {
            inner: Interface::bind::<T>(storage),
            _borrow: PhantomData,
        }
    }

    /// Returns the dispatch table for the borrowed value.
    #[inline]
    pub fn table(&self) -> &I::Table<Borrowed> {
        self.inner.table()
    }
}

impl<I: MethodSet, O: TableOwnership> Clone for RefInterface<'_, I, O> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            inner: Interface {
                table: self.inner.table,
                // SAFETY: Same pointer as `self`, under the same shared borrow.
                storage: unsafe { self.inner.storage.alias() },
            },
            _borrow: PhantomData,
        }
    }
}

impl<I: MethodSet, O: TableOwnership> fmt::Debug for RefInterface<'_, I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefInterface")
            .field("methods", &core::any::type_name::<I>())
            .finish_non_exhaustive()
    }
}

impl<I, O, K, Args> Call<K, Args> for RefInterface<'_, I, O>
where
    I: MethodSet,
    O: TableOwnership,
    I::Table<Borrowed>: SharedEntry<Borrowed, K, Args>,
{
    type Output = <I::Table<Borrowed> as SharedEntry<Borrowed, K, Args>>::Output;

    #[inline]
    fn call(&self, key: K, args: Args) -> Self::Output {
        self.inner.call(key, args)
    }
}

/// An interface over an exclusive borrow.
///
/// Like [`RefInterface`], but `exclusive` methods can be called as well,
/// through [`CallMut`], and they mutate the borrowed value in place.
pub struct MutInterface<'a, I: MethodSet, O: TableOwnership = Dedicated> {
    /// The table and the pointer to the borrowed value.
    inner: Interface<I, Borrowed, O>,
    /// The borrow the pointer came from.
    _borrow: PhantomData<&'a mut ()>,
}

impl<'a, I: MethodSet, O: TableOwnership> MutInterface<'a, I, O> {
    /// Creates an interface over `value`.
    #[inline]
    pub fn new<T: 'static>(value: &'a mut T) -> Self
    where
        I: BindTo<T>,
    {
        // SAFETY: The interface holds the storage and is bound to `'a`.
        let storage = unsafe { Borrowed::from_mut(value) };
        Self {
            inner: Interface::bind::<T>(storage),
            _borrow: PhantomData,
        }
    }

    /// Returns the dispatch table for the borrowed value.
    #[inline]
    pub fn table(&self) -> &I::Table<Borrowed> {
        self.inner.table()
    }
}

impl<I: MethodSet, O: TableOwnership> fmt::Debug for MutInterface<'_, I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutInterface")
            .field("methods", &core::any::type_name::<I>())
            .finish_non_exhaustive()
    }
}

impl<I, O, K, Args> Call<K, Args> for MutInterface<'_, I, O>
where
    I: MethodSet,
    O: TableOwnership,
    I::Table<Borrowed>: SharedEntry<Borrowed, K, Args>,
{
    type Output = <I::Table<Borrowed> as SharedEntry<Borrowed, K, Args>>::Output;

    #[inline]
    fn call(&self, key: K, args: Args) -> Self::Output {
        self.inner.call(key, args)
    }
}

impl<I, O, K, Args> CallMut<K, Args> for MutInterface<'_, I, O>
where
    I: MethodSet,
    O: TableOwnership,
    I::Table<Borrowed>: ExclusiveEntry<Borrowed, K, Args>,
{
    type Output = <I::Table<Borrowed> as ExclusiveEntry<Borrowed, K, Args>>::Output;

    #[inline]
    fn call_mut(&mut self, key: K, args: Args) -> Self::Output {
        self.inner.call_mut(key, args)
    }
}
