//! Named-method dispatch over erased storage.
//!
//! A method set, declared with [`interface!`](crate::interface!), lists
//! methods by key, receiver and argument types. Binding a concrete type to
//! the set produces a dispatch table with one thunk per method.
//! [`Interface`] pairs such a table with a [`Storage`] holding the value, and
//! the [`Call`]/[`CallMut`] traits route a call through the table.
//!
//! How an interface owns its table is chosen with a
//! [`TableOwnership`] marker:
//!
//! - [`Dedicated`]: the table is embedded in every instance
//! - [`Shared`](crate::markers::Shared): instances point to one table per
//!   bound type, kept in a process-wide registry
//!
//! For a closed set of types, [`sealed_interface!`](crate::sealed_interface!)
//! replaces the table with an enum and a `match`, keeping the same call
//! syntax.

mod borrowed;
pub(crate) mod registry;

use core::fmt;

pub use self::borrowed::{MutInterface, RefInterface};
pub use crate::storage::Borrowed;
use crate::{
    OwningStorage, Storage,
    markers::{Dedicated, StorableFor, TableOwnership},
};

/// A table of thunks, copied into or referenced by interface instances.
///
/// Blanket-implemented for every type with the required properties; tables
/// generated by [`interface!`](crate::interface!) hold only function
/// pointers and always qualify.
pub trait DispatchTable: Copy + Send + Sync + 'static {}

impl<T: Copy + Send + Sync + 'static> DispatchTable for T {}

/// A set of methods, implemented by the marker types generated with
/// [`interface!`](crate::interface!).
pub trait MethodSet: 'static {
    /// The dispatch table of this set over the storage `S`.
    type Table<S: Storage>: DispatchTable;
}

/// Builds the dispatch table of a method set for the bound type `T`.
pub trait BindTo<T>: MethodSet {
    /// Returns the table whose thunks treat the storage as holding a `T`.
    fn table<S: Storage>() -> Self::Table<S>;
}

/// A table entry for the method keyed `K` taking `Args`, called with a
/// shared receiver.
pub trait SharedEntry<S, K, Args> {
    /// The result of the method.
    type Output;

    /// Calls the method on the value held by `storage`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `storage` holds a value of the type this table was built for.
    unsafe fn invoke(&self, storage: &S, args: Args) -> Self::Output;
}

/// A table entry for the method keyed `K` taking `Args`, called with an
/// exclusive receiver.
pub trait ExclusiveEntry<S, K, Args> {
    /// The result of the method.
    type Output;

    /// Calls the method on the value held by `storage`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `storage` holds a value of the type this table was built for.
    unsafe fn invoke_mut(&self, storage: &mut S, args: Args) -> Self::Output;
}

/// Calls the method keyed `K` with a shared receiver.
///
/// `Args` is the tuple of arguments; the key and the argument types together
/// select the method.
pub trait Call<K, Args> {
    /// The result of the method.
    type Output;

    /// Calls the method.
    fn call(&self, key: K, args: Args) -> Self::Output;
}

/// Calls the method keyed `K` with an exclusive receiver.
pub trait CallMut<K, Args> {
    /// The result of the method.
    type Output;

    /// Calls the method.
    fn call_mut(&mut self, key: K, args: Args) -> Self::Output;
}

/// A value of an erased type together with the dispatch table of the method
/// set `I` for that type.
///
/// The storage and the table are always bound together, in
/// [`new`](Interface::new) and [`replace`](Interface::replace), so the table
/// in effect always matches the held value. An interface is never empty.
///
/// Copy behavior comes from the storage: an interface is [`Clone`] when its
/// storage is. [`Clone::clone_from`] always clones first and then replaces,
/// whatever the guarantee of the storage.
///
/// # Examples
///
/// ```
/// use woid::{HeapAny, Interface, markers::Shared, prelude::*};
///
/// trait Greeter {
///     fn greet(&self, name: &str) -> String;
/// }
///
/// #[derive(Clone)]
/// struct English;
///
/// impl Greeter for English {
///     fn greet(&self, name: &str) -> String {
///         format!("Hello, {name}!")
///     }
/// }
///
/// woid::method_keys! { Greet }
///
/// woid::interface! {
///     pub interface Greeters: Greeter {
///         table GreeterTable;
///         shared {
///             greet: Greet(name: &str) -> String = Greeter::greet;
///         }
///     }
/// }
///
/// let greeter: Interface<Greeters, HeapAny, Shared> = Interface::new(English);
/// assert_eq!(greeter.call(Greet, ("Ada",)), "Hello, Ada!");
/// ```
pub struct Interface<I: MethodSet, S: Storage, O: TableOwnership = Dedicated> {
    /// The table for the type held by `storage`.
    table: O::Handle<I::Table<S>>,
    /// The value.
    storage: S,
}

impl<I: MethodSet, S: Storage, O: TableOwnership> Interface<I, S, O> {
    /// Pairs `storage`, which must hold a `T`, with the table for `T`.
    #[inline]
    fn bind<T: 'static>(storage: S) -> Self
    where
        I: BindTo<T>,
    {
        Self {
            table: O::bind::<I::Table<S>, T>(<I as BindTo<T>>::table::<S>),
            storage,
        }
    }

    /// Returns the storage holding the value.
    #[inline]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Returns the storage, dropping the table.
    #[inline]
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Returns the dispatch table for the held value.
    #[inline]
    pub fn table(&self) -> &I::Table<S> {
        O::resolve(&self.table)
    }
}

impl<I: MethodSet, S: OwningStorage, O: TableOwnership> Interface<I, S, O> {
    /// Creates an interface holding `value`.
    #[inline]
    pub fn new<T>(value: T) -> Self
    where
        I: BindTo<T>,
        T: StorableFor<S::Policy>,
    {
        Self::bind::<T>(S::from_value(value))
    }

    /// Replaces the held value, and the table along with it.
    #[inline]
    pub fn replace<T>(&mut self, value: T)
    where
        I: BindTo<T>,
        T: StorableFor<S::Policy>,
    {
        *self = Self::new(value);
    }
}

impl<I, S, O> Clone for Interface<I, S, O>
where
    I: MethodSet,
    S: Storage + Clone,
    O: TableOwnership,
{
    #[inline]
    fn clone(&self) -> Self {
        Self {
            table: self.table,
            storage: self.storage.clone(),
        }
    }
}

impl<I: MethodSet, S: Storage, O: TableOwnership> fmt::Debug for Interface<I, S, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interface")
            .field("methods", &core::any::type_name::<I>())
            .finish_non_exhaustive()
    }
}

impl<I, S, O, K, Args> Call<K, Args> for Interface<I, S, O>
where
    I: MethodSet,
    S: Storage,
    O: TableOwnership,
    I::Table<S>: SharedEntry<S, K, Args>,
{
    type Output = <I::Table<S> as SharedEntry<S, K, Args>>::Output;

    #[inline]
    fn call(&self, _key: K, args: Args) -> Self::Output {
        let table = O::resolve(&self.table);
        // SAFETY: The table and the storage were bound together for the same type,
        // and the storage is never emptied while the interface exists.
        unsafe { table.invoke(&self.storage, args) }
    }
}

impl<I, S, O, K, Args> CallMut<K, Args> for Interface<I, S, O>
where
    I: MethodSet,
    S: Storage,
    O: TableOwnership,
    I::Table<S>: ExclusiveEntry<S, K, Args>,
{
    type Output = <I::Table<S> as ExclusiveEntry<S, K, Args>>::Output;

    #[inline]
    fn call_mut(&mut self, _key: K, args: Args) -> Self::Output {
        let table = O::resolve(&self.table);
        // SAFETY: The table and the storage were bound together for the same type,
        // and the storage is never emptied while the interface exists.
        unsafe { table.invoke_mut(&mut self.storage, args) }
    }
}

#[cfg(test)]
mod tests {
    use alloc::{string::String, vec::Vec};

    use super::*;
    use crate::{
        Any, HeapAny, TrivialAny,
        markers::{MoveOnly, Shared},
        space::{S1, S4},
    };

    trait Tally {
        fn get(&self) -> usize;
        fn set(&mut self, value: usize);
        fn inc(&mut self);
    }

    /// Fits every inline buffer.
    #[derive(Clone, Debug, PartialEq)]
    struct Small(usize);

    impl Tally for Small {
        fn get(&self) -> usize {
            self.0
        }

        fn set(&mut self, value: usize) {
            self.0 = value;
        }

        fn inc(&mut self) {
            self.0 += 1;
        }
    }

    /// Keeps a history, so it lives on the heap.
    #[derive(Clone, Debug, PartialEq)]
    struct Logged {
        history: Vec<usize>,
        label: String,
    }

    impl Tally for Logged {
        fn get(&self) -> usize {
            self.history.last().copied().unwrap_or(0)
        }

        fn set(&mut self, value: usize) {
            self.history.push(value);
        }

        fn inc(&mut self) {
            self.set(self.get() + 1);
        }
    }

    fn twice<T: Tally>(value: &T, factor: usize) -> usize {
        value.get() * factor
    }

    crate::method_keys! { Get, Set, Inc, Twice }

    crate::interface! {
        interface Counter: Tally {
            table CounterTable;
            shared {
                get: Get() -> usize = Tally::get;
                twice: Twice(factor: usize) -> usize = twice;
            }
            exclusive {
                set: Set(to: usize) -> () = Tally::set;
                inc: Inc() -> () = Tally::inc;
            }
        }
    }

    crate::sealed_interface! {
        enum SealedCounter {
            variants { Small(Small), Logged(Logged) }
            shared {
                get: Get() -> usize = Tally::get;
                twice: Twice(factor: usize) -> usize = twice;
            }
            exclusive {
                set: Set(to: usize) -> () = Tally::set;
                inc: Inc() -> () = Tally::inc;
            }
        }
    }

    fn logged() -> Logged {
        Logged {
            history: Vec::new(),
            label: String::from("log"),
        }
    }

    /// Runs the same calls against anything callable as a counter.
    fn exercise<C>(counter: &mut C) -> (usize, usize)
    where
        C: Call<Get, (), Output = usize>
            + Call<Twice, (usize,), Output = usize>
            + CallMut<Set, (usize,), Output = ()>
            + CallMut<Inc, (), Output = ()>,
    {
        counter.call_mut(Set, (3,));
        counter.call_mut(Inc, ());
        (counter.call(Get, ()), counter.call(Twice, (10,)))
    }

    #[test]
    fn test_calls_through_every_storage() {
        let mut inline: Interface<Counter, Any<S4>> = Interface::new(Small(0));
        let mut spilled: Interface<Counter, Any<S1, MoveOnly>> = Interface::new(logged());
        let mut heap: Interface<Counter, HeapAny> = Interface::new(Small(0));
        let mut trivial: Interface<Counter, TrivialAny> = Interface::new(logged());

        assert_eq!(exercise(&mut inline), (4, 40));
        assert_eq!(exercise(&mut spilled), (4, 40));
        assert_eq!(exercise(&mut heap), (4, 40));
        assert_eq!(exercise(&mut trivial), (4, 40));

        assert!(spilled.storage().is_heap());
        assert!(trivial.storage().is_heap());
    }

    #[test]
    fn test_dedicated_and_shared_dispatch_agree() {
        let mut dedicated: Interface<Counter, Any<S4>, Dedicated> = Interface::new(logged());
        let mut shared: Interface<Counter, Any<S4>, Shared> = Interface::new(logged());
        let mut sealed = SealedCounter::from(logged());

        assert_eq!(exercise(&mut dedicated), exercise(&mut shared));
        assert_eq!(exercise(&mut shared), exercise(&mut sealed));

        let dedicated = dedicated.into_storage();
        let shared = shared.into_storage();
        // SAFETY: Both storages hold a `Logged`.
        unsafe {
            assert_eq!(
                dedicated.downcast_ref_unchecked::<Logged>().history,
                [3, 4]
            );
            assert_eq!(
                shared.downcast_ref_unchecked::<Logged>().history,
                [3, 4, 3, 4]
            );
        }
        let SealedCounter::Logged(sealed) = sealed else {
            panic!("the sealed counter changed variant");
        };
        assert_eq!(sealed.history, [3, 4]);
        assert_eq!(sealed.label, "log");
    }

    #[test]
    fn test_shared_tables_are_reused() {
        type SharedCounter = Interface<Counter, HeapAny, Shared>;

        let first = SharedCounter::new(Small(1));
        let second = SharedCounter::new(Small(2));
        let other = SharedCounter::new(logged());
        assert!(core::ptr::eq(first.table(), second.table()));
        assert!(!core::ptr::eq(first.table(), other.table()));

        let here = core::ptr::from_ref(first.table()).addr();
        let there = std::thread::spawn(|| {
            let remote = SharedCounter::new(Small(3));
            core::ptr::from_ref(remote.table()).addr()
        })
        .join()
        .unwrap();
        assert_eq!(here, there);

        assert_eq!(size_of::<SharedCounter>(), 2 * size_of::<usize>());
        assert_eq!(
            size_of::<Interface<Counter, HeapAny>>(),
            5 * size_of::<usize>()
        );
    }

    #[test]
    fn test_replace_rebinds_table() {
        let mut counter: Interface<Counter, Any<S4>> = Interface::new(Small(8));
        assert_eq!(counter.call(Get, ()), 8);

        counter.replace(logged());
        assert_eq!(counter.call(Get, ()), 0);
        counter.call_mut(Set, (5,));
        assert_eq!(counter.call(Get, ()), 5);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut original: Interface<Counter, Any<S1>> = Interface::new(logged());
        original.call_mut(Set, (1,));
        let mut copy = original.clone();
        copy.call_mut(Inc, ());
        assert_eq!(original.call(Get, ()), 1);
        assert_eq!(copy.call(Get, ()), 2);

        let mut target: Interface<Counter, Any<S1>> = Interface::new(Small(0));
        target.clone_from(&copy);
        assert_eq!(target.call(Get, ()), 2);
    }

    trait Inspect {
        fn read(&self) -> &'static str;
        fn read_mut(&mut self) -> &'static str;
        fn is_int_i32(&self, value: i32) -> bool;
        fn is_int_f32(&self, value: f32) -> bool;
        fn add_to(&self, target: &mut i32);
        fn add_from(&mut self, source: &i32);
        fn total(&self) -> i32;
    }

    #[derive(Clone, Default)]
    struct Gadget {
        total: i32,
    }

    impl Inspect for Gadget {
        fn read(&self) -> &'static str {
            "shared"
        }

        fn read_mut(&mut self) -> &'static str {
            "exclusive"
        }

        fn is_int_i32(&self, _value: i32) -> bool {
            true
        }

        fn is_int_f32(&self, _value: f32) -> bool {
            false
        }

        fn add_to(&self, target: &mut i32) {
            *target += self.total;
        }

        fn add_from(&mut self, source: &i32) {
            self.total += *source;
        }

        fn total(&self) -> i32 {
            self.total
        }
    }

    crate::method_keys! { Read, IsInt, AddAll, Total }

    crate::interface! {
        interface Gadgets: Inspect {
            table GadgetTable;
            shared {
                read: Read() -> &'static str = Inspect::read;
                is_int_i32: IsInt(sample: i32) -> bool = Inspect::is_int_i32;
                is_int_f32: IsInt(sample: f32) -> bool = Inspect::is_int_f32;
                add_to: AddAll(target: &mut i32) -> () = Inspect::add_to;
                total: Total() -> i32 = Inspect::total;
            }
            exclusive {
                read_mut: Read() -> &'static str = Inspect::read_mut;
                add_from: AddAll(source: &i32) -> () = Inspect::add_from;
            }
        }
    }

    #[test]
    fn test_overloads_by_receiver_and_arguments() {
        let mut gadget: Interface<Gadgets, Any<S1>, Shared> = Interface::new(Gadget::default());

        assert_eq!(gadget.call(Read, ()), "shared");
        assert_eq!(gadget.call_mut(Read, ()), "exclusive");
        assert!(gadget.call(IsInt, (1_i32,)));
        assert!(!gadget.call(IsInt, (1.0_f32,)));

        let amount = 5;
        gadget.call_mut(AddAll, (&amount,));
        gadget.call_mut(AddAll, (&amount,));
        let mut sum = 1;
        gadget.call(AddAll, (&mut sum,));
        assert_eq!(sum, 11);
        assert_eq!(gadget.call(Total, ()), 10);
    }

    /// Reads the same value whatever happens to it.
    struct Fixed;

    impl Tally for Fixed {
        fn get(&self) -> usize {
            7
        }

        fn set(&mut self, _value: usize) {}

        fn inc(&mut self) {}
    }

    fn scaled<T: Tally>(value: &T, factor: usize, offset: usize) -> usize {
        value.get() * factor + offset
    }

    crate::method_keys! { Scale }

    crate::sealed_interface! {
        enum Reading {
            variants { Small(Small), Logged(Logged), Fixed(Fixed) }
            shared {
                get: Get() -> usize = Tally::get;
                scaled: Scale(factor: usize, offset: usize) -> usize = scaled;
            }
            exclusive {
                set: Set(to: usize) -> () = Tally::set;
            }
        }
    }

    #[test]
    fn test_sealed_dispatch_with_any_argument_count() {
        let mut readings = [
            Reading::from(Small(2)),
            Reading::from(logged()),
            Reading::from(Fixed),
        ];
        for reading in &mut readings {
            reading.call_mut(Set, (3,));
        }

        let got: Vec<usize> = readings.iter().map(|r| r.call(Get, ())).collect();
        assert_eq!(got, [3, 3, 7]);
        let got: Vec<usize> = readings.iter().map(|r| r.call(Scale, (10, 1))).collect();
        assert_eq!(got, [31, 31, 71]);
    }

    #[test]
    fn test_borrowed_interfaces_reach_the_original() {
        let mut small = Small(2);
        {
            let view: RefInterface<'_, Counter> = RefInterface::new(&small);
            assert_eq!(view.call(Get, ()), 2);
            assert_eq!(view.clone().call(Twice, (3,)), 6);
        }
        {
            let mut edit: MutInterface<'_, Counter, Shared> = MutInterface::new(&mut small);
            assert_eq!(exercise(&mut edit), (4, 40));
        }
        assert_eq!(small, Small(4));

        let mut log = logged();
        MutInterface::<Counter>::new(&mut log).call_mut(Set, (9,));
        assert_eq!(log.history, [9]);
        assert_eq!(log.label, "log");
    }

    #[test]
    fn test_borrowed_and_owned_dispatch_agree() {
        let mut borrowed = logged();
        let mut owned: Interface<Counter, HeapAny, Shared> = Interface::new(logged());

        let through_borrow = exercise(&mut MutInterface::<Counter, Shared>::new(&mut borrowed));
        assert_eq!(through_borrow, exercise(&mut owned));
        // SAFETY: The storage holds a `Logged`.
        let owned = unsafe { owned.storage().downcast_ref_unchecked::<Logged>() };
        assert_eq!(borrowed, *owned);
    }

    static_assertions::assert_not_impl_any!(RefInterface<'static, Counter>: Send, Sync);
    static_assertions::assert_impl_all!(RefInterface<'static, Counter>: Clone);
    static_assertions::assert_not_impl_any!(MutInterface<'static, Counter>: Send, Sync, Clone);
    static_assertions::assert_not_impl_any!(Interface<Counter, Any>: Send, Sync);
    static_assertions::assert_impl_all!(Interface<Counter, Any>: Clone);
    static_assertions::assert_not_impl_any!(Interface<Counter, Any<S1, MoveOnly>>: Clone);
}
