/// Declares zero-sized method keys.
///
/// A key names a method of an interface. Keys carry no data; they are passed
/// to [`Call::call`](crate::Call::call) and
/// [`CallMut::call_mut`](crate::CallMut::call_mut) to select the method, and
/// since every key is its own type the selection happens at compile time.
///
/// # Examples
///
/// ```
/// woid::method_keys! {
///     /// Reads the value.
///     pub Get,
///     /// Writes the value.
///     pub Set,
/// }
///
/// assert_eq!(Get, Get::default());
/// ```
#[macro_export]
macro_rules! method_keys {
    ($($(#[$meta:meta])* $vis:vis $name:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
            $vis struct $name;
        )+
    };
}

/// Declares a method set for [`Interface`](crate::Interface).
///
/// The macro takes the name of a marker type, a trait every bound type must
/// implement, the name of the dispatch table type to generate, and the
/// methods, grouped by receiver:
///
/// - `shared` methods receive the bound value by `&`, and are called with
///   [`Call::call`](crate::Call::call)
/// - `exclusive` methods receive it by `&mut`, and are called with
///   [`CallMut::call_mut`](crate::CallMut::call_mut)
///
/// Each method is declared as `slot: Key(args) -> Output = resolver;`. The
/// `slot` names the table entry and must be unique. `Key` is a method key
/// (see [`method_keys!`]), and the resolver is called with the bound value
/// followed by the arguments. Methods may share a key as long as their
/// receivers or argument types differ; calls pick the entry by key, receiver
/// and argument types. A call with a combination that was never declared,
/// or two declarations of the same combination, fail to compile.
///
/// For a bound type `T` the table holds one thunk per method, each of which
/// recovers the `T` from the storage and invokes the resolver on it.
///
/// # Examples
///
/// ```
/// use woid::{Any, Interface, prelude::*, space::S2};
///
/// trait Shape {
///     fn area(&self) -> f64;
///     fn scale(&mut self, factor: f64);
/// }
///
/// #[derive(Clone)]
/// struct Square(f64);
///
/// impl Shape for Square {
///     fn area(&self) -> f64 {
///         self.0 * self.0
///     }
///
///     fn scale(&mut self, factor: f64) {
///         self.0 *= factor;
///     }
/// }
///
/// woid::method_keys! { Area, Scale }
///
/// woid::interface! {
///     /// Anything with an area.
///     pub interface Shapes: Shape {
///         table ShapeTable;
///         shared {
///             area: Area() -> f64 = Shape::area;
///         }
///         exclusive {
///             scale: Scale(factor: f64) -> () = Shape::scale;
///         }
///     }
/// }
///
/// let mut shape: Interface<Shapes, Any<S2>> = Interface::new(Square(2.0));
/// shape.call_mut(Scale, (1.5,));
/// assert_eq!(shape.call(Area, ()), 9.0);
/// ```
#[macro_export]
macro_rules! interface {
    (
        $(#[$meta:meta])*
        $vis:vis interface $name:ident: $bound:path {
            table $table:ident;
            $(shared {
                $(
                    $shared_slot:ident: $shared_key:ident(
                        $($shared_arg:ident: $shared_ty:ty),* $(,)?
                    ) -> $shared_ret:ty = $shared_resolver:path;
                )*
            })?
            $(exclusive {
                $(
                    $excl_slot:ident: $excl_key:ident(
                        $($excl_arg:ident: $excl_ty:ty),* $(,)?
                    ) -> $excl_ret:ty = $excl_resolver:path;
                )*
            })?
        }
    ) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
        $vis struct $name;

        #[doc = ::core::concat!(
            "Dispatch table of [`",
            ::core::stringify!($name),
            "`] over the storage `ErasedStorage`."
        )]
        $vis struct $table<ErasedStorage> {
            $($(
                $shared_slot: unsafe fn(&ErasedStorage $(, $shared_ty)*) -> $shared_ret,
            )*)?
            $($(
                $excl_slot: unsafe fn(&mut ErasedStorage $(, $excl_ty)*) -> $excl_ret,
            )*)?
            _storage: ::core::marker::PhantomData<fn(&ErasedStorage)>,
        }

        impl<ErasedStorage> ::core::clone::Clone for $table<ErasedStorage> {
            #[inline]
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<ErasedStorage> ::core::marker::Copy for $table<ErasedStorage> {}

        impl<ErasedStorage: $crate::Storage> $table<ErasedStorage> {
            $($(
                /// # Safety
                ///
                /// The storage holds a `BoundValue`.
                unsafe fn $shared_slot<BoundValue: $bound + 'static>(
                    storage: &ErasedStorage
                    $(, $shared_arg: $shared_ty)*
                ) -> $shared_ret {
                    // SAFETY: The storage holds a `BoundValue` (guaranteed by the caller).
                    let value = unsafe {
                        <ErasedStorage as $crate::Storage>::get_unchecked::<BoundValue>(storage)
                    };
                    $shared_resolver(value $(, $shared_arg)*)
                }
            )*)?
            $($(
                /// # Safety
                ///
                /// The storage holds a `BoundValue`.
                unsafe fn $excl_slot<BoundValue: $bound + 'static>(
                    storage: &mut ErasedStorage
                    $(, $excl_arg: $excl_ty)*
                ) -> $excl_ret {
                    // SAFETY: The storage holds a `BoundValue` (guaranteed by the caller).
                    let value = unsafe {
                        <ErasedStorage as $crate::Storage>::get_unchecked_mut::<BoundValue>(storage)
                    };
                    $excl_resolver(value $(, $excl_arg)*)
                }
            )*)?
        }

        impl $crate::interface::MethodSet for $name {
            type Table<ErasedStorage: $crate::Storage> = $table<ErasedStorage>;
        }

        impl<BoundValue: $bound + 'static> $crate::interface::BindTo<BoundValue> for $name {
            #[inline]
            fn table<ErasedStorage: $crate::Storage>() -> $table<ErasedStorage> {
                $table {
                    $($(
                        $shared_slot: $table::<ErasedStorage>::$shared_slot::<BoundValue>,
                    )*)?
                    $($(
                        $excl_slot: $table::<ErasedStorage>::$excl_slot::<BoundValue>,
                    )*)?
                    _storage: ::core::marker::PhantomData,
                }
            }
        }

        $($(
            impl<ErasedStorage: $crate::Storage>
                $crate::interface::SharedEntry<ErasedStorage, $shared_key, ($($shared_ty,)*)>
                for $table<ErasedStorage>
            {
                type Output = $shared_ret;

                #[inline]
                unsafe fn invoke(
                    &self,
                    storage: &ErasedStorage,
                    args: ($($shared_ty,)*),
                ) -> $shared_ret {
                    let ($($shared_arg,)*) = args;
                    // SAFETY: The storage holds the type this table was built for
                    // (guaranteed by the caller).
                    unsafe { (self.$shared_slot)(storage $(, $shared_arg)*) }
                }
            }
        )*)?

        $($(
            impl<ErasedStorage: $crate::Storage>
                $crate::interface::ExclusiveEntry<ErasedStorage, $excl_key, ($($excl_ty,)*)>
                for $table<ErasedStorage>
            {
                type Output = $excl_ret;

                #[inline]
                unsafe fn invoke_mut(
                    &self,
                    storage: &mut ErasedStorage,
                    args: ($($excl_ty,)*),
                ) -> $excl_ret {
                    let ($($excl_arg,)*) = args;
                    // SAFETY: The storage holds the type this table was built for
                    // (guaranteed by the caller).
                    unsafe { (self.$excl_slot)(storage $(, $excl_arg)*) }
                }
            }
        )*)?
    };
}

/// Declares a closed set of types sharing the call syntax of interfaces.
///
/// Instead of erasing the held type, the macro generates an enum with one
/// variant per implementer plus [`From`] impls, and implements
/// [`Call`](crate::Call) and [`CallMut`](crate::CallMut) by matching over
/// the variants. There is no table and no indirect call. The method syntax is
/// the one of [`interface!`].
///
/// # Examples
///
/// ```
/// use woid::prelude::*;
///
/// struct Cat;
/// struct Dog {
///     tricks: u32,
/// }
///
/// trait Pet {
///     fn sound(&self) -> &'static str;
///     fn train(&mut self) {}
/// }
///
/// impl Pet for Cat {
///     fn sound(&self) -> &'static str {
///         "meow"
///     }
/// }
///
/// impl Pet for Dog {
///     fn sound(&self) -> &'static str {
///         "woof"
///     }
///
///     fn train(&mut self) {
///         self.tricks += 1;
///     }
/// }
///
/// woid::method_keys! { Sound, Train }
///
/// woid::sealed_interface! {
///     /// A cat or a dog.
///     pub enum AnyPet {
///         variants { Cat(Cat), Dog(Dog) }
///         shared {
///             sound: Sound() -> &'static str = Pet::sound;
///         }
///         exclusive {
///             train: Train() -> () = Pet::train;
///         }
///     }
/// }
///
/// let mut pet = AnyPet::from(Dog { tricks: 0 });
/// pet.call_mut(Train, ());
/// assert_eq!(pet.call(Sound, ()), "woof");
/// assert!(matches!(pet, AnyPet::Dog(Dog { tricks: 1 })));
/// ```
#[macro_export]
macro_rules! sealed_interface {
    (@enum
        $(#[$meta:meta])*
        $vis:vis $name:ident { $($variant:ident($ty:ty)),* $(,)? }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $(
                #[doc = ::core::concat!("Holds a `", ::core::stringify!($ty), "`.")]
                $variant($ty),
            )*
        }

        $(
            impl ::core::convert::From<$ty> for $name {
                #[inline]
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
    (@dispatch
        $receiver:expr,
        { $($variant:ident($ty:ty)),* $(,)? },
        $resolver:path,
        $args:tt
    ) => {
        match $receiver {
            $(Self::$variant(value) => $crate::sealed_interface!(@call $resolver, value, $args),)*
        }
    };
    (@call $resolver:path, $value:ident, ($($arg:expr),*)) => {
        $resolver($value $(, $arg)*)
    };
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            variants $variants:tt
            $(shared {
                $(
                    $shared_slot:ident: $shared_key:ident(
                        $($shared_arg:ident: $shared_ty:ty),* $(,)?
                    ) -> $shared_ret:ty = $shared_resolver:path;
                )*
            })?
            $(exclusive {
                $(
                    $excl_slot:ident: $excl_key:ident(
                        $($excl_arg:ident: $excl_ty:ty),* $(,)?
                    ) -> $excl_ret:ty = $excl_resolver:path;
                )*
            })?
        }
    ) => {
        $crate::sealed_interface!(@enum $(#[$meta])* $vis $name $variants);

        $($(
            impl $crate::interface::Call<$shared_key, ($($shared_ty,)*)> for $name {
                type Output = $shared_ret;

                #[inline]
                fn call(&self, _key: $shared_key, args: ($($shared_ty,)*)) -> $shared_ret {
                    let ($($shared_arg,)*) = args;
                    $crate::sealed_interface!(
                        @dispatch self, $variants, $shared_resolver, ($($shared_arg),*)
                    )
                }
            }
        )*)?

        $($(
            impl $crate::interface::CallMut<$excl_key, ($($excl_ty,)*)> for $name {
                type Output = $excl_ret;

                #[inline]
                fn call_mut(&mut self, _key: $excl_key, args: ($($excl_ty,)*)) -> $excl_ret {
                    let ($($excl_arg,)*) = args;
                    $crate::sealed_interface!(
                        @dispatch self, $variants, $excl_resolver, ($($excl_arg),*)
                    )
                }
            }
        )*)?
    };
}
