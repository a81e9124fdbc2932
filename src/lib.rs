#![cfg_attr(not(feature = "std"), no_std)]
#![deny(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    clippy::as_ptr_cast_mut,
    clippy::ptr_as_ptr,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Extra checks on nightly
#![cfg_attr(nightly_extra_checks, feature(rustdoc_missing_doc_code_examples))]
#![cfg_attr(nightly_extra_checks, forbid(rustdoc::missing_doc_code_examples))]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Policy-driven type erasure for Rust.
//!
//! ## Overview
//!
//! This crate provides containers that own a single value of any type and
//! forget that type, plus a way to call named methods on the erased value
//! without trait objects. Every behavioral choice (copying, failure
//! guarantees, cast checking, allocation, table layout) is a type parameter,
//! so a configuration pays only for what it uses.
//!
//! ## Quick Example
//!
//! ```
//! use woid::{Any, space::S4};
//!
//! let mut value: Any<S4> = Any::new(String::from("hello"));
//! assert!(!value.is_heap());
//!
//! // SAFETY: The container holds a `String`.
//! unsafe { value.downcast_mut_unchecked::<String>().push_str(", world") };
//! let copy = value.clone();
//! // SAFETY: The clone holds a `String` too.
//! assert_eq!(unsafe { copy.downcast_ref_unchecked::<String>() }, "hello, world");
//! ```
//!
//! ## Containers
//!
//! - **[`Any`]**: stores the value inline in a buffer of the chosen
//!   [`space`], or in an allocation when it does not fit. The memory manager
//!   is a static descriptor, so the container is one buffer plus one pointer.
//! - **[`HeapAny`]**: always allocates. Pointer-sized; the allocation carries
//!   its own vtable.
//! - **[`TrivialAny`]**: keeps values inline only when they need no destructor,
//!   so moving the container is a byte copy and dropping an inline value does
//!   nothing.
//!
//! All three implement [`OwningStorage`], on top of [`Storage`], the contract
//! the dispatch machinery builds on. Interfaces can also borrow a value
//! instead of owning it, see [`RefInterface`](interface::RefInterface) and
//! [`MutInterface`](interface::MutInterface).
//!
//! ## Policies
//!
//! The marker types in [`markers`] select:
//!
//! - the copy policy: [`Copyable`](markers::Copyable) containers are
//!   [`Clone`] and only accept [`Clone`] values
//! - the exception guarantee of [`Clone::clone_from`], with panics standing in
//!   for exceptions
//! - whether checked extraction, reporting [`BadAnyCast`], is available
//! - the manager layout: one function pointer taking an operation tag, or one
//!   per operation
//!
//! The allocator is an [`Allocator`] type parameter defaulting to [`Global`].
//! With the `std` feature the crate also ships [`Arena`], a per-thread bump
//! allocator.
//!
//! ## Interfaces
//!
//! [`interface!`] declares a set of methods keyed by the zero-sized types of
//! [`method_keys!`]. [`Interface`] binds a value to the dispatch table of
//! such a set, and [`Call`]/[`CallMut`] route calls through it:
//!
//! ```
//! use woid::{Interface, TrivialAny, markers::Shared, prelude::*};
//!
//! woid::method_keys! { Len, Push }
//!
//! trait Stack {
//!     fn len(&self) -> usize;
//!     fn push(&mut self, item: u8);
//! }
//!
//! impl Stack for Vec<u8> {
//!     fn len(&self) -> usize {
//!         Vec::len(self)
//!     }
//!
//!     fn push(&mut self, item: u8) {
//!         Vec::push(self, item);
//!     }
//! }
//!
//! woid::interface! {
//!     pub interface Stacks: Stack {
//!         table StackTable;
//!         shared {
//!             len: Len() -> usize = Stack::len;
//!         }
//!         exclusive {
//!             push: Push(item: u8) -> () = Stack::push;
//!         }
//!     }
//! }
//!
//! let mut stack: Interface<Stacks, TrivialAny, Shared> = Interface::new(vec![1_u8]);
//! stack.call_mut(Push, (2,));
//! assert_eq!(stack.call(Len, ()), 2);
//! ```
//!
//! When the set of types is closed, [`sealed_interface!`] generates an enum
//! with the same call syntax and no indirection.
//!
//! ## Features
//!
//! - `std` (default): the [`Arena`] allocator and `std` locks for the shared
//!   table registry; without it the crate is `no_std` + `alloc`
//! - `tracing`: debug events for shared table registration and arena
//!   lifecycle, through the [`tracing`] crate
//!
//! For implementation details, see the [`woid-internals`] crate.
//!
//! [`woid-internals`]: woid_internals
//! [`tracing`]: https://docs.rs/tracing

extern crate alloc;

#[macro_use]
mod macros;

pub mod interface;
pub mod markers;
pub mod prelude;
pub mod space;

mod any;
#[cfg(feature = "std")]
mod arena;
mod error;
mod heap;
mod storage;
mod trivial;

#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
pub use self::arena::Arena;
pub use self::{
    any::Any,
    error::BadAnyCast,
    heap::HeapAny,
    interface::{Call, CallMut, Interface},
    storage::{OwningStorage, Storage},
    trivial::TrivialAny,
};
pub use woid_internals::{
    allocator::{Allocator, Global},
    manager::{BoundType, Placement},
};
