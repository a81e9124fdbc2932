#![no_std]
#![forbid(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::missing_docs_in_private_items,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
#![allow(rustdoc::private_intra_doc_links)]
//! Internal implementation crate for [`woid`].
//!
//! # Overview
//!
//! This crate contains the raw, type-erased storage engines and the unsafe
//! operations behind the [`woid`] containers. Everything here works on
//! pointers to erased bytes plus static descriptors that remember what those
//! bytes are.
//!
//! **This crate is an implementation detail.** No semantic versioning
//! guarantees are provided. Users should depend on the [`woid`] crate, not
//! this one.
//!
//! # Architecture
//!
//! - **[`allocator`]**: the [`Allocator`] plug-in point and the [`Global`]
//!   heap
//! - **[`manager`]**: static memory-manager descriptors in two encodings,
//!   plus the [`BoundType`] record describing a stored type
//! - **[`storage`]**: [`RawStorage`], an inline buffer with heap fallback
//!   driven by a manager
//! - **[`heap`]**: [`RawHeap`], a thin pointer to a `#[repr(C)]` block that
//!   carries its own vtable
//!
//! # Safety Strategy
//!
//! Erasing a type means the compiler can no longer check that the code
//! touching a value matches the value's type. This crate keeps that pairing
//! intact through:
//!
//! - **Module-based encapsulation**: every type whose fields carry a safety
//!   invariant keeps them private to one module, so the invariant can be
//!   checked by reading that single file
//! - **Compile-time pairing**: descriptors and vtables are `&'static`
//!   constants built from the concrete type, and are only reachable through
//!   constructors that take that type as a parameter
//! - **Empty before destroy**: storage is marked empty before any user code
//!   (destructors, clones) runs, so a panic never leaves a destroyed value
//!   reachable
//!
//! [`woid`]: https://docs.rs/woid/latest/woid/
//! [`Allocator`]: allocator::Allocator
//! [`Global`]: allocator::Global
//! [`BoundType`]: manager::BoundType
//! [`RawStorage`]: storage::RawStorage

extern crate alloc;

pub mod allocator;
mod heap;
pub mod manager;
pub mod storage;
mod util;

pub use heap::RawHeap;
pub use util::Erased;
