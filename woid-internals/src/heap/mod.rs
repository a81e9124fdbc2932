//! Always-heap storage.
//!
//! A heap block stores the value together with a pointer to its vtable, so a
//! single thin pointer is enough to destroy, duplicate or identify the value.
//!
//! - [`RawHeap`]: owning pointer to a block
//! - [`HeapBlock`]: `#[repr(C)]` block layout, enabling access to the vtable
//!   through an erased pointer
//! - [`HeapVtable`]: function pointers for the erased block
//!
//! [`HeapBlock`]: data::HeapBlock
//! [`HeapVtable`]: vtable::HeapVtable

pub(crate) mod data;
pub(crate) mod raw;
pub(crate) mod vtable;

pub use self::raw::RawHeap;
