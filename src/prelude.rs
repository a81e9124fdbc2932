//! Commonly used items for convenient importing.
//!
//! The prelude re-exports the containers, the call traits needed to invoke
//! interface methods, and the [`markers`] module, so a single use statement
//! is enough for most code.
//!
//! # Usage
//!
//! ```rust
//! use woid::prelude::*;
//!
//! let value: Any<space::S1, markers::MoveOnly> = Any::new(7_u16);
//! // SAFETY: The container holds a `u16`.
//! assert_eq!(unsafe { *value.downcast_ref_unchecked::<u16>() }, 7);
//! ```
//!
//! The call traits have to be in scope for `.call(..)` and `.call_mut(..)`
//! to resolve on an [`Interface`] or a sealed interface.

pub use crate::{
    Any, Call, CallMut, HeapAny, Interface, OwningStorage, Storage, TrivialAny,
    interface::{MutInterface, RefInterface},
    markers, space,
};
