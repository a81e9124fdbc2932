//! Bounded inline storage with heap fallback.
//!
//! - [`Buffer`]: uninitialized bytes shaped like a space type `S`
//! - [`RawStorage`]: a buffer paired with the manager of the value it holds

mod buffer;
mod raw;

pub use self::{buffer::Buffer, raw::RawStorage};
