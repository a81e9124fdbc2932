//! Space types fixing the inline capacity of bounded containers.
//!
//! A space type is never instantiated. Its size is the number of bytes a
//! container keeps inline and its alignment is the strictest alignment a value
//! may need to be stored inline. Any type works as a space as long as it can
//! hold a pointer, which the containers check at compile time.
//!
//! ```
//! use woid::{Any, space::{Align16, S1, S2, S4}};
//!
//! // One machine word inline: integers and pointers, but not a `String`.
//! let small: Any<S1> = Any::new(7_u64);
//! assert!(!small.is_heap());
//!
//! let big: Any<S1> = Any::new(String::from("spills"));
//! assert!(big.is_heap());
//!
//! // Four words fit a `String` inline.
//! let wide: Any<S4> = Any::new(String::from("fits"));
//! assert!(!wide.is_heap());
//!
//! // 16-byte aligned space for SIMD-like payloads.
//! #[derive(Clone)]
//! #[repr(align(16))]
//! struct Lanes([f32; 4]);
//! let lanes: Any<Align16<S2>> = Any::new(Lanes([1.0; 4]));
//! assert!(!lanes.is_heap());
//! ```

/// One machine word.
pub type S1 = [usize; 1];

/// Two machine words.
pub type S2 = [usize; 2];

/// Four machine words.
pub type S4 = [usize; 4];

/// Eight machine words.
pub type S8 = [usize; 8];

/// Sixteen machine words.
pub type S16 = [usize; 16];

/// Raises the alignment of the space `S` to 16 bytes.
///
/// The capacity is the size of `S` rounded up to a multiple of 16.
#[derive(Copy, Clone, Debug)]
#[repr(C, align(16))]
pub struct Align16<S>(pub S);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_layout() {
        assert_eq!(size_of::<S1>(), size_of::<usize>());
        assert_eq!(size_of::<S16>(), 16 * size_of::<usize>());
        assert_eq!(align_of::<S4>(), align_of::<usize>());
        assert_eq!(align_of::<Align16<S1>>(), 16);
        assert_eq!(size_of::<Align16<S1>>(), 16);
        assert_eq!(size_of::<Align16<[u8; 17]>>(), 32);
    }
}
