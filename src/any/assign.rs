//! Cloning, copy-assignment and relocation.
//!
//! Moving an [`Any`] with a plain Rust move never fails and never touches the
//! held value. The explicit relocation methods here exist for moving a value
//! out of a container that stays in place, which leaves the source empty.
//!
//! Copy-assignment ([`Clone::clone_from`]) follows the exception guarantee
//! of the container:
//!
//! | Guarantee       | Algorithm                              | Target after a panicking clone |
//! |-----------------|----------------------------------------|--------------------------------|
//! | [`Strong`]      | clone into a temporary, then replace   | unchanged                      |
//! | [`Basic`]       | destroy, then clone in place           | empty                          |
//! | [`NoGuarantee`] | same as [`Basic`]                      | unspecified, memory-safe       |
//!
//! Assigning a container to itself is rejected by the borrow checker, so it
//! needs no special handling.
//!
//! [`Strong`]: crate::markers::Strong
//! [`Basic`]: crate::markers::Basic
//! [`NoGuarantee`]: crate::markers::NoGuarantee

use woid_internals::allocator::Allocator;

use crate::{
    Any,
    markers::{CastCheck, CopyPolicy, Copyable, ExceptionGuarantee, GuaranteeLevel, ManagerLayout},
};

impl<S, C, G, L, K, A> Any<S, C, G, L, K, A>
where
    C: CopyPolicy,
    G: ExceptionGuarantee,
    L: ManagerLayout,
    K: CastCheck,
    A: Allocator,
{
    /// Moves the held value into a new container, leaving `self` empty.
    ///
    /// ```
    /// use woid::{Any, space::S1};
    ///
    /// let mut source: Any<S1> = Any::new(String::from("moved"));
    /// let target = source.take();
    /// assert!(source.is_empty());
    /// assert!(target.is::<String>());
    /// ```
    #[inline]
    #[must_use]
    pub fn take(&mut self) -> Self {
        Self::from_raw_storage(self.raw.take())
    }

    /// Destroys the held value and moves the value of `source` in, leaving
    /// `source` empty.
    ///
    /// If `source` is empty, `self` ends up empty as well.
    #[inline]
    pub fn move_from(&mut self, source: &mut Self) {
        self.raw.relocate_from(&mut source.raw);
    }
}

impl<S, G, L, K, A> Clone for Any<S, Copyable, G, L, K, A>
where
    G: ExceptionGuarantee,
    L: ManagerLayout,
    K: CastCheck,
    A: Allocator,
{
    /// Returns a container holding a clone of the held value.
    ///
    /// The clone never shares storage with the original. If the value's
    /// [`Clone`] panics, nothing leaks and `self` is untouched.
    #[inline]
    fn clone(&self) -> Self {
        Self::from_raw_storage(self.raw.duplicate())
    }

    /// Replaces the held value with a clone of the value held by `source`,
    /// following the container's exception guarantee.
    #[inline]
    fn clone_from(&mut self, source: &Self) {
        match G::LEVEL {
            GuaranteeLevel::Strong => *self = source.clone(),
            GuaranteeLevel::Basic | GuaranteeLevel::None => source.raw.duplicate_into(&mut self.raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::{rc::Rc, string::String};
    use core::{cell::Cell, ptr::NonNull};
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use woid_internals::allocator::Global;

    use super::*;
    use crate::{
        any::tests::Counted,
        markers::{Basic, Checked, Combined, MoveOnly, NoGuarantee, Split, Strong, Unchecked},
        space::{S1, S4},
    };

    /// Panics whenever it is cloned.
    struct Bomb(#[allow(dead_code)] u64);

    impl Clone for Bomb {
        fn clone(&self) -> Self {
            panic!("bomb went off");
        }
    }

    #[test]
    fn test_clone_does_not_alias() {
        let drops = Rc::new(Cell::new(0));
        let original: Any<S1, Copyable, NoGuarantee, Combined, Checked> =
            Any::new(Counted::new(&drops));
        let copy = original.clone();

        let first = original.downcast_ref::<Counted>().unwrap();
        let second = copy.downcast_ref::<Counted>().unwrap();
        assert!(!core::ptr::eq(first, second));
        assert_eq!(first.payload, second.payload);
        assert_eq!(Rc::strong_count(&drops), 3);

        drop(original);
        drop(copy);
        assert_eq!(drops.get(), 2);
    }

    #[test]
    fn test_clone_from_replaces_value() {
        let drops = Rc::new(Cell::new(0));
        let source: Any<S4, Copyable, Basic, Split, Checked> = Any::new(Counted::new(&drops));
        let mut target: Any<S4, Copyable, Basic, Split, Checked> = Any::new(5_u64);

        target.clone_from(&source);
        assert_eq!(target.downcast_ref::<Counted>().unwrap().payload, [13; 15]);

        let mut empty = Any::default();
        empty.clone_from(&target);
        assert!(empty.is::<Counted>());
    }

    #[test]
    fn test_clone_from_empty_source_empties_target() {
        let source: Any<S1, Copyable, Strong> = Any::default();
        let mut target: Any<S1, Copyable, Strong> = Any::new(1_u8);
        target.clone_from(&source);
        assert!(target.is_empty());
    }

    #[test]
    fn test_strong_clone_from_keeps_target_on_panic() {
        let source: Any<S1, Copyable, Strong, Combined, Checked> = Any::new(Bomb(1));
        let mut target: Any<S1, Copyable, Strong, Combined, Checked> = Any::new(123_i32);

        let result = catch_unwind(AssertUnwindSafe(|| target.clone_from(&source)));
        assert!(result.is_err());
        assert_eq!(target.downcast_ref::<i32>(), Ok(&123));
    }

    #[test]
    fn test_basic_clone_from_empties_target_on_panic() {
        let drops = Rc::new(Cell::new(0));
        let source: Any<S1, Copyable, Basic> = Any::new(Bomb(1));
        let mut target: Any<S1, Copyable, Basic> = Any::new(Counted::new(&drops));

        let result = catch_unwind(AssertUnwindSafe(|| target.clone_from(&source)));
        assert!(result.is_err());
        assert!(target.is_empty());
        assert_eq!(drops.get(), 1);
        assert!(!source.is_empty());
    }

    #[test]
    fn test_panicking_clone_leaks_nothing() {
        type Value = Any<S1, Copyable, Strong, Combined, Checked, Instrumented>;

        let source: Any<S1, Copyable, NoGuarantee> = Any::new(Bomb(1));
        let result = catch_unwind(AssertUnwindSafe(|| source.clone()));
        assert!(result.is_err());

        let heap_source = Value::new([Bomb(1), Bomb(2)]);
        assert!(heap_source.is_heap());
        assert_eq!(live(), 1);
        let result = catch_unwind(AssertUnwindSafe(|| heap_source.clone()));
        assert!(result.is_err());
        assert_eq!(live(), 1);
        assert!(heap_source.is::<[Bomb; 2]>());

        drop(heap_source);
        assert_eq!(live(), 0);
    }

    #[test]
    fn test_no_guarantee_clone_from_panic_stays_sound() {
        type Value = Any<S1, Copyable, NoGuarantee, Combined, Checked, Instrumented>;

        let drops = Rc::new(Cell::new(0));
        let source = Value::new([Bomb(3), Bomb(4)]);
        let mut target = Value::new(Counted::new(&drops));
        assert_eq!(live(), 2);

        let result = catch_unwind(AssertUnwindSafe(|| target.clone_from(&source)));
        assert!(result.is_err());
        assert_eq!(drops.get(), 1);
        assert!(target.is_empty());
        assert_eq!(live(), 1);

        // Still usable after the failed assignment.
        target = Value::new(7_u8);
        assert_eq!(target.downcast_ref::<u8>(), Ok(&7));
        drop(source);
        assert_eq!(live(), 0);
    }

    #[test]
    fn test_move_from() {
        let drops = Rc::new(Cell::new(0));
        let mut source: Any<S1, MoveOnly> = Any::new(Counted::new(&drops));
        let mut target: Any<S1, MoveOnly> = Any::new(String::from("old"));

        target.move_from(&mut source);
        assert!(source.is_empty());
        assert!(target.is::<Counted>());
        assert_eq!(drops.get(), 0);

        let mut empty = Any::default();
        target.move_from(&mut empty);
        assert!(target.is_empty());
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_take_keeps_heap_allocation() {
        let mut source: Any<S1, MoveOnly, NoGuarantee, Combined, Checked> =
            Any::new(String::from("stay"));
        let before: *const String = source.downcast_ref::<String>().unwrap();
        let target = source.take();
        let after: *const String = target.downcast_ref::<String>().unwrap();
        assert_eq!(before, after);
    }

    /// Forwards to `Global`, counting live allocations of the current thread.
    struct Instrumented;

    std::thread_local! {
        static LIVE: Cell<usize> = const { Cell::new(0) };
    }

    fn live() -> usize {
        LIVE.get()
    }

    // SAFETY: Delegates to `Global`.
    unsafe impl Allocator for Instrumented {
        fn allocate<T>(value: T) -> NonNull<T> {
            LIVE.set(LIVE.get() + 1);
            Global::allocate(value)
        }

        unsafe fn release<T>(ptr: NonNull<T>) {
            LIVE.set(LIVE.get() - 1);
            // SAFETY: Forwarded from the caller.
            unsafe { Global::release(ptr) }
        }
    }

    #[test]
    fn test_move_and_swap_scenario() {
        type Value = Any<S1, MoveOnly, NoGuarantee, Combined, Unchecked, Instrumented>;
        {
            let mut first = Value::new(42_i32);
            let mut second = first.take();
            assert!(first.is_empty());
            // SAFETY: `second` holds an `i32`.
            assert_eq!(unsafe { *second.downcast_ref_unchecked::<i32>() }, 42);

            let mut third = Value::new(String::from("spilled"));
            assert_eq!(live(), 1);
            core::mem::swap(&mut second, &mut third);

            // SAFETY: The types were swapped along with the values.
            unsafe {
                assert_eq!(second.downcast_ref_unchecked::<String>(), "spilled");
                assert_eq!(*third.downcast_ref_unchecked::<i32>(), 42);
            }

            first.move_from(&mut second);
            assert!(second.is_empty());
            assert_eq!(live(), 1);
        }
        assert_eq!(live(), 0);
    }
}
