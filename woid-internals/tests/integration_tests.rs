//! Integration tests for `woid-internals`.
//!
//! Organized into:
//! - **Lifecycle**: construction, relocation and destruction through both
//!   manager encodings, counted with drop-tracking values
//! - **Duplication**: cloning inline and heap values, and the state left
//!   behind when a clone panics
//! - **Heap blocks**: `RawHeap` identity and ownership transfer
//! - **Allocators**: a counting allocator proving every allocation is
//!   released

extern crate alloc;

use alloc::{rc::Rc, string::String, vec::Vec};
use core::{
    cell::Cell,
    ptr::NonNull,
    sync::atomic::{AtomicUsize, Ordering},
};
use std::panic::{AssertUnwindSafe, catch_unwind};

use woid_internals::{
    RawHeap,
    allocator::{Allocator, Global},
    manager::{
        BoundType, CombinedCopyManager, CombinedManager, CopyManager, Manager, ManagerLayout,
        MoveManager, Placement, SplitCopyManager, SplitManager,
    },
    storage::{Buffer, RawStorage},
};

// ============================================================================
// Test values
// ============================================================================

/// Increments a shared counter when dropped.
struct Tracked {
    drops: Rc<Cell<usize>>,
    payload: [u8; 15],
}

impl Tracked {
    fn new(drops: &Rc<Cell<usize>>) -> Self {
        Self {
            drops: Rc::clone(drops),
            payload: [13; 15],
        }
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        Self::new(&self.drops)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

/// Panics on clone.
struct Bomb(#[allow(dead_code)] u64);

impl Clone for Bomb {
    fn clone(&self) -> Self {
        panic!("bomb went off");
    }
}

/// Forwards to `Global` and counts live allocations.
struct Counting;

static LIVE: AtomicUsize = AtomicUsize::new(0);

// SAFETY: Delegates to `Global`.
unsafe impl Allocator for Counting {
    fn allocate<T>(value: T) -> NonNull<T> {
        LIVE.fetch_add(1, Ordering::SeqCst);
        Global::allocate(value)
    }

    unsafe fn release<T>(ptr: NonNull<T>) {
        LIVE.fetch_sub(1, Ordering::SeqCst);
        // SAFETY: Forwarded from the caller.
        unsafe { Global::release(ptr) }
    }
}

type Word = [usize; 1];
type Wide = [usize; 4];

/// Builds a storage for `value` the way the façade does: inline when it fits,
/// boxed through `A` otherwise.
fn store<S, L: ManagerLayout, T: Clone + 'static, A: Allocator>(
    value: T,
) -> RawStorage<S, L::Copyable> {
    if Buffer::<S>::fits::<T>() {
        // SAFETY: The manager matches and `T` fits.
        unsafe { RawStorage::new_inline(value, <L::Copyable as CopyManager>::inline::<T>()) }
    } else {
        // SAFETY: The manager matches, `T` does not fit, and the buffer holds a
        // pointer.
        unsafe {
            RawStorage::new_boxed::<T, A>(value, <L::Copyable as CopyManager>::boxed::<T, A>())
        }
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

fn lifecycle<L: ManagerLayout>() {
    let drops = Rc::new(Cell::new(0));
    {
        let inline = store::<Wide, L, _, Global>(Tracked::new(&drops));
        let boxed = store::<Word, L, _, Global>(Tracked::new(&drops));
        assert_eq!(inline.bound().map(BoundType::placement), Some(Placement::Inline));
        assert_eq!(boxed.bound().map(BoundType::placement), Some(Placement::Heap));
        assert_eq!(drops.get(), 0);
    }
    assert_eq!(drops.get(), 2);
}

#[test]
fn test_lifecycle_split() {
    lifecycle::<woid_internals::manager::Split>();
}

#[test]
fn test_lifecycle_combined() {
    lifecycle::<woid_internals::manager::Combined>();
}

#[test]
fn test_relocation_runs_no_destructor() {
    let drops = Rc::new(Cell::new(0));
    let mut source = store::<Wide, woid_internals::manager::Split, _, Global>(Tracked::new(&drops));
    let mut target = RawStorage::empty();
    target.relocate_from(&mut source);

    assert!(source.is_empty());
    assert!(!target.is_empty());
    assert_eq!(drops.get(), 0);
    // SAFETY: The storage holds a `Tracked`.
    assert_eq!(unsafe { target.downcast_unchecked::<Tracked>() }.payload, [13; 15]);

    drop(target);
    assert_eq!(drops.get(), 1);
    drop(source);
    assert_eq!(drops.get(), 1);
}

#[test]
fn test_relocate_into_occupied_storage_destroys_old_value() {
    let drops = Rc::new(Cell::new(0));
    let mut source = store::<Word, woid_internals::manager::Combined, _, Global>(7_u32);
    let mut target =
        store::<Word, woid_internals::manager::Combined, _, Global>(Tracked::new(&drops));

    target.relocate_from(&mut source);
    assert_eq!(drops.get(), 1);
    // SAFETY: The storage now holds a `u32`.
    assert_eq!(unsafe { *target.downcast_unchecked::<u32>() }, 7);
}

#[test]
fn test_reset_is_idempotent() {
    let drops = Rc::new(Cell::new(0));
    let mut storage = store::<Wide, woid_internals::manager::Split, _, Global>(Tracked::new(&drops));
    storage.reset();
    storage.reset();
    assert!(storage.is_empty());
    assert_eq!(drops.get(), 1);
}

#[test]
fn test_move_only_managers() {
    // SAFETY: `String` does not fit a word; the manager matches.
    let mut split = unsafe {
        RawStorage::<Word, SplitManager>::new_boxed::<String, Global>(
            String::from("split"),
            <SplitManager as MoveManager>::boxed::<String, Global>(),
        )
    };
    // SAFETY: `u8` fits a word; the manager matches.
    let combined = unsafe {
        RawStorage::<Word, CombinedManager>::new_inline(
            3_u8,
            <CombinedManager as MoveManager>::inline::<u8>(),
        )
    };

    let moved = split.take();
    // SAFETY: The storages hold the requested types.
    unsafe {
        assert_eq!(moved.downcast_unchecked::<String>(), "split");
        assert_eq!(*combined.downcast_unchecked::<u8>(), 3);
    }
}

// ============================================================================
// Duplication
// ============================================================================

#[test]
fn test_duplicate_does_not_alias() {
    let original = store::<Word, woid_internals::manager::Split, _, Global>(String::from("copy"));
    let mut copy = original.duplicate();

    // SAFETY: Both storages hold a `String`.
    unsafe {
        copy.downcast_unchecked_mut::<String>().push('!');
        assert_eq!(original.downcast_unchecked::<String>(), "copy");
        assert_eq!(copy.downcast_unchecked::<String>(), "copy!");
        assert!(!core::ptr::eq(
            original.downcast_unchecked::<String>(),
            copy.downcast_unchecked::<String>()
        ));
    }
}

#[test]
fn test_duplicate_into_replaces_value() {
    let drops = Rc::new(Cell::new(0));
    let source = store::<Wide, woid_internals::manager::Combined, _, Global>(Tracked::new(&drops));
    let mut target = store::<Wide, woid_internals::manager::Combined, _, Global>(5_u64);

    source.duplicate_into(&mut target);
    // SAFETY: The storage holds a `Tracked`.
    assert_eq!(unsafe { target.downcast_unchecked::<Tracked>() }.payload, [13; 15]);
    drop(source);
    drop(target);
    assert_eq!(drops.get(), 2);
}

#[test]
fn test_panicking_duplicate_leaves_target_empty() {
    let drops = Rc::new(Cell::new(0));
    let source = store::<Word, woid_internals::manager::Split, _, Global>(Bomb(1));
    let mut target = store::<Word, woid_internals::manager::Split, _, Global>(Tracked::new(&drops));

    let result = catch_unwind(AssertUnwindSafe(|| source.duplicate_into(&mut target)));
    assert!(result.is_err());
    assert!(target.is_empty());
    assert!(!source.is_empty());
    assert_eq!(drops.get(), 1);
}

#[test]
fn test_split_and_combined_agree() {
    let split = store::<Wide, woid_internals::manager::Split, _, Global>(Vec::from([1, 2, 3]));
    let combined =
        store::<Wide, woid_internals::manager::Combined, _, Global>(Vec::from([1, 2, 3]));

    // SAFETY: Both storages hold a `Vec<i32>`.
    unsafe {
        assert_eq!(
            split.duplicate().downcast_unchecked::<Vec<i32>>(),
            combined.duplicate().downcast_unchecked::<Vec<i32>>()
        );
    }
    assert!(size_of::<CombinedCopyManager>() < size_of::<SplitCopyManager>());
}

// ============================================================================
// Heap blocks
// ============================================================================

#[test]
fn test_raw_heap_identity() {
    let block = RawHeap::new_cloneable::<String, Global>(String::from("block"));
    assert!(block.is::<String>());
    assert!(!block.is::<&str>());
    assert_eq!(block.type_id(), core::any::TypeId::of::<String>());

    let mut copy = block.try_duplicate().expect("cloneable block");
    // SAFETY: The block holds a `String`.
    unsafe { copy.downcast_unchecked_mut::<String>().make_ascii_uppercase() };
    // SAFETY: Both blocks hold a `String`.
    unsafe {
        assert_eq!(block.downcast_unchecked::<String>(), "block");
        assert_eq!(copy.downcast_unchecked::<String>(), "BLOCK");
    }
}

// ============================================================================
// Allocators
// ============================================================================

#[test]
fn test_counting_allocator_is_balanced() {
    {
        let heap = store::<Word, woid_internals::manager::Combined, _, Counting>([7_u64; 4]);
        let copy = heap.duplicate();
        let block = RawHeap::new_cloneable::<[u64; 4], Counting>([1; 4]);
        let block_copy = block.try_duplicate();
        assert_eq!(LIVE.load(Ordering::SeqCst), 4);

        let mut moved = RawStorage::empty();
        let mut copy = copy;
        moved.relocate_from(&mut copy);
        assert_eq!(LIVE.load(Ordering::SeqCst), 4);

        // SAFETY: The storage holds a `[u64; 4]` allocated from `Counting`.
        let value = unsafe { moved.take_unchecked::<[u64; 4], Counting>() };
        assert_eq!(value, [7; 4]);
        assert_eq!(LIVE.load(Ordering::SeqCst), 3);

        drop((heap, block, block_copy));
    }
    assert_eq!(LIVE.load(Ordering::SeqCst), 0);
}

#[test]
fn test_manager_reports_bound_type() {
    let manager = <CombinedCopyManager as CopyManager>::boxed::<String, Global>();
    assert!(manager.bound().is::<String>());
    assert_eq!(manager.bound().placement(), Placement::Heap);
    assert_eq!(manager.bound().size(), size_of::<String>());
}
