//! Arena chunks of finished threads go back to the process allocator.

use std::{
    alloc::{GlobalAlloc, Layout, System},
    sync::atomic::{AtomicUsize, Ordering},
    thread,
};

use woid::{
    Any, Arena,
    markers::{Checked, Combined, MoveOnly, NoGuarantee},
    space::S1,
};

/// Bytes currently allocated through the global allocator.
static LIVE: AtomicUsize = AtomicUsize::new(0);

struct Counting;

// SAFETY: Every call is forwarded to `System`; the counter has no effect on
// the memory handed out.
unsafe impl GlobalAlloc for Counting {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        LIVE.fetch_add(layout.size(), Ordering::SeqCst);
        // SAFETY: Forwarded with the caller's layout.
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        LIVE.fetch_sub(layout.size(), Ordering::SeqCst);
        // SAFETY: `ptr` came from `alloc` with the same layout.
        unsafe { System.dealloc(ptr, layout) }
    }
}

#[global_allocator]
static ALLOCATOR: Counting = Counting;

const CHUNK: usize = 1 << 20;

type Value = Any<S1, MoveOnly, NoGuarantee, Combined, Checked, Arena<CHUNK>>;

#[test]
fn test_finished_threads_leave_no_chunks_behind() {
    // Warm up the runtime pieces spawning touches once.
    thread::spawn(|| ()).join().unwrap();

    let before = LIVE.load(Ordering::SeqCst);
    let handles: Vec<_> = (0..32)
        .map(|i| {
            thread::spawn(move || {
                let values: Vec<Value> = (0..16).map(|j| Value::new(format!("{i}:{j}"))).collect();
                assert!(values.iter().all(Value::is_heap));
                assert!(Arena::<CHUNK>::used() > 0);
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    let after = LIVE.load(Ordering::SeqCst);

    assert!(
        after.saturating_sub(before) < CHUNK,
        "{} bytes still allocated after the threads finished",
        after.saturating_sub(before)
    );
}
