//! A bump allocator over one fixed-size chunk per thread.
//!
//! [`Arena`] is meant for batch work: allocate many values, drop them, then
//! [`reset`](Arena::reset) the arena before the next batch. Releasing a value
//! runs its destructor but never gives memory back, so there is no
//! bookkeeping per allocation beyond a live count, and no locking at all.
//!
//! Every thread gets its own chunk of `SIZE` bytes, created on the first
//! allocation of that thread. The chunk is freed when the thread exits, unless
//! a value allocated from it is still alive at that point; such a chunk is
//! left to the process. Running out of space is fatal: the process is aborted.

use core::{alloc::Layout, cell::RefCell, mem::MaybeUninit, ptr::NonNull};
use std::process;

use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;
use woid_internals::allocator::Allocator;

/// The chunk of one thread for one arena size.
struct Chunk {
    /// Start of the chunk.
    ///
    /// # Safety
    ///
    /// 1. Came from `Box::leak` and is only turned back into a `Box` once.
    base: NonNull<[MaybeUninit<u8>]>,
    /// Bytes handed out so far, including alignment padding.
    used: usize,
    /// Allocations not released yet.
    live: usize,
}

impl Chunk {
    /// Allocates a chunk of `size` bytes.
    fn new(size: usize) -> Self {
        Self {
            base: NonNull::from(Box::leak(Box::<[u8]>::new_uninit_slice(size))),
            used: 0,
            live: 0,
        }
    }

    /// Start of the chunk as a byte pointer.
    fn start(&self) -> NonNull<u8> {
        self.base.cast::<u8>()
    }
}

impl Drop for Chunk {
    fn drop(&mut self) {
        if self.live != 0 {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                chunk_size = self.base.len(),
                live = self.live,
                "Arena chunk outlived its thread with live values, leaking it"
            );
            return;
        }

        // SAFETY: The chunk came from `Box::leak`, this is the only place turning it
        // back, and nothing allocated from it is alive to use it again.
        drop(unsafe { Box::from_raw(self.base.as_ptr()) });
    }
}

thread_local! {
    /// Chunks of the current thread, keyed by arena size.
    static CHUNKS: RefCell<HashMap<usize, Chunk, FxBuildHasher>> =
        RefCell::new(HashMap::with_hasher(FxBuildHasher));
}

/// Bump allocator carving values out of a `SIZE`-byte chunk per thread.
///
/// Use it as the allocator parameter of a container to keep big values out
/// of the process heap:
///
/// ```
/// use woid::{Any, Arena, markers::{Combined, Copyable, NoGuarantee, Unchecked}, space::S1};
///
/// type Batch = Any<S1, Copyable, NoGuarantee, Combined, Unchecked, Arena<4096>>;
///
/// let values: Vec<Batch> = (0..8).map(|i| Batch::new([i; 4])).collect();
/// assert!(Arena::<4096>::used() >= 8 * 16);
/// drop(values);
///
/// // SAFETY: Nothing allocated from this arena is alive anymore.
/// unsafe { Arena::<4096>::reset() };
/// assert_eq!(Arena::<4096>::used(), 0);
/// ```
///
/// The arena is not shared between threads: a value allocated on one thread
/// must be released on the same thread. Containers are neither `Send` nor
/// `Sync`, which upholds this for every value they own.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct Arena<const SIZE: usize>;

impl<const SIZE: usize> Arena<SIZE> {
    /// Returns the number of bytes used in the current thread's chunk.
    pub fn used() -> usize {
        CHUNKS.with_borrow(|chunks| chunks.get(&SIZE).map_or(0, |chunk| chunk.used))
    }

    /// Returns the number of values allocated from the current thread's chunk
    /// and not released yet.
    pub fn live() -> usize {
        CHUNKS.with_borrow(|chunks| chunks.get(&SIZE).map_or(0, |chunk| chunk.live))
    }

    /// Rewinds the current thread's chunk, making all of it available again.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. No value allocated from this arena on the current thread is still
    ///    alive or will be accessed again.
    pub unsafe fn reset() {
        CHUNKS.with_borrow_mut(|chunks| {
            if let Some(chunk) = chunks.get_mut(&SIZE) {
                #[cfg(feature = "tracing")]
                tracing::trace!(arena_size = SIZE, used = chunk.used, "Resetting arena");

                chunk.used = 0;
            }
        });
    }

    /// Hands out room for `layout`, aborting when the chunk is exhausted.
    fn bump(layout: Layout) -> NonNull<u8> {
        CHUNKS.with_borrow_mut(|chunks| {
            let chunk = chunks.entry(SIZE).or_insert_with(|| Chunk::new(SIZE));
            let base = chunk.start().as_ptr().addr();
            let start = (base + chunk.used).next_multiple_of(layout.align()) - base;
            match start.checked_add(layout.size()) {
                Some(end) if end <= SIZE => {
                    chunk.used = end;
                    chunk.live += 1;
                    // SAFETY: `start + layout.size() <= SIZE`, so the offset stays inside
                    // the chunk.
                    unsafe { chunk.start().add(start) }
                }
                _ => exhausted::<SIZE>(layout, chunk.used),
            }
        })
    }
}

/// Aborts the process after an allocation did not fit the arena.
#[cold]
#[inline(never)]
fn exhausted<const SIZE: usize>(layout: Layout, used: usize) -> ! {
    #[cfg(feature = "tracing")]
    tracing::error!(
        arena_size = SIZE,
        used,
        requested = layout.size(),
        align = layout.align(),
        "Arena exhausted, aborting"
    );
    #[cfg(not(feature = "tracing"))]
    let _ = (layout, used);

    process::abort()
}

// SAFETY:
// 1. `bump` returns a pointer inside the thread's chunk, aligned for `T` and
//    with room for a `T`, which `allocate` initializes before returning it.
// 2. A chunk is only freed once its live count is zero, and `bump` never hands
//    out the same bytes twice until `reset`, whose caller guarantees no
//    allocation is alive.
unsafe impl<const SIZE: usize> Allocator for Arena<SIZE> {
    fn allocate<T>(value: T) -> NonNull<T> {
        let layout = Layout::new::<T>();
        if layout.size() == 0 {
            let ptr = NonNull::<T>::dangling();
            // SAFETY: Zero-sized writes through a dangling, aligned pointer are
            // valid.
            unsafe { ptr.write(value) };
            return ptr;
        }

        let ptr = Self::bump(layout).cast::<T>();
        // SAFETY: `bump` returned room for a `T`, aligned for `T`, that nothing
        // else uses.
        unsafe { ptr.write(value) };
        ptr
    }

    unsafe fn release<T>(ptr: NonNull<T>) {
        // SAFETY: The pointer came from `allocate` and holds a live `T` that is not
        // used afterwards (guaranteed by the caller). The memory itself stays
        // with the arena.
        unsafe { ptr.drop_in_place() };

        if size_of::<T>() != 0 {
            // Values released while the thread is exiting find the chunks gone; the
            // chunk was then kept alive for them.
            let _ = CHUNKS.try_with(|chunks| {
                if let Some(chunk) = chunks.borrow_mut().get_mut(&SIZE) {
                    chunk.live -= 1;
                }
            });
        }
    }
}
