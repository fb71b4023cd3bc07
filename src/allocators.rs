//! Thread-safe wrapping of the arena.
//!
//! ### [`LockedAllocator`](struct.LockedAllocator.html)
//!
//! A `LockedAllocator` guards an [`Arena`](../arena/struct.Arena.html) with a
//! spin lock so that it can be shared between threads, and implements
//! [`core::alloc::GlobalAlloc`](https://doc.rust-lang.org/core/alloc/trait.GlobalAlloc.html)
//! so that it can be installed with `#[global_allocator]`. The whole
//! scan-and-mutate sequence of each allocate, release, and coalescing pass
//! runs under the one lock; the algorithm has no partial-progress state that
//! would be safe to expose concurrently.

use core::alloc::{GlobalAlloc, Layout};
use core::ptr::null_mut;

use spin::{Mutex, MutexGuard};

use crate::arena::{Arena, ALIGN_BYTES};
use crate::table::{Stats, Validity};

/// A thread-safe arena allocator, a spin lock around an [`Arena`].
///
/// Allocation never calls into the operating system, so this works as the
/// global allocator on targets without a heap of their own.
///
/// Note that if this is installed as the global allocator, a `log` backend
/// that allocates while formatting would re-enter the lock and deadlock;
/// leave the debug logging unrouted in that configuration.
///
/// [`Arena`]: ../arena/struct.Arena.html
pub struct LockedAllocator<const CELLS: usize, const TABLE: usize> {
    inner: Mutex<Arena<CELLS, TABLE>>,
}

impl<const CELLS: usize, const TABLE: usize> LockedAllocator<CELLS, TABLE> {
    pub const fn new() -> Self {
        LockedAllocator {
            inner: Mutex::new(Arena::new()),
        }
    }

    /// Lock the arena for direct, handle-based use.
    pub fn lock(&self) -> MutexGuard<Arena<CELLS, TABLE>> {
        self.inner.lock()
    }

    /// Statistics on the descriptor table, and whether it is valid.
    pub fn stats(&self) -> (Validity, Stats) {
        self.inner.lock().stats()
    }
}

impl<const CELLS: usize, const TABLE: usize> Default for LockedAllocator<CELLS, TABLE> {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl<const CELLS: usize, const TABLE: usize> GlobalAlloc for LockedAllocator<CELLS, TABLE> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if layout.align() > ALIGN_BYTES {
            // Every granted run is ALIGN_BYTES aligned, never more, so a
            // stricter layout cannot be honored.
            return null_mut();
        }
        let mut arena = self.inner.lock();
        match arena.allocate(layout.size()) {
            Ok(handle) => arena.run_ptr(handle),
            Err(_) => null_mut(),
        }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        let mut arena = self.inner.lock();
        if let Some(handle) = arena.handle_of(ptr) {
            arena.release(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    #[test]
    fn serves_layouts_and_reuses_memory() {
        let allocator = LockedAllocator::<64, 16>::new();
        let layout = Layout::from_size_align(24, 8).unwrap();

        let p = unsafe { allocator.alloc(layout) };
        assert!(!p.is_null());
        assert_eq!(p as usize % ALIGN_BYTES, 0);

        let (validity, stats) = allocator.stats();
        assert!(validity.is_valid());
        assert_eq!(stats.locked_cells, 6);

        unsafe { allocator.dealloc(p, layout) };
        let (validity, stats) = allocator.stats();
        assert!(validity.is_valid());
        assert_eq!(stats.free_cells, 64);

        // First-fit hands the same run straight back.
        let q = unsafe { allocator.alloc(layout) };
        assert_eq!(q, p);
    }

    #[test]
    fn rejects_unsupported_alignment() {
        let allocator = LockedAllocator::<64, 16>::new();
        let layout = Layout::from_size_align(8, 2 * ALIGN_BYTES).unwrap();
        assert!(unsafe { allocator.alloc(layout) }.is_null());

        let (_, stats) = allocator.stats();
        assert_eq!(stats.free_cells, 64);
    }

    #[test]
    fn foreign_pointers_are_ignored_on_dealloc() {
        let allocator = LockedAllocator::<64, 16>::new();
        let layout = Layout::from_size_align(16, 8).unwrap();
        let p = unsafe { allocator.alloc(layout) };
        assert!(!p.is_null());

        let mut elsewhere = [0u8; 16];
        unsafe { allocator.dealloc(elsewhere.as_mut_ptr(), layout) };

        let (validity, stats) = allocator.stats();
        assert!(validity.is_valid());
        assert_eq!(stats.locked_cells, 4);
    }

    #[test]
    fn exhaustion_returns_null_rather_than_panicking() {
        let allocator = LockedAllocator::<16, 8>::new();
        let layout = Layout::from_size_align(32, 8).unwrap();

        let first = unsafe { allocator.alloc(layout) };
        let second = unsafe { allocator.alloc(layout) };
        let third = unsafe { allocator.alloc(layout) };
        assert!(!first.is_null());
        assert!(!second.is_null());
        assert!(third.is_null());

        unsafe { allocator.dealloc(first, layout) };
        let again = unsafe { allocator.alloc(layout) };
        assert_eq!(again, first);
    }
}
