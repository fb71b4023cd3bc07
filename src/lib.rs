#![no_std]

//! A fixed-arena memory allocator with table-based bookkeeping.
//!
//! All memory is carved out of a single contiguous backing store whose size
//! is fixed when the arena is created. Instead of threading a free list
//! through the stored memory itself, the allocator keeps a bounded side
//! table of block descriptors; each descriptor records one contiguous run of
//! storage cells that is either free or locked (granted to a caller).
//!
//! Allocation is a first-fit scan of that table, splitting oversized runs
//! lazily. Adjacent free runs are merged only when an allocation would
//! otherwise fail: one coalescing pass, one retry, and then the allocation
//! reports failure. Since the arena never grows and never calls into the
//! operating system, the allocator suits memory-constrained targets where a
//! general-purpose heap is unavailable or unwanted.
//!
//! ## Types
//!
//! ### [`Arena`](arena/struct.Arena.html)
//!
//! An `Arena` is the single-threaded core: the backing store, the descriptor
//! table, and the `allocate`/`release` operations working on opaque
//! [`Handle`](arena/struct.Handle.html)s, with safe slice access to granted
//! runs.
//!
//! ### [`LockedAllocator`](allocators/struct.LockedAllocator.html)
//!
//! A `LockedAllocator` wraps an `Arena` with a spin lock to make it
//! thread-safe, and implements `core::alloc::GlobalAlloc` so it can be
//! installed with `#[global_allocator]`.
//!
//! ### [`DescriptorTable`](table/struct.DescriptorTable.html)
//!
//! The bookkeeping table itself, exposed read-only together with
//! [`Validity`](table/struct.Validity.html) and
//! [`Stats`](table/struct.Stats.html) for diagnostics and tests.

#[cfg(test)]
#[macro_use]
extern crate std;

pub mod allocators;
pub mod arena;
pub mod table;

pub use crate::allocators::LockedAllocator;
pub use crate::arena::{AllocError, Arena, Handle};
pub use crate::table::{BlockState, Descriptor, DescriptorTable, Stats, Validity};
