use core::fmt;
use core::mem;
use core::slice;

use static_assertions::const_assert;

use crate::table::{DescriptorTable, Stats, Validity};

/// The storage cell type. Runs are measured and granted in whole cells.
pub(crate) type Cell = u32;

/// Width of one storage cell, in bytes.
pub const CELL_BYTES: usize = mem::size_of::<Cell>();

/// Granted run lengths are rounded up to a multiple of this many cells.
pub const ALIGN_CELLS: usize = 2;

/// Byte alignment of the start of every granted run.
pub const ALIGN_BYTES: usize = CELL_BYTES * ALIGN_CELLS;

const_assert!(ALIGN_CELLS >= 1);
const_assert!(ALIGN_BYTES.is_power_of_two());

// The align attribute takes a literal, so this keeps it honest against
// ALIGN_BYTES.
const_assert!(mem::align_of::<Store<2>>() >= ALIGN_BYTES);

// Backing store. The alignment raise means a run starting on an even cell
// boundary starts on an ALIGN_BYTES boundary in memory.
#[repr(align(8))]
struct Store<const CELLS: usize>([Cell; CELLS]);

/// An opaque, arena-relative address for a granted run.
///
/// A handle is only meaningful to the arena that granted it. Handles are
/// `Copy`; holding a stale one after [`Arena::release`](struct.Arena.html#method.release)
/// is harmless, since every lookup checks the table first.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Handle(pub(crate) usize);

/// Why an allocation failed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// Zero-sized requests are rejected before the table is touched.
    InvalidSize,
    /// Rounding the request to whole aligned cells would wrap around.
    Overflow,
    /// No free run is large enough, even after coalescing.
    OutOfMemory,
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            AllocError::InvalidSize => "zero-sized allocation",
            AllocError::Overflow => "allocation size overflows cell rounding",
            AllocError::OutOfMemory => "no free run large enough",
        };
        f.write_str(msg)
    }
}

// Round up value to the nearest multiple of increment
fn round_up(value: usize, increment: usize) -> usize {
    if value == 0 {
        return 0;
    }
    increment * ((value - 1) / increment + 1)
}

// Convert a byte size into an aligned cell count.
fn cells_for(size: usize) -> Result<usize, AllocError> {
    if size == 0 {
        return Err(AllocError::InvalidSize);
    }
    let cells = round_up((size - 1) / CELL_BYTES + 1, ALIGN_CELLS);

    // Wraparound guard: the rounded run must still cover the request once
    // converted back to bytes.
    match cells.checked_mul(CELL_BYTES) {
        Some(bytes) if bytes >= size => Ok(cells),
        _ => Err(AllocError::Overflow),
    }
}

/// A fixed-size arena allocator with table-based bookkeeping.
///
/// `CELLS` cells of backing store and a descriptor table with `TABLE` slots,
/// both fixed at construction. The arena owns its backing store outright and
/// never calls into the operating system; when it runs out, allocation fails
/// and that is that.
///
/// Allocation is a first-fit scan of the descriptor table. Oversized free
/// runs are split lazily, and adjacent free runs are merged only when an
/// allocation would otherwise fail - a single coalescing pass followed by a
/// single retry.
///
/// `Arena` is single-threaded; both operations take `&mut self`. See
/// [`LockedAllocator`](../allocators/struct.LockedAllocator.html) for the
/// thread-safe wrapper.
pub struct Arena<const CELLS: usize, const TABLE: usize> {
    store: Store<CELLS>,
    table: DescriptorTable<TABLE>,
}

impl<const CELLS: usize, const TABLE: usize> Arena<CELLS, TABLE> {
    /// Create an arena with every cell in one free run.
    pub const fn new() -> Self {
        assert!(
            CELLS >= ALIGN_CELLS && CELLS % ALIGN_CELLS == 0,
            "arena must hold a whole number of aligned runs"
        );
        Arena {
            store: Store([0; CELLS]),
            table: DescriptorTable::new(CELLS),
        }
    }

    /// Total size of the backing store, in bytes.
    pub const fn capacity(&self) -> usize {
        CELLS * CELL_BYTES
    }

    /// Allocate `size` bytes from the arena.
    ///
    /// The granted run is at least `size` bytes long, rounded up to whole
    /// aligned cells; it can be longer still when the descriptor table had
    /// no slot left to record a split. The run is owned by the caller until
    /// the handle is passed to [`release`](#method.release).
    pub fn allocate(&mut self, size: usize) -> Result<Handle, AllocError> {
        let length = cells_for(size)?;

        if let Some((start, _)) = self.table.claim(length) {
            return Ok(Handle(start));
        }

        // Defragment once and retry once; the table never shrinks below a
        // claimable run any other way.
        log::debug!("no free run of {} cells, coalescing", length);
        self.table.coalesce();
        match self.table.claim(length) {
            Some((start, _)) => Ok(Handle(start)),
            None => Err(AllocError::OutOfMemory),
        }
    }

    /// Return a granted run to the arena.
    ///
    /// A handle that is not currently locked - already released, or never
    /// granted by this arena - is ignored.
    pub fn release(&mut self, handle: Handle) {
        if !self.table.unlock(handle.0) {
            log::debug!("release of unknown handle {:?} ignored", handle);
        }
    }

    /// The bytes of the run granted for `handle`, or `None` if the handle
    /// is not currently locked.
    ///
    /// The slice covers the granted length, which may exceed the requested
    /// size.
    pub fn get(&self, handle: Handle) -> Option<&[u8]> {
        let length = self.table.locked_length(handle.0)?;
        let base = self.store.0.as_ptr() as *const u8;
        unsafe {
            Some(slice::from_raw_parts(
                base.add(handle.0 * CELL_BYTES),
                length * CELL_BYTES,
            ))
        }
    }

    /// Mutable access to the run granted for `handle`, or `None` if the
    /// handle is not currently locked.
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut [u8]> {
        let length = self.table.locked_length(handle.0)?;
        let base = self.store.0.as_mut_ptr() as *mut u8;
        unsafe {
            Some(slice::from_raw_parts_mut(
                base.add(handle.0 * CELL_BYTES),
                length * CELL_BYTES,
            ))
        }
    }

    /// Statistics on the descriptor table, and whether it is valid.
    pub fn stats(&self) -> (Validity, Stats) {
        self.table.stats()
    }

    /// Read-only view of the descriptor table, for diagnostics.
    pub fn table(&self) -> &DescriptorTable<TABLE> {
        &self.table
    }

    // Raw pointer to the first byte of a granted run. Only meaningful for a
    // handle that is currently locked.
    pub(crate) fn run_ptr(&mut self, handle: Handle) -> *mut u8 {
        let base = self.store.0.as_mut_ptr() as *mut u8;
        unsafe { base.add(handle.0 * CELL_BYTES) }
    }

    // Map a pointer back to the handle of the run it starts. Pointers
    // outside the backing store or off cell granularity yield None.
    pub(crate) fn handle_of(&self, ptr: *const u8) -> Option<Handle> {
        let base = self.store.0.as_ptr() as usize;
        let addr = ptr as usize;
        if addr < base || addr >= base + self.capacity() {
            return None;
        }
        let offset = addr - base;
        if offset % CELL_BYTES != 0 {
            return None;
        }
        Some(Handle(offset / CELL_BYTES))
    }
}

impl<const CELLS: usize, const TABLE: usize> Default for Arena<CELLS, TABLE> {
    fn default() -> Self {
        Self::new()
    }
}
