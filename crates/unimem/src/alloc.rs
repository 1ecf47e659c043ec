//! Allocation capabilities for the two execution contexts.
//!
//! [`ArenaAlloc`] is the single operation the rest of the runtime sees:
//! "give me `n` bytes of the arena". It has exactly two implementations:
//!
//! - [`HostAlloc`]: host callers, serialized by the arena's mutex.
//! - [`DeviceAlloc`]: accelerator-side callers, lock-free on the cursor's
//!   atomic. Device kernels receive the raw cursor via
//!   [`DeviceAlloc::as_raw_cursor`] and perform the same fetch-and-add.
//!
//! Call sites pick one by type, so the choice is made at compile time.
//! Both share one cursor, so allocations from either side never overlap.
//!
//! Objects placed with [`create_unified`] are never dropped: the arena
//! releases raw bytes only. The typed helpers therefore accept only `Copy`
//! types, which have no drop glue to skip.

use std::alloc::Layout;
use std::ptr::NonNull;
use std::sync::{Mutex, PoisonError};

use crate::cursor::Cursor;
use crate::error::ArenaError;
use crate::raw::Region;

mod sealed {
    pub trait Sealed {}
}

/// Bump allocation from an arena.
///
/// Sealed: the typed helpers write through the returned pointers, so only
/// this crate's implementations are trusted to hand them out.
pub trait ArenaAlloc: sealed::Sealed {
    /// Reserve `size` bytes at the current head, with no padding.
    ///
    /// The returned address is exactly the pre-advance head.
    fn allocate(&self, size: usize) -> Result<NonNull<u8>, ArenaError>;

    /// Reserve `layout.size()` bytes at the next `layout.align()` boundary.
    fn allocate_layout(&self, layout: Layout) -> Result<NonNull<u8>, ArenaError>;

    /// Reserve room for a `T` and move `value` into it.
    ///
    /// The object lives until the whole arena is released; its storage is
    /// never reused and it is never dropped.
    fn create_unified<T: Copy>(&self, value: T) -> Result<NonNull<T>, ArenaError>;

    /// Reserve room for a `T` and initialise it with `T::default()`.
    fn allocate_default<T: Copy + Default>(&self) -> Result<NonNull<T>, ArenaError> {
        self.create_unified(T::default())
    }
}

/// Host-side allocation handle. Cheap to copy; borrows the arena.
#[derive(Clone, Copy)]
pub struct HostAlloc<'a> {
    region: &'a Region,
    lock: &'a Mutex<()>,
}

impl<'a> HostAlloc<'a> {
    pub(crate) fn new(region: &'a Region, lock: &'a Mutex<()>) -> Self {
        Self { region, lock }
    }

    fn reserve(&self, size: usize, align: usize) -> Result<usize, ArenaError> {
        // The guarded section cannot panic, so a poisoned lock is still sound.
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.region
            .cursor()
            .bump(size, align)
            .inspect_err(|e| tracing::warn!(error = %e, "host allocation failed"))
    }
}

impl sealed::Sealed for HostAlloc<'_> {}

impl ArenaAlloc for HostAlloc<'_> {
    fn allocate(&self, size: usize) -> Result<NonNull<u8>, ArenaError> {
        let addr = self.reserve(size, 1)?;
        Ok(self.region.ptr_at(addr))
    }

    fn allocate_layout(&self, layout: Layout) -> Result<NonNull<u8>, ArenaError> {
        let addr = self.reserve(layout.size(), layout.align())?;
        Ok(self.region.ptr_at(addr))
    }

    fn create_unified<T: Copy>(&self, value: T) -> Result<NonNull<T>, ArenaError> {
        let layout = Layout::new::<T>();
        let addr = self.reserve(layout.size(), layout.align())?;
        Ok(self.region.write_at(addr, value))
    }
}

/// Accelerator-side allocation handle: lock-free on the shared cursor.
///
/// Usable from host threads too (it is what the host sees of device-side
/// allocation), and on host-only arenas.
#[derive(Clone, Copy)]
pub struct DeviceAlloc<'a> {
    region: &'a Region,
}

impl<'a> DeviceAlloc<'a> {
    pub(crate) fn new(region: &'a Region) -> Self {
        Self { region }
    }

    /// Raw pointer to the arena's [`Cursor`] for passing to device kernels.
    ///
    /// The cursor is `repr(C)` with `head` as its first word, so a kernel
    /// allocates with `atomicAdd((unsigned long long*)cursor, n)`. Kernels
    /// doing so bypass the capacity check and must bound their own requests
    /// against `tail`. An overrun leaves the arena reporting itself full.
    pub fn as_raw_cursor(&self) -> *const Cursor {
        self.region.cursor()
    }

    fn reserve(&self, size: usize, align: usize) -> Result<usize, ArenaError> {
        self.region
            .cursor()
            .bump(size, align)
            .inspect_err(|e| tracing::warn!(error = %e, "device allocation failed"))
    }
}

impl sealed::Sealed for DeviceAlloc<'_> {}

impl ArenaAlloc for DeviceAlloc<'_> {
    fn allocate(&self, size: usize) -> Result<NonNull<u8>, ArenaError> {
        let addr = self.reserve(size, 1)?;
        Ok(self.region.ptr_at(addr))
    }

    fn allocate_layout(&self, layout: Layout) -> Result<NonNull<u8>, ArenaError> {
        let addr = self.reserve(layout.size(), layout.align())?;
        Ok(self.region.ptr_at(addr))
    }

    fn create_unified<T: Copy>(&self, value: T) -> Result<NonNull<T>, ArenaError> {
        let layout = Layout::new::<T>();
        let addr = self.reserve(layout.size(), layout.align())?;
        Ok(self.region.write_at(addr, value))
    }
}

/// Reserve room for a `T` through `alloc` and initialise it with
/// `T::default()`.
pub fn allocate_default<T, A>(alloc: &A) -> Result<NonNull<T>, ArenaError>
where
    T: Copy + Default,
    A: ArenaAlloc,
{
    alloc.allocate_default()
}

/// Reserve room for a `T` through `alloc` and move `value` into it.
pub fn create_unified<T, A>(alloc: &A, value: T) -> Result<NonNull<T>, ArenaError>
where
    T: Copy,
    A: ArenaAlloc,
{
    alloc.create_unified(value)
}
