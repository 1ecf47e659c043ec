//! Low-level primitives for arena memory.
//!
//! This is the only module in the crate allowed to contain `unsafe`. Every
//! block carries a `// SAFETY:` comment. Everything above this layer deals
//! in [`Region`], which owns one reservation laid out as:
//!
//! ```text
//! ┌────────────────────┬──────────────────────────────────────────┐
//! │ header (ARENA_ALIGN)│ data (config.size bytes)                 │
//! │   Cursor            │ base ............................ tail  │
//! └────────────────────┴──────────────────────────────────────────┘
//! ```
//!
//! The cursor lives inside the reservation so that, for unified arenas,
//! device code can reach it through the same address space as the data.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::mem;
use std::ptr::{self, NonNull};
use std::slice;

use crate::config::{Backing, ARENA_ALIGN};
use crate::cursor::Cursor;
use crate::error::ArenaError;

const _: () = assert!(mem::size_of::<Cursor>() <= ARENA_ALIGN);
const _: () = assert!(mem::align_of::<Cursor>() <= ARENA_ALIGN);

/// One arena reservation: cursor header followed by the data region.
pub(crate) struct Region {
    /// Start of the reservation (the header).
    raw: NonNull<u8>,
    /// Start of the data region, `ARENA_ALIGN` bytes after `raw`.
    data: NonNull<u8>,
    /// Size of the data region in bytes.
    size: usize,
    backing: Backing,
}

// SAFETY: the region exclusively owns its reservation. Shared access only
// touches the header through atomics, and the data region is handed out as
// raw pointers whose use is the caller's responsibility.
unsafe impl Send for Region {}
// SAFETY: see `Send` above.
unsafe impl Sync for Region {}

impl Region {
    /// Reserve `size` data bytes plus the header, zero-filled.
    pub(crate) fn reserve(size: usize, backing: Backing) -> Result<Self, ArenaError> {
        let total = size
            .checked_add(ARENA_ALIGN)
            .ok_or_else(|| ArenaError::InvalidConfig {
                reason: format!("size {size} overflows with header"),
            })?;

        let raw = match backing {
            Backing::Host => host_reserve(total)?,
            Backing::Unified => unified_reserve(total)?,
        };

        // SAFETY: `raw` points to `total = ARENA_ALIGN + size` bytes, so the
        // data start is in bounds (one-past-the-end at worst when size == 0).
        let data = unsafe { raw.add(ARENA_ALIGN) };
        let base = data.as_ptr() as usize;

        // SAFETY: `raw` is aligned to ARENA_ALIGN, which satisfies Cursor's
        // alignment, and the header is large enough (const asserts above).
        // Nothing else references the header yet.
        unsafe {
            ptr::write(raw.as_ptr().cast::<Cursor>(), Cursor::new(base, size));
        }

        Ok(Self {
            raw,
            data,
            size,
            backing,
        })
    }

    /// The shared allocation cursor stored in the header.
    pub(crate) fn cursor(&self) -> &Cursor {
        // SAFETY: the header was initialised in `reserve` and lives as long
        // as `self`. Cursor is only mutated through atomics.
        unsafe { &*self.raw.as_ptr().cast::<Cursor>() }
    }

    /// Pointer for an absolute address handed out by the cursor.
    ///
    /// `addr` must lie in `[base, base + size]`; the cursor never produces
    /// anything else.
    pub(crate) fn ptr_at(&self, addr: usize) -> NonNull<u8> {
        let offset = addr - self.base();
        debug_assert!(offset <= self.size, "address outside arena");
        // SAFETY: offset <= size, so the result stays within the reservation
        // (or one past its end) and keeps the reservation's provenance.
        unsafe { self.data.add(offset) }
    }

    /// Move `value` into the arena at `addr`.
    ///
    /// The cursor must have reserved `size_of::<T>()` bytes at `addr`,
    /// aligned for `T`, exclusively for this call.
    pub(crate) fn write_at<T: Copy>(&self, addr: usize, value: T) -> NonNull<T> {
        let ptr = self.ptr_at(addr).cast::<T>();
        debug_assert!(ptr.as_ptr().is_aligned(), "misaligned typed allocation");
        debug_assert!(addr - self.base() + mem::size_of::<T>() <= self.size);
        // SAFETY: the range was just reserved for this value by the cursor,
        // so no other pointer into it exists, it is in bounds and aligned.
        unsafe { ptr.as_ptr().write(value) };
        ptr
    }

    /// Overwrite every data byte with `value`.
    pub(crate) fn fill(&mut self, value: u8) {
        // SAFETY: `data` is valid for `size` bytes of writes, and `&mut self`
        // rules out a concurrent `write_at` or byte view.
        unsafe { ptr::write_bytes(self.data.as_ptr(), value, self.size) };
    }

    /// The whole data region as bytes.
    pub(crate) fn bytes(&mut self) -> &[u8] {
        // SAFETY: the data region is `size` initialised bytes (zero-filled
        // at reservation), and the returned borrow of `self` keeps `fill`
        // from running while it lives.
        unsafe { slice::from_raw_parts(self.data.as_ptr(), self.size) }
    }

    /// Address of the first data byte.
    pub(crate) fn base(&self) -> usize {
        self.data.as_ptr() as usize
    }

    pub(crate) fn size(&self) -> usize {
        self.size
    }

    pub(crate) fn backing(&self) -> Backing {
        self.backing
    }
}

impl Drop for Region {
    fn drop(&mut self) {
        let total = self.size + ARENA_ALIGN;
        match self.backing {
            Backing::Host => {
                // SAFETY: `reserve` validated this exact layout before
                // allocating it, so it cannot fail here.
                let layout = unsafe { Layout::from_size_align_unchecked(total, ARENA_ALIGN) };
                // SAFETY: `raw` came from `alloc_zeroed` with this layout and
                // is released exactly once.
                unsafe { alloc::dealloc(self.raw.as_ptr(), layout) };
            }
            Backing::Unified => unified_release(self.raw),
        }
    }
}

fn host_reserve(total: usize) -> Result<NonNull<u8>, ArenaError> {
    let layout =
        Layout::from_size_align(total, ARENA_ALIGN).map_err(|e| ArenaError::InvalidConfig {
            reason: e.to_string(),
        })?;
    // SAFETY: layout has non-zero size (it always includes the header).
    let raw = unsafe { alloc::alloc_zeroed(layout) };
    NonNull::new(raw).ok_or(ArenaError::ReservationFailed {
        requested: total,
        backing: Backing::Host,
    })
}

#[cfg(feature = "cuda")]
mod cuda {
    use std::ffi::c_void;

    /// `cudaMemAttachGlobal`: accessible from any stream on any device.
    pub(super) const MEM_ATTACH_GLOBAL: u32 = 0x01;

    extern "C" {
        pub(super) fn cudaMallocManaged(ptr: *mut *mut c_void, size: usize, flags: u32) -> i32;
        pub(super) fn cudaFree(ptr: *mut c_void) -> i32;
        pub(super) fn cudaGetDeviceCount(count: *mut i32) -> i32;
        pub(super) fn cudaDeviceSynchronize() -> i32;
    }
}

#[cfg(feature = "cuda")]
fn unified_reserve(total: usize) -> Result<NonNull<u8>, ArenaError> {
    if device_count() == 0 {
        return Err(ArenaError::AcceleratorUnavailable);
    }
    let mut raw: *mut std::ffi::c_void = ptr::null_mut();
    // SAFETY: `raw` is a valid out-pointer for the duration of the call.
    let status = unsafe { cuda::cudaMallocManaged(&mut raw, total, cuda::MEM_ATTACH_GLOBAL) };
    let raw = match NonNull::new(raw.cast::<u8>()) {
        Some(raw) if status == 0 => raw,
        _ => {
            return Err(ArenaError::ReservationFailed {
                requested: total,
                backing: Backing::Unified,
            })
        }
    };
    // SAFETY: managed memory is uninitialised; zero it so the whole region
    // is readable as bytes. The pointer is valid for `total` bytes.
    unsafe { ptr::write_bytes(raw.as_ptr(), 0, total) };
    Ok(raw)
}

#[cfg(not(feature = "cuda"))]
fn unified_reserve(_total: usize) -> Result<NonNull<u8>, ArenaError> {
    Err(ArenaError::AcceleratorUnavailable)
}

#[cfg(feature = "cuda")]
fn unified_release(raw: NonNull<u8>) {
    // SAFETY: `raw` came from cudaMallocManaged and is released exactly once.
    let status = unsafe { cuda::cudaFree(raw.as_ptr().cast()) };
    if status != 0 {
        tracing::warn!(status, "cudaFree failed while releasing arena");
    }
}

#[cfg(not(feature = "cuda"))]
fn unified_release(_raw: NonNull<u8>) {
    // Unreachable in practice: unified regions cannot be reserved without cuda.
}

/// Number of visible CUDA devices; 0 on error.
#[cfg(feature = "cuda")]
pub(crate) fn device_count() -> usize {
    let mut count = 0i32;
    // SAFETY: `count` is a valid out-pointer for the duration of the call.
    let status = unsafe { cuda::cudaGetDeviceCount(&mut count) };
    if status != 0 {
        return 0;
    }
    count.max(0) as usize
}

#[cfg(not(feature = "cuda"))]
pub(crate) fn device_count() -> usize {
    0
}

/// Block until all outstanding device work completes. Returns the CUDA
/// status code, 0 on success.
#[cfg(feature = "cuda")]
pub(crate) fn device_synchronize() -> i32 {
    // SAFETY: takes no arguments and only blocks the calling thread.
    unsafe { cuda::cudaDeviceSynchronize() }
}

#[cfg(not(feature = "cuda"))]
pub(crate) fn device_synchronize() -> i32 {
    0
}
