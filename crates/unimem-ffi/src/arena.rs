//! Arena lifecycle and allocation FFI.
//!
//! All functions operate on the process-wide arena from
//! [`unimem::global`]. Pointers written to out-parameters stay valid until
//! `unimem_free`.

use std::ffi::c_void;
use std::panic;

use unimem::{accel, global, ArenaConfig};

use crate::status::UnimemStatus;

/// Arena usage, as returned by [`unimem_stats`].
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UnimemStats {
    /// Total bytes reserved.
    pub capacity: usize,
    /// Bytes handed out so far.
    pub used: usize,
    /// Bytes left.
    pub remaining: usize,
}

/// Create the process-wide arena with `size` bytes.
///
/// A non-zero `accelerator_visible` backs it with unified memory.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn unimem_create(size: usize, accelerator_visible: u8) -> i32 {
    ffi_guard!({
        let config = ArenaConfig {
            size,
            accelerator_visible: accelerator_visible != 0,
        };
        ffi_try!(global::create_with(config));
        UnimemStatus::Ok as i32
    })
}

/// Destroy the process-wide arena.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn unimem_free() -> i32 {
    ffi_guard!({
        ffi_try!(global::free());
        UnimemStatus::Ok as i32
    })
}

/// 1 if the process-wide arena exists, 0 otherwise.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn unimem_initialized() -> u8 {
    panic::catch_unwind(global::initialized).unwrap_or(false) as u8
}

/// 1 if an accelerator-visible arena can be created, 0 otherwise.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn unimem_accelerator_available() -> u8 {
    panic::catch_unwind(accel::accelerator_available).unwrap_or(false) as u8
}

/// Reserve `size` bytes on the host path and write the address to `out`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn unimem_allocate(size: usize, out: *mut *mut c_void) -> i32 {
    ffi_guard!({
        if out.is_null() {
            return UnimemStatus::InvalidArgument as i32;
        }
        let ptr = ffi_try!(global::allocate(size));
        // SAFETY: out is non-null and valid per caller contract.
        unsafe { *out = ptr.as_ptr().cast() };
        UnimemStatus::Ok as i32
    })
}

/// Fill the whole process-wide arena with `value`.
///
/// Returns `InUse` while a Rust caller holds a handle to the arena.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn unimem_memset(value: u8) -> i32 {
    ffi_guard!({
        ffi_try!(global::memset(value));
        UnimemStatus::Ok as i32
    })
}

/// Write the arena's usage to `out`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn unimem_stats(out: *mut UnimemStats) -> i32 {
    ffi_guard!({
        if out.is_null() {
            return UnimemStatus::InvalidArgument as i32;
        }
        let stats = ffi_try!(global::allocator()).stats();
        // SAFETY: out is non-null and valid per caller contract.
        unsafe {
            *out = UnimemStats {
                capacity: stats.capacity,
                used: stats.used,
                remaining: stats.remaining,
            }
        };
        UnimemStatus::Ok as i32
    })
}

/// Write the address of the arena's cursor to `out`, for kernels that
/// allocate with `atomicAdd` on its first word.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn unimem_device_cursor(out: *mut *const c_void) -> i32 {
    ffi_guard!({
        if out.is_null() {
            return UnimemStatus::InvalidArgument as i32;
        }
        let arena = ffi_try!(global::allocator());
        let cursor = ffi_try!(arena.device()).as_raw_cursor();
        // SAFETY: out is non-null and valid per caller contract.
        unsafe { *out = cursor.cast() };
        UnimemStatus::Ok as i32
    })
}

/// Wait for outstanding device work. A no-op without an accelerator.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn unimem_synchronize() -> i32 {
    ffi_guard!({
        ffi_try!(accel::synchronize());
        UnimemStatus::Ok as i32
    })
}
