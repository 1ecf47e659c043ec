//! C ABI for the unimem process-wide arena.
//!
//! Generated host code links against this crate and calls the `unimem_*`
//! functions; `build.rs` writes the matching `include/unimem.h`. Every
//! function returns a [`UnimemStatus`] code (or a 0/1 flag), and no Rust
//! panic crosses the boundary.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

/// Run `$body` with panics caught, yielding an `i32` status.
macro_rules! ffi_guard {
    ($body:block) => {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| -> i32 { $body })) {
            Ok(code) => code,
            Err(_) => {
                tracing::error!("panic caught at FFI boundary");
                $crate::status::UnimemStatus::Panicked as i32
            }
        }
    };
}

/// Unwrap a `Result<_, ArenaError>` or return its status code.
macro_rules! ffi_try {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(e) => return $crate::status::UnimemStatus::from(&e) as i32,
        }
    };
}

pub mod arena;
pub mod status;

pub use arena::UnimemStats;
pub use status::UnimemStatus;
