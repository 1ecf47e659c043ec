//! Bump-allocated arena over host or unified (host + accelerator) memory.
//!
//! A runtime places objects in the arena that both host code and device
//! kernels read and write in place, without copies. Allocations are never
//! freed individually; the arena is released as a whole.
//!
//! # Architecture
//!
//! ```text
//! Arena
//! ├── Region (raw.rs)       one reservation: host heap or cudaMallocManaged
//! │   ├── Cursor header     base / head / tail, head is an AtomicUsize
//! │   └── data              config.size bytes, zero-filled
//! ├── host_lock: Mutex<()>  serializes host-side cursor updates
//! └── ArenaAlloc
//!     ├── HostAlloc         mutex + cursor bump
//!     └── DeviceAlloc       lock-free cursor bump (and raw cursor for kernels)
//! ```
//!
//! Every allocation is capacity-checked: a request that does not fit
//! returns [`ArenaError::CapacityExceeded`] and leaves the cursor where it
//! was.
//!
//! The [`global`] module keeps a single process-wide arena for generated
//! code that expects one implicit allocator.
//!
//! # Example
//!
//! ```
//! use unimem::{Arena, ArenaAlloc, ArenaConfig};
//!
//! let arena = Arena::new(ArenaConfig::host(1024)).unwrap();
//! let host = arena.host().unwrap();
//! let p = host.allocate(64).unwrap();
//! let q = host.allocate(32).unwrap();
//! assert_eq!(q.as_ptr() as usize, p.as_ptr() as usize + 64);
//! ```
//!
//! # Unsafe policy
//!
//! Only `raw.rs` may contain `unsafe`; each block states its invariant.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod accel;
pub mod alloc;
pub mod arena;
pub mod config;
pub mod cursor;
pub mod error;
pub mod global;
mod raw;

// Public re-exports for the primary API surface.
pub use alloc::{allocate_default, create_unified, ArenaAlloc, DeviceAlloc, HostAlloc};
pub use arena::{Arena, ArenaStats};
pub use config::{ArenaConfig, Backing, ARENA_ALIGN};
pub use cursor::Cursor;
pub use error::ArenaError;
