//! Process-wide arena for call sites that cannot be handed one.
//!
//! Generated code expects a single implicit allocator. This module keeps
//! that shape on top of an ordinary [`Arena`]: one slot, filled by
//! [`create`] and emptied by [`free`]. New code should take an
//! [`ArenaAlloc`] instead.
//!
//! The slot is guarded by a mutex, so lifecycle calls from different
//! threads are serialized. Lifecycle misuse is reported, not undefined:
//! a second `create` returns [`ArenaError::AlreadyInitialized`], `free`
//! without a live arena returns [`ArenaError::NotInitialized`].
//!
//! `free` clears the slot immediately. If other threads still hold the
//! `Arc` from [`allocator`], the storage is released when the last of
//! them drops it.
//!
//! [`memset`] needs the arena to itself: it fails with
//! [`ArenaError::InUse`] while any handle from [`allocator`] is alive, and
//! holds the slot so no new handle can be taken during the fill.

use std::ptr::NonNull;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::alloc::ArenaAlloc;
use crate::arena::Arena;
use crate::config::ArenaConfig;
use crate::error::ArenaError;

static ARENA: Mutex<Option<Arc<Arena>>> = Mutex::new(None);

fn slot() -> MutexGuard<'static, Option<Arc<Arena>>> {
    // Nothing panics while the slot is held.
    ARENA.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Create the process-wide arena with [`ArenaConfig::default`].
pub fn create() -> Result<(), ArenaError> {
    create_with(ArenaConfig::default())
}

/// Create the process-wide arena from `config`.
///
/// Use [`allocator`] for a handle to it.
pub fn create_with(config: ArenaConfig) -> Result<(), ArenaError> {
    let mut slot = slot();
    if slot.is_some() {
        tracing::warn!("global arena create called while one is live");
        return Err(ArenaError::AlreadyInitialized);
    }
    let arena = Arc::new(Arena::new(config)?);
    tracing::info!(
        size = arena.config().size,
        backing = %arena.backing(),
        "global arena created"
    );
    *slot = Some(arena);
    Ok(())
}

/// Destroy the process-wide arena and clear the slot.
pub fn free() -> Result<(), ArenaError> {
    let arena = slot().take().ok_or(ArenaError::NotInitialized)?;
    match Arc::try_unwrap(arena) {
        Ok(mut arena) => arena.destroy()?,
        Err(shared) => {
            tracing::info!(
                handles = Arc::strong_count(&shared) - 1,
                "global arena cleared; storage outlives outstanding handles"
            );
        }
    }
    tracing::info!("global arena freed");
    Ok(())
}

/// Whether the process-wide arena exists.
pub fn initialized() -> bool {
    slot().as_ref().is_some_and(|arena| arena.initialized())
}

/// The process-wide arena.
pub fn allocator() -> Result<Arc<Arena>, ArenaError> {
    slot().clone().ok_or(ArenaError::NotInitialized)
}

/// Reserve `size` bytes from the process-wide arena on the host path.
pub fn allocate(size: usize) -> Result<NonNull<u8>, ArenaError> {
    allocator()?.alloc_host(size)
}

/// Place `T::default()` in the process-wide arena.
pub fn allocate_default<T: Copy + Default>() -> Result<NonNull<T>, ArenaError> {
    allocator()?.host()?.allocate_default()
}

/// Move `value` into the process-wide arena.
pub fn create_unified<T: Copy>(value: T) -> Result<NonNull<T>, ArenaError> {
    allocator()?.host()?.create_unified(value)
}

/// Fill the whole process-wide arena with `value`.
///
/// Fails with [`ArenaError::InUse`] while handles from [`allocator`] are
/// alive.
pub fn memset(value: u8) -> Result<(), ArenaError> {
    let mut slot = slot();
    let shared = slot.as_mut().ok_or(ArenaError::NotInitialized)?;
    let handles = Arc::strong_count(shared) - 1;
    let arena = Arc::get_mut(shared).ok_or_else(|| {
        tracing::warn!(handles, "global arena memset refused while shared");
        ArenaError::InUse { handles }
    })?;
    arena.memset(value)
}
