//! The arena: one fixed-size region and its bump cursor.

use std::fmt;
use std::ptr::NonNull;
use std::sync::Mutex;

use crate::alloc::{ArenaAlloc, DeviceAlloc, HostAlloc};
use crate::config::{ArenaConfig, Backing};
use crate::cursor::Cursor;
use crate::error::ArenaError;
use crate::raw::Region;

/// Point-in-time view of an arena's cursor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Total bytes reserved at construction.
    pub capacity: usize,
    /// Bytes handed out so far, including alignment padding.
    pub used: usize,
    /// Bytes left before the cursor reaches the end.
    pub remaining: usize,
}

/// A bump-allocated arena over host or unified memory.
///
/// Lifecycle is `Arena::new` (initialized) → [`Arena::destroy`] or drop
/// (released). Every allocation operation returns
/// [`ArenaError::NotInitialized`] once the arena has been destroyed.
///
/// Allocations are never freed individually. Host callers go through
/// [`Arena::host`] (mutex-serialized), accelerator-side callers through
/// [`Arena::device`] (lock-free atomic). Both share one cursor.
pub struct Arena {
    /// `None` once destroyed.
    region: Option<Region>,
    /// Serializes host-side cursor updates.
    host_lock: Mutex<()>,
    config: ArenaConfig,
}

impl Arena {
    /// Reserve a new arena as described by `config`.
    ///
    /// The region starts zero-filled with the cursor at its first byte.
    pub fn new(config: ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        let backing = config.backing();
        let region = Region::reserve(config.size, backing).inspect_err(|e| {
            tracing::error!(size = config.size, %backing, error = %e, "arena reservation failed");
        })?;
        tracing::debug!(
            size = config.size,
            %backing,
            base = region.base(),
            "arena reserved"
        );
        Ok(Self {
            region: Some(region),
            host_lock: Mutex::new(()),
            config,
        })
    }

    /// The configuration this arena was built from.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Whether the backing storage is live.
    pub fn initialized(&self) -> bool {
        self.region.is_some()
    }

    /// Where the storage lives.
    pub fn backing(&self) -> Backing {
        self.config.backing()
    }

    /// Whether device code can reach this arena.
    pub fn is_accelerator_visible(&self) -> bool {
        self.config.accelerator_visible
    }

    fn region(&self) -> Result<&Region, ArenaError> {
        self.region.as_ref().ok_or(ArenaError::NotInitialized)
    }

    /// Host-side allocation handle.
    pub fn host(&self) -> Result<HostAlloc<'_>, ArenaError> {
        Ok(HostAlloc::new(self.region()?, &self.host_lock))
    }

    /// Accelerator-side allocation handle.
    pub fn device(&self) -> Result<DeviceAlloc<'_>, ArenaError> {
        Ok(DeviceAlloc::new(self.region()?))
    }

    /// Reserve `size` bytes on the host path.
    pub fn alloc_host(&self, size: usize) -> Result<NonNull<u8>, ArenaError> {
        self.host()?.allocate(size)
    }

    /// Reserve `size` bytes on the lock-free device path.
    pub fn alloc_device(&self, size: usize) -> Result<NonNull<u8>, ArenaError> {
        self.device()?.allocate(size)
    }

    /// Fill the whole region, allocated or not, with `value`.
    ///
    /// Meant for initialisation right after construction. Calling it once
    /// objects have been placed overwrites them. Exclusive access keeps
    /// every allocation handle, and so every typed placement, out while
    /// the fill runs.
    pub fn memset(&mut self, value: u8) -> Result<(), ArenaError> {
        self.region
            .as_mut()
            .ok_or(ArenaError::NotInitialized)?
            .fill(value);
        Ok(())
    }

    /// The whole region as bytes, from `base` to `base + size`.
    pub fn region_bytes(&mut self) -> Result<&[u8], ArenaError> {
        self.region
            .as_mut()
            .map(Region::bytes)
            .ok_or(ArenaError::NotInitialized)
    }

    /// The shared cursor.
    pub fn cursor(&self) -> Result<&Cursor, ArenaError> {
        Ok(self.region()?.cursor())
    }

    /// Pointer to the first byte of the region.
    pub fn base(&self) -> Option<NonNull<u8>> {
        let region = self.region.as_ref()?;
        Some(region.ptr_at(region.base()))
    }

    /// Address of the next free byte.
    ///
    /// Raw, so it can lie past [`Arena::tail`] if a kernel overran the
    /// arena through [`DeviceAlloc::as_raw_cursor`].
    pub fn head(&self) -> Option<usize> {
        self.region.as_ref().map(|r| r.cursor().head())
    }

    /// Address one past the last byte.
    pub fn tail(&self) -> Option<usize> {
        self.region.as_ref().map(|r| r.cursor().tail())
    }

    /// Snapshot of capacity and usage. All zero once destroyed.
    pub fn stats(&self) -> ArenaStats {
        match &self.region {
            Some(region) => {
                let cursor = region.cursor();
                // Read head once so used + remaining == capacity.
                let head = cursor.clamped_head();
                ArenaStats {
                    capacity: region.size(),
                    used: head - cursor.base(),
                    remaining: cursor.tail() - head,
                }
            }
            None => ArenaStats::default(),
        }
    }

    /// Release the backing storage.
    ///
    /// Pointers previously handed out dangle afterwards. A second call
    /// returns [`ArenaError::NotInitialized`].
    pub fn destroy(&mut self) -> Result<(), ArenaError> {
        let region = self.region.take().ok_or(ArenaError::NotInitialized)?;
        tracing::debug!(
            size = region.size(),
            backing = %region.backing(),
            "arena released"
        );
        drop(region);
        Ok(())
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        if self.initialized() {
            let _ = self.destroy();
        }
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("config", &self.config)
            .field("initialized", &self.initialized())
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    use super::*;

    fn host_arena(size: usize) -> Arena {
        Arena::new(ArenaConfig::host(size)).unwrap()
    }

    #[test]
    fn new_arena_starts_at_base() {
        let arena = host_arena(1024);
        let base = arena.base().unwrap().as_ptr() as usize;
        assert_eq!(arena.head(), Some(base));
        assert_eq!(arena.tail(), Some(base + 1024));
        assert_eq!(
            arena.stats(),
            ArenaStats {
                capacity: 1024,
                used: 0,
                remaining: 1024,
            }
        );
    }

    #[test]
    fn consecutive_allocations_are_adjacent() {
        let arena = host_arena(1024);
        let base = arena.base().unwrap().as_ptr() as usize;
        let p = arena.alloc_host(64).unwrap().as_ptr() as usize;
        assert!(base <= p);
        assert!(p + 64 <= arena.tail().unwrap());
        let q = arena.alloc_host(32).unwrap().as_ptr() as usize;
        assert_eq!(q, p + 64);
        assert_eq!(arena.head(), Some(base + 96));
    }

    #[test]
    fn zero_size_construction_fails() {
        let result = Arena::new(ArenaConfig::host(0));
        assert!(matches!(result, Err(ArenaError::InvalidConfig { .. })));
    }

    #[cfg(not(feature = "cuda"))]
    #[test]
    fn unified_without_accelerator_fails() {
        let result = Arena::new(ArenaConfig::unified(1024));
        assert!(matches!(result, Err(ArenaError::AcceleratorUnavailable)));
    }

    #[test]
    fn overflow_is_reported_and_head_kept() {
        let arena = host_arena(100);
        arena.alloc_host(90).unwrap();
        let head = arena.head();
        let err = arena.alloc_device(11).unwrap_err();
        assert_eq!(
            err,
            ArenaError::CapacityExceeded {
                requested: 11,
                remaining: 10,
                capacity: 100,
            }
        );
        assert_eq!(arena.head(), head);
        assert!(arena.alloc_host(10).is_ok());
        assert!(arena.alloc_host(1).is_err());
    }

    #[test]
    fn memset_fills_unallocated_tail_too() {
        let mut arena = host_arena(512);
        arena.alloc_host(16).unwrap();
        arena.memset(0xAB).unwrap();
        let bytes = arena.region_bytes().unwrap();
        assert_eq!(bytes.len(), 512);
        assert!(bytes.iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn memset_overwrites_placed_objects() {
        let mut arena = host_arena(64);
        let p = arena.host().unwrap().create_unified(7u64).unwrap();
        arena.memset(0xFF).unwrap();
        // SAFETY: p was placed above and the fill has completed.
        assert_eq!(unsafe { p.as_ptr().read() }, u64::MAX);
    }

    #[test]
    fn memset_after_shared_handles_are_dropped() {
        let mut shared = Arc::new(host_arena(64));
        let worker = Arc::clone(&shared);
        thread::spawn(move || {
            worker.device().unwrap().create_unified(7u64).unwrap();
        })
        .join()
        .unwrap();
        // The worker's handle is gone, so the fill is exclusive.
        Arc::get_mut(&mut shared).unwrap().memset(0).unwrap();
        assert_eq!(shared.stats().used, 8);
    }

    #[test]
    fn kernel_overrun_is_reported_as_full() {
        let arena = host_arena(64);
        let raw = arena.device().unwrap().as_raw_cursor();
        // SAFETY: the cursor is repr(C) with an AtomicUsize head as its
        // first field, and the arena outlives this reference.
        let head = unsafe { &*raw.cast::<AtomicUsize>() };
        head.fetch_add(128, Ordering::SeqCst);

        assert_eq!(
            arena.stats(),
            ArenaStats {
                capacity: 64,
                used: 64,
                remaining: 0,
            }
        );
        assert_eq!(
            arena.alloc_host(1).unwrap_err(),
            ArenaError::CapacityExceeded {
                requested: 1,
                remaining: 0,
                capacity: 64,
            }
        );
        assert!(arena.alloc_device(1).is_err());
        assert!(arena.cursor().unwrap().head() > arena.tail().unwrap());
    }

    #[test]
    fn region_starts_zeroed() {
        let mut arena = host_arena(256);
        assert!(arena.region_bytes().unwrap().iter().all(|&b| b == 0));
    }

    #[test]
    fn destroy_transitions_to_uninitialized() {
        let mut arena = host_arena(64);
        assert!(arena.initialized());
        arena.destroy().unwrap();
        assert!(!arena.initialized());
        assert_eq!(arena.base(), None);
        assert_eq!(arena.stats(), ArenaStats::default());
        assert_eq!(arena.alloc_host(1), Err(ArenaError::NotInitialized));
        assert_eq!(arena.alloc_device(1), Err(ArenaError::NotInitialized));
        assert_eq!(arena.memset(0), Err(ArenaError::NotInitialized));
        assert!(arena.region_bytes().is_err());
    }

    #[test]
    fn second_destroy_is_an_error() {
        let mut arena = host_arena(64);
        arena.destroy().unwrap();
        assert_eq!(arena.destroy(), Err(ArenaError::NotInitialized));
    }

    #[test]
    fn config_is_preserved() {
        let arena = host_arena(4096);
        assert_eq!(arena.config().size, 4096);
        assert_eq!(arena.backing(), Backing::Host);
        assert!(!arena.is_accelerator_visible());
    }

    #[test]
    fn debug_shows_stats() {
        let arena = host_arena(128);
        arena.alloc_host(8).unwrap();
        let text = format!("{arena:?}");
        assert!(text.contains("used: 8"));
    }
}
