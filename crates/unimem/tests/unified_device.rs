//! Unified-memory arenas on real hardware. Skipped when no accelerator is
//! attached.

#![cfg(feature = "cuda")]

use std::ptr;
use std::thread;

use unimem::{accel, Arena, ArenaConfig, Backing};

#[test]
fn unified_arena_device_path_yields_disjoint_ranges() {
    if !accel::accelerator_available() {
        eprintln!("no accelerator attached; skipping");
        return;
    }

    let threads = 16;
    let chunk = 64;
    let mut arena = Arena::new(ArenaConfig::unified(threads * chunk)).unwrap();
    assert_eq!(arena.backing(), Backing::Unified);
    let base = arena.base().unwrap().as_ptr() as usize;

    thread::scope(|s| {
        for t in 0..threads {
            let arena = &arena;
            s.spawn(move || {
                let p = arena.alloc_device(chunk).unwrap();
                // SAFETY: [p, p + chunk) was reserved for this thread alone.
                unsafe { ptr::write_bytes(p.as_ptr(), t as u8 + 1, chunk) };
            });
        }
    });
    accel::synchronize().unwrap();

    let bytes = arena.region_bytes().unwrap();
    let mut owners: Vec<u8> = bytes.chunks(chunk).map(|c| c[0]).collect();
    for c in bytes.chunks(chunk) {
        assert!(c.iter().all(|&b| b == c[0]));
    }
    owners.sort_unstable();
    assert_eq!(owners, (1..=threads as u8).collect::<Vec<_>>());
    assert_eq!(arena.head(), Some(base + threads * chunk));
}

#[test]
fn unified_arena_memset_and_release() {
    if !accel::accelerator_available() {
        eprintln!("no accelerator attached; skipping");
        return;
    }

    let mut arena = Arena::new(ArenaConfig::unified(4096)).unwrap();
    assert!(arena.is_accelerator_visible());
    arena.memset(0xEE).unwrap();
    assert!(arena.region_bytes().unwrap().iter().all(|&b| b == 0xEE));
    arena.destroy().unwrap();
    assert!(!arena.initialized());
}
