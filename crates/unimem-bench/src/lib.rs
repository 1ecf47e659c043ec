//! Benchmark workloads for the unimem arena.
//!
//! - [`bench_arena`]: a host arena sized for a fixed number of chunks
//! - [`fill_concurrently`]: drain an arena from several threads

#![deny(rustdoc::broken_intra_doc_links)]

use std::thread;

use unimem::{Arena, ArenaConfig};

/// Build a host arena with room for exactly `chunks` allocations of
/// `chunk` bytes.
pub fn bench_arena(chunks: usize, chunk: usize) -> Arena {
    Arena::new(ArenaConfig::host(chunks * chunk)).unwrap()
}

/// Allocate `chunk`-byte pieces from `threads` threads until the arena is
/// full. Odd-numbered threads use the device path. Returns how many
/// allocations succeeded.
pub fn fill_concurrently(arena: &Arena, threads: usize, chunk: usize) -> usize {
    thread::scope(|s| {
        let workers: Vec<_> = (0..threads)
            .map(|t| {
                s.spawn(move || {
                    let mut granted = 0;
                    loop {
                        let result = if t % 2 == 1 {
                            arena.alloc_device(chunk)
                        } else {
                            arena.alloc_host(chunk)
                        };
                        if result.is_err() {
                            return granted;
                        }
                        granted += 1;
                    }
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).sum()
    })
}
