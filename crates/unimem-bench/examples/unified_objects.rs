//! Place objects in an arena and read them back.
//!
//! Uses unified memory when an accelerator is attached (build with
//! `--features unimem/cuda`), host memory otherwise. Set `RUST_LOG=debug`
//! to see arena lifecycle events.

use tracing_subscriber::EnvFilter;
use unimem::{accel, global, ArenaConfig};

#[derive(Clone, Copy, Debug)]
struct Node {
    value: f32,
    next: Option<usize>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== unimem unified objects ===\n");

    let config = ArenaConfig {
        size: 1 << 20,
        accelerator_visible: accel::accelerator_available(),
    };
    println!("[0] backing: {}", config.backing());

    global::create_with(config).unwrap();
    global::memset(0).unwrap();
    let arena = global::allocator().unwrap();

    // Build a short linked list; links are arena addresses.
    let mut prev = None;
    let mut nodes = Vec::new();
    for i in 0..5 {
        let node = global::create_unified(Node {
            value: i as f32 * 1.5,
            next: prev,
        })
        .unwrap();
        prev = Some(node.as_ptr() as usize);
        nodes.push(node);
    }
    println!("[1] placed {} nodes", nodes.len());

    let counter = global::allocate_default::<u64>().unwrap();
    println!("[2] counter at {:p}", counter.as_ptr());

    accel::synchronize().unwrap();
    for node in &nodes {
        // SAFETY: each node was placed above and is not aliased mutably.
        let node = unsafe { node.as_ptr().read() };
        println!("    value = {:>4}, next = {:?}", node.value, node.next);
    }

    let stats = arena.stats();
    println!(
        "[3] used {} of {} bytes ({} remaining)",
        stats.used, stats.capacity, stats.remaining
    );

    drop(arena);
    global::free().unwrap();
    println!("[4] freed; initialized = {}", global::initialized());
}
