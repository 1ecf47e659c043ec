//! Property tests for cursor arithmetic on both allocation paths.

use proptest::prelude::*;
use unimem::{Arena, ArenaConfig, ArenaError};

fn base_of(arena: &Arena) -> usize {
    arena.base().unwrap().as_ptr() as usize
}

proptest! {
    #[test]
    fn in_bounds_sequence_is_contiguous_and_increasing(
        sizes in proptest::collection::vec(1usize..512, 1..64),
    ) {
        let total: usize = sizes.iter().sum();
        let arena = Arena::new(ArenaConfig::host(total)).unwrap();
        let base = base_of(&arena);

        let mut expected = base;
        let mut prev = None;
        for &n in &sizes {
            let p = arena.alloc_host(n).unwrap().as_ptr() as usize;
            prop_assert_eq!(p, expected);
            if let Some(prev) = prev {
                prop_assert!(p > prev);
            }
            prev = Some(p);
            expected += n;
        }
        prop_assert_eq!(arena.head(), Some(base + total));
        prop_assert_eq!(arena.stats().remaining, 0);
    }

    #[test]
    fn capacity_check_matches_model(
        capacity in 1usize..2048,
        sizes in proptest::collection::vec(0usize..512, 1..32),
        device_mask in any::<u32>(),
    ) {
        let arena = Arena::new(ArenaConfig::host(capacity)).unwrap();
        let base = base_of(&arena);
        let mut used = 0usize;

        for (i, &n) in sizes.iter().enumerate() {
            let on_device = device_mask & (1 << (i % 32)) != 0;
            let result = if on_device {
                arena.alloc_device(n)
            } else {
                arena.alloc_host(n)
            };
            if used + n <= capacity {
                prop_assert_eq!(result.unwrap().as_ptr() as usize, base + used);
                used += n;
            } else {
                prop_assert_eq!(
                    result.unwrap_err(),
                    ArenaError::CapacityExceeded {
                        requested: n,
                        remaining: capacity - used,
                        capacity,
                    }
                );
            }
            prop_assert_eq!(arena.head(), Some(base + used));
        }
    }

    #[test]
    fn stats_always_sum_to_capacity(
        capacity in 1usize..4096,
        sizes in proptest::collection::vec(0usize..1024, 0..16),
    ) {
        let arena = Arena::new(ArenaConfig::host(capacity)).unwrap();
        for n in sizes {
            let _ = arena.alloc_host(n);
            let stats = arena.stats();
            prop_assert_eq!(stats.used + stats.remaining, stats.capacity);
        }
    }
}
