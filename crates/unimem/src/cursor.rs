//! The shared bump cursor.
//!
//! A [`Cursor`] holds three absolute addresses: `base` (first data byte),
//! `head` (next free byte) and `tail` (one past the last byte). The struct
//! is `repr(C)` with `head` first.
//!
//! Two kinds of caller advance `head`, and they may be mixed on one arena:
//!
//! - Rust callers (host and device handles) go through [`Cursor::bump`],
//!   a checked compare-and-swap loop that never moves `head` past `tail`.
//! - Kernels handed a `*const Cursor` add to the first machine word with a
//!   plain atomic add. That path has no bound, so an overrunning kernel
//!   can leave `head > tail`.
//!
//! Only the compare-and-swap path enforces `head <= tail`. Readers clamp
//! `head` to `tail`, so an overrun arena reports itself full rather than
//! producing nonsense sizes.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::ArenaError;

/// Bump cursor stored in the arena header.
#[repr(C)]
#[derive(Debug)]
pub struct Cursor {
    head: AtomicUsize,
    tail: usize,
    base: usize,
}

impl Cursor {
    pub(crate) fn new(base: usize, size: usize) -> Self {
        Self {
            head: AtomicUsize::new(base),
            tail: base + size,
            base,
        }
    }

    /// Next free address.
    pub fn head(&self) -> usize {
        self.head.load(Ordering::Acquire)
    }

    /// One past the last usable address.
    pub fn tail(&self) -> usize {
        self.tail
    }

    /// First usable address.
    pub fn base(&self) -> usize {
        self.base
    }

    /// `head`, clamped to `tail` in case a kernel overran the arena.
    pub fn clamped_head(&self) -> usize {
        self.head().min(self.tail)
    }

    /// Bytes handed out so far, at most the capacity.
    pub fn used(&self) -> usize {
        self.clamped_head() - self.base
    }

    /// Bytes left before `tail`.
    pub fn remaining(&self) -> usize {
        self.tail - self.clamped_head()
    }

    /// Atomically reserve `size` bytes starting at the next multiple of
    /// `align` (a power of two) at or after `head`.
    ///
    /// Returns the start of the reserved range. Lock-free: concurrent
    /// callers each observe a distinct pre-advance value. On failure `head`
    /// is left untouched.
    pub(crate) fn bump(&self, size: usize, align: usize) -> Result<usize, ArenaError> {
        debug_assert!(align.is_power_of_two());
        let tail = self.tail;
        let advance = |head: usize| -> Option<usize> {
            let start = align_up(head, align)?;
            let end = start.checked_add(size)?;
            (end <= tail).then_some(end)
        };

        match self
            .head
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, advance)
        {
            // `advance` succeeded on `prev`, so aligning it cannot overflow.
            Ok(prev) => Ok(align_up(prev, align).unwrap_or(prev)),
            Err(current) => Err(ArenaError::CapacityExceeded {
                requested: align_up(current, align)
                    .map_or(usize::MAX, |start| (start - current).saturating_add(size)),
                remaining: tail.saturating_sub(current),
                capacity: tail - self.base,
            }),
        }
    }
}

fn align_up(addr: usize, align: usize) -> Option<usize> {
    Some(addr.checked_add(align - 1)? & !(align - 1))
}
