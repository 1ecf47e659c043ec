//! Arena configuration parameters.

use std::fmt;

use crate::error::ArenaError;

/// Base alignment of every arena region, in bytes.
///
/// Matches the alignment `cudaMallocManaged` guarantees, so host and
/// unified arenas hand out identically aligned first allocations.
pub const ARENA_ALIGN: usize = 256;

/// Configuration for an [`Arena`](crate::Arena).
///
/// These are the only two knobs the allocator recognises. Validated at
/// construction; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Total bytes reserved for the arena.
    ///
    /// Default: 64MB. Must be non-zero.
    pub size: usize,

    /// Whether the region must be reachable by the accelerator.
    ///
    /// When `true` the arena is backed by unified memory, which requires
    /// the `cuda` feature and an attached device.
    pub accelerator_visible: bool,
}

impl ArenaConfig {
    /// Default arena size: 64MB.
    pub const DEFAULT_SIZE: usize = 64 * 1024 * 1024;

    /// Create a host-only config of the given size.
    pub fn host(size: usize) -> Self {
        Self {
            size,
            accelerator_visible: false,
        }
    }

    /// Create an accelerator-visible config of the given size.
    pub fn unified(size: usize) -> Self {
        Self {
            size,
            accelerator_visible: true,
        }
    }

    /// The kind of memory this config asks for.
    pub fn backing(&self) -> Backing {
        if self.accelerator_visible {
            Backing::Unified
        } else {
            Backing::Host
        }
    }

    /// Check that the config describes a reservable region.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.size == 0 {
            return Err(ArenaError::InvalidConfig {
                reason: "size must be non-zero".into(),
            });
        }
        // The reservation adds an ARENA_ALIGN header and must still fit a Layout.
        if self.size > isize::MAX as usize - 2 * ARENA_ALIGN {
            return Err(ArenaError::InvalidConfig {
                reason: format!("size {} exceeds the addressable maximum", self.size),
            });
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::host(Self::DEFAULT_SIZE)
    }
}

/// Where an arena's storage lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Backing {
    /// Ordinary host heap memory.
    Host,
    /// Unified memory addressable by both host and accelerator.
    Unified,
}

impl fmt::Display for Backing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::Unified => write!(f, "unified"),
        }
    }
}
