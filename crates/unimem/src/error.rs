//! Arena error types.

use std::error::Error;
use std::fmt;

use crate::config::Backing;

/// Errors that can occur while constructing or allocating from an arena.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The backing reservation (host heap or unified memory) failed.
    ReservationFailed {
        /// Number of bytes requested.
        requested: usize,
        /// Which kind of memory was being reserved.
        backing: Backing,
    },
    /// Accelerator visibility was requested but no accelerator is usable,
    /// either because none is attached or because the crate was built
    /// without the `cuda` feature.
    AcceleratorUnavailable,
    /// An accelerator runtime call returned a non-zero status.
    Accelerator {
        /// The runtime's status code.
        status: i32,
    },
    /// The configuration cannot describe a valid arena.
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
    /// The request would advance the cursor past the end of the arena.
    CapacityExceeded {
        /// Number of bytes requested (including alignment padding).
        requested: usize,
        /// Bytes left between the cursor and the end of the arena.
        remaining: usize,
        /// Total arena capacity in bytes.
        capacity: usize,
    },
    /// The arena has not been created yet, or was already destroyed.
    NotInitialized,
    /// A singleton arena already exists.
    AlreadyInitialized,
    /// The operation needs exclusive access but other handles to the arena
    /// are still alive.
    InUse {
        /// Number of other live handles.
        handles: usize,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReservationFailed { requested, backing } => {
                write!(f, "failed to reserve {requested} bytes of {backing} memory")
            }
            Self::AcceleratorUnavailable => {
                write!(f, "accelerator-visible arena requested but no accelerator is available")
            }
            Self::Accelerator { status } => {
                write!(f, "accelerator runtime call failed with status {status}")
            }
            Self::InvalidConfig { reason } => write!(f, "invalid arena config: {reason}"),
            Self::CapacityExceeded {
                requested,
                remaining,
                capacity,
            } => {
                write!(
                    f,
                    "arena capacity exceeded: requested {requested} bytes, {remaining} of {capacity} bytes remaining"
                )
            }
            Self::NotInitialized => write!(f, "arena is not initialized"),
            Self::AlreadyInitialized => write!(f, "arena is already initialized"),
            Self::InUse { handles } => {
                write!(f, "arena needs exclusive access but {handles} other handle(s) are live")
            }
        }
    }
}

impl Error for ArenaError {}
