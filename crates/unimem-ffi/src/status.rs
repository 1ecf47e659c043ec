//! C-compatible status codes.

use unimem::ArenaError;

/// Status code returned by every fallible FFI function.
///
/// `Ok` = 0, all errors are negative. Values are ABI-stable.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnimemStatus {
    /// Success.
    Ok = 0,
    /// An argument is null or otherwise invalid.
    InvalidArgument = -1,
    /// No arena exists (never created, or already freed).
    NotInitialized = -2,
    /// An arena already exists.
    AlreadyInitialized = -3,
    /// The request does not fit in the remaining capacity.
    CapacityExceeded = -4,
    /// Reserving the backing memory failed.
    ReservationFailed = -5,
    /// Accelerator visibility requested without an accelerator.
    AcceleratorUnavailable = -6,
    /// An accelerator runtime call failed.
    AcceleratorError = -7,
    /// The arena configuration is invalid (e.g. zero size).
    InvalidConfig = -8,
    /// The operation needs exclusive access but the arena is shared.
    InUse = -9,
    /// A Rust panic was caught at the FFI boundary.
    Panicked = -128,
}

impl From<&ArenaError> for UnimemStatus {
    fn from(e: &ArenaError) -> Self {
        match e {
            ArenaError::ReservationFailed { .. } => UnimemStatus::ReservationFailed,
            ArenaError::AcceleratorUnavailable => UnimemStatus::AcceleratorUnavailable,
            ArenaError::Accelerator { .. } => UnimemStatus::AcceleratorError,
            ArenaError::InvalidConfig { .. } => UnimemStatus::InvalidConfig,
            ArenaError::CapacityExceeded { .. } => UnimemStatus::CapacityExceeded,
            ArenaError::NotInitialized => UnimemStatus::NotInitialized,
            ArenaError::AlreadyInitialized => UnimemStatus::AlreadyInitialized,
            ArenaError::InUse { .. } => UnimemStatus::InUse,
        }
    }
}
