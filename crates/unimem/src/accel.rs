//! Accelerator runtime probe.
//!
//! Without the `cuda` feature there is never an accelerator: every query
//! reports none and [`synchronize`] is a no-op.

use crate::error::ArenaError;
use crate::raw;

/// Number of usable accelerator devices.
pub fn device_count() -> usize {
    raw::device_count()
}

/// Whether an accelerator-visible arena can be created.
pub fn accelerator_available() -> bool {
    device_count() > 0
}

/// Wait for all outstanding device work.
///
/// Host and device share the arena's pages but not a memory model: call
/// this between a kernel writing arena objects and host code reading them.
pub fn synchronize() -> Result<(), ArenaError> {
    match raw::device_synchronize() {
        0 => Ok(()),
        status => Err(ArenaError::Accelerator { status }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn availability_matches_device_count() {
        assert_eq!(accelerator_available(), device_count() > 0);
    }

    #[cfg(not(feature = "cuda"))]
    #[test]
    fn no_accelerator_without_cuda() {
        assert!(!accelerator_available());
        assert_eq!(synchronize(), Ok(()));
    }
}
