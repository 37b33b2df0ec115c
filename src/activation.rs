//! Enabled-sensor bookkeeping
//!
//! The LIS331DL has no software power gate here: once the input node is
//! open it streams regardless of this mask. The mask only tracks what the
//! host framework asked for.

use crate::error::{SensorError, SensorResult};
use crate::sensor::find_sensor;
use tracing::{debug, info};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ActivationMask {
    bits: u32,
}

impl ActivationMask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn is_active(&self, handle: u32) -> bool {
        handle < u32::BITS && self.bits & (1 << handle) != 0
    }

    /// Enable or disable `handle`; returns whether the mask changed
    pub fn set_active(&mut self, handle: u32, enabled: bool) -> SensorResult<bool> {
        let sensor = find_sensor(handle).ok_or(SensorError::InvalidHandle(handle))?;

        let mask = 1u32 << handle;
        let requested = if enabled { mask } else { 0 };
        let new_bits = (self.bits & !mask) | requested;
        let changed = self.bits ^ new_bits;
        if changed == 0 {
            return Ok(false);
        }

        self.bits = new_bits;
        if enabled {
            info!("Accelerometer: activating {}", sensor.name);
        } else {
            info!("Accelerometer: deactivating {}", sensor.name);
        }
        Ok(true)
    }
}

/// Requested sampling delay; accepted but the hardware rate is fixed
pub fn set_delay(ms: i32) -> SensorResult<()> {
    debug!("Accelerometer: ignoring requested delay of {} ms", ms);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::ACCELEROMETER_HANDLE;

    #[test]
    fn test_enable_twice() {
        let mut mask = ActivationMask::new();
        assert!(mask.set_active(ACCELEROMETER_HANDLE, true).unwrap());
        assert!(!mask.set_active(ACCELEROMETER_HANDLE, true).unwrap());
        assert!(mask.is_active(ACCELEROMETER_HANDLE));
    }

    #[test]
    fn test_alternating_always_changes() {
        let mut mask = ActivationMask::new();
        for i in 0..6 {
            assert!(mask.set_active(ACCELEROMETER_HANDLE, i % 2 == 0).unwrap());
        }
        assert_eq!(mask.bits(), 0);
    }

    #[test]
    fn test_disable_when_inactive_is_unchanged() {
        let mut mask = ActivationMask::new();
        assert!(!mask.set_active(ACCELEROMETER_HANDLE, false).unwrap());
    }

    #[test]
    fn test_unknown_handle_rejected() {
        let mut mask = ActivationMask::new();
        assert!(matches!(
            mask.set_active(5, true),
            Err(SensorError::InvalidHandle(5))
        ));
        assert!(matches!(
            mask.set_active(40, true),
            Err(SensorError::InvalidHandle(40))
        ));
        assert_eq!(mask.bits(), 0);
    }

    #[test]
    fn test_delay_is_accepted() {
        assert!(set_delay(20).is_ok());
        assert!(set_delay(-1).is_ok());
    }
}
