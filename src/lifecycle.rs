//! Control and data devices handed to the host framework
//!
//! `SensorsControl` owns discovery, the wake channel and the activation mask.
//! `SensorsData` owns the poller's copy of the device. They share nothing but
//! duplicated descriptors, so each can live on its own thread and be closed
//! in any order.

use crate::activation::{self, ActivationMask};
use crate::error::{SensorError, SensorResult};
use crate::handle::{DataSourceHandle, DeviceHandle};
use crate::locator::DeviceLocator;
use crate::poller::{PollOutcome, poll_device};
use crate::wake::{WAKE_SOURCE, WakeChannel, WakeReceiver, Waker};
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct SensorsControl {
    locator: DeviceLocator,
    wake: Option<WakeChannel>,
    sensor: Option<DeviceHandle>,
    active: ActivationMask,
    wake_byte: u8,
}

impl SensorsControl {
    pub fn new(locator: DeviceLocator) -> Self {
        Self {
            locator,
            wake: None,
            sensor: None,
            active: ActivationMask::new(),
            wake_byte: WAKE_SOURCE,
        }
    }

    /// Use `byte` as the wake sentinel for channels created from now on
    pub fn with_wake_byte(mut self, byte: u8) -> Self {
        self.wake_byte = byte;
        self
    }

    fn ensure_wake_channel(&mut self) -> SensorResult<&WakeChannel> {
        let channel = match self.wake.take() {
            Some(channel) => channel,
            None => {
                debug!("creating wake channel (sentinel {:#04x})", self.wake_byte);
                WakeChannel::with_sentinel(self.wake_byte)?
            }
        };
        Ok(self.wake.insert(channel))
    }

    /// Locate the accelerometer and hand out a data-path copy of it.
    ///
    /// The wake channel is created on first use and reused afterwards.
    pub fn open_data_source(&mut self) -> SensorResult<DataSourceHandle> {
        let receiver = match self.ensure_wake_channel()?.receiver() {
            Ok(rx) => rx,
            Err(e) => {
                warn!("Accelerometer: could not duplicate wake channel: {}", e);
                return Err(e);
            }
        };

        let sensor = self.locator.locate()?;
        let data_copy = sensor.try_clone()?;
        if self.sensor.replace(sensor).is_some() {
            debug!("replaced previously opened control-side device");
        }
        info!("Accelerometer: data source {:?} ready", data_copy.path());
        Ok(DataSourceHandle::new(data_copy, receiver))
    }

    pub fn activate(&mut self, handle: u32, enabled: bool) -> SensorResult<bool> {
        self.active.set_active(handle, enabled)
    }

    pub fn set_delay(&mut self, ms: i32) -> SensorResult<()> {
        activation::set_delay(ms)
    }

    /// Make a blocked (or the next) `SensorsData::poll` return `Cancelled`.
    ///
    /// A no-op when the wake channel was never created.
    pub fn wake(&self) -> SensorResult<()> {
        match &self.wake {
            Some(channel) => channel.signal().inspect_err(|e| {
                warn!("control wake failed: {}", e);
            }),
            None => Ok(()),
        }
    }

    /// Detached wake handle for another thread, if the channel exists
    pub fn waker(&self) -> SensorResult<Option<Waker>> {
        self.wake.as_ref().map(WakeChannel::waker).transpose()
    }

    pub fn activation(&self) -> ActivationMask {
        self.active
    }

    pub fn is_open(&self) -> bool {
        self.sensor.is_some()
    }

    /// Release the wake channel and the control-side device. Safe to repeat.
    pub fn close(&mut self) {
        if self.wake.take().is_some() {
            debug!("wake channel released");
        }
        if let Some(sensor) = self.sensor.take() {
            debug!("control-side device {:?} released", sensor.path());
        }
    }
}

impl Drop for SensorsControl {
    fn drop(&mut self) {
        self.close();
    }
}

#[derive(Debug, Default)]
pub struct SensorsData {
    device: Option<DeviceHandle>,
    wake: Option<WakeReceiver>,
}

impl SensorsData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of the descriptors in `handle`
    pub fn data_open(&mut self, handle: DataSourceHandle) {
        let DataSourceHandle { device, wake } = handle;
        info!("data path reading from {:?}", device.path());
        self.device = Some(device);
        self.wake = Some(wake);
    }

    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }

    /// Block until a reading, a wake request, or a non-axis event
    pub fn poll(&mut self) -> SensorResult<PollOutcome> {
        let device = self.device.as_ref().ok_or(SensorError::NotOpen)?;
        poll_device(device, &mut self.wake)
    }

    /// Release the data-side descriptors only. Safe to repeat.
    pub fn data_close(&mut self) {
        if let Some(device) = self.device.take() {
            debug!("data-side device {:?} released", device.path());
        }
        self.wake = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unlocatable() -> SensorsControl {
        let root = std::env::temp_dir().join("accelhal-missing");
        SensorsControl::new(DeviceLocator::new(root.join("input"), root.join("sys")))
    }

    #[test]
    fn test_close_without_open() {
        let mut control = unlocatable();
        control.close();
        control.close();
        assert!(!control.is_open());
    }

    #[test]
    fn test_wake_without_channel_is_noop() {
        let control = unlocatable();
        assert!(control.wake().is_ok());
        assert!(control.waker().unwrap().is_none());
    }

    #[test]
    fn test_failed_discovery_keeps_wake_channel() {
        let mut control = unlocatable();
        assert!(matches!(
            control.open_data_source(),
            Err(SensorError::DeviceNotFound { .. })
        ));
        assert!(!control.is_open());
        assert!(control.waker().unwrap().is_some());
        assert!(control.wake().is_ok());
    }

    #[test]
    fn test_poll_before_open() {
        let mut data = SensorsData::new();
        assert!(matches!(data.poll(), Err(SensorError::NotOpen)));
        data.data_close();
        data.data_close();
    }
}
