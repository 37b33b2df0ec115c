//! accelhal - LIS331DL accelerometer sensor HAL
//!
//! Finds the accelerometer's evdev node, turns its per-axis `EV_ABS` events
//! into calibrated readings, and lets a control thread interrupt a poller
//! that is blocked waiting for data.

pub mod activation;
pub mod decoder;
pub mod error;
pub mod hal;
pub mod handle;
pub mod lifecycle;
pub mod locator;
pub mod poller;
pub mod sensor;
pub mod settings;
pub mod wake;

pub use decoder::Reading;
pub use error::{SensorError, SensorResult};
pub use hal::{HalDevice, SensorsModule};
pub use handle::{DataSourceHandle, DeviceHandle};
pub use lifecycle::{SensorsControl, SensorsData};
pub use locator::{AbsCapabilities, CapabilityProbe, DeviceLocator, EvdevProbe, ProbedDevice};
pub use poller::PollOutcome;
pub use settings::HalSettings;
pub use wake::Waker;
