//! Host framework entry points
//!
//! The host looks the module up by id, reads the sensor list, then opens a
//! `control` device and a `data` device by name.

use crate::error::{SensorError, SensorResult};
use crate::lifecycle::{SensorsControl, SensorsData};
use crate::sensor::{SensorDescriptor, sensor_list};
use crate::settings::HalSettings;

pub const SENSORS_HARDWARE_MODULE_ID: &str = "sensors";
pub const SENSORS_HARDWARE_CONTROL: &str = "control";
pub const SENSORS_HARDWARE_DATA: &str = "data";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub author: &'static str,
    pub version_major: u16,
    pub version_minor: u16,
}

pub const MODULE_INFO: ModuleInfo = ModuleInfo {
    id: SENSORS_HARDWARE_MODULE_ID,
    name: "LIS331DL accelerometer sensors Module",
    author: "Aleksandar Milacic",
    version_major: 1,
    version_minor: 0,
};

/// A device opened by name
#[derive(Debug)]
pub enum HalDevice {
    Control(SensorsControl),
    Data(SensorsData),
}

/// The sensors module as seen by the host
#[derive(Debug, Clone, Copy, Default)]
pub struct SensorsModule;

impl SensorsModule {
    pub fn info(&self) -> &'static ModuleInfo {
        &MODULE_INFO
    }

    pub fn sensors_list(&self) -> &'static [SensorDescriptor] {
        sensor_list()
    }

    /// Open `control` or `data`; only the control device discovers hardware
    pub fn open(&self, name: &str, settings: &HalSettings) -> SensorResult<HalDevice> {
        match name {
            SENSORS_HARDWARE_CONTROL => Ok(HalDevice::Control(settings.control())),
            SENSORS_HARDWARE_DATA => Ok(HalDevice::Data(SensorsData::new())),
            other => Err(SensorError::InvalidDeviceName(other.to_string())),
        }
    }
}
