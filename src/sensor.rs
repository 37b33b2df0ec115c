//! Static sensor metadata exported to the host framework

/// Standard gravity in m/s²
pub const GRAVITY_EARTH: f32 = 9.80665;

/// Sensor type tag for accelerometers
pub const SENSOR_TYPE_ACCELEROMETER: u32 = 1;

/// Handle the host uses to address the accelerometer
pub const ACCELEROMETER_HANDLE: u32 = SENSOR_TYPE_ACCELEROMETER;

/// Kind of physical quantity a reading carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SensorType {
    Accelerometer = SENSOR_TYPE_ACCELEROMETER,
}

/// Accuracy tag attached to every reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i8)]
pub enum SensorStatus {
    Unreliable = 0,
    AccuracyLow = 1,
    AccuracyMedium = 2,
    AccuracyHigh = 3,
}

/// One row of the sensor list
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorDescriptor {
    pub name: &'static str,
    pub vendor: &'static str,
    pub version: i32,
    pub handle: u32,
    pub sensor_type: SensorType,
    /// m/s²
    pub max_range: f32,
    /// m/s² per LSB
    pub resolution: f32,
    /// mA
    pub power: f32,
}

// LIS331DL in ±2.3g mode, 8 bit samples. Rated max current is 0.3mA.
static SENSOR_LIST: [SensorDescriptor; 1] = [SensorDescriptor {
    name: "LIS331DL 3-axis Accelerometer",
    vendor: "STMicroelectronics",
    version: 1,
    handle: ACCELEROMETER_HANDLE,
    sensor_type: SensorType::Accelerometer,
    max_range: GRAVITY_EARTH * 2.3,
    resolution: (GRAVITY_EARTH * 2.3) / 128.0,
    power: 0.4,
}];

/// All sensors this HAL exposes
pub fn sensor_list() -> &'static [SensorDescriptor] {
    &SENSOR_LIST
}

/// Look up a descriptor by the handle the host passes to `activate`
pub fn find_sensor(handle: u32) -> Option<&'static SensorDescriptor> {
    SENSOR_LIST.iter().find(|s| s.handle == handle)
}
