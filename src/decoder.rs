//! Raw event decoding and per-axis sample accumulation
//!
//! The LIS331DL driver reports each axis as its own `EV_ABS` event. A reading
//! is only complete once X, Y and Z have all been seen since the last one.

use crate::error::{SensorError, SensorResult};
use crate::sensor::{GRAVITY_EARTH, SensorStatus, SensorType};
use evdev::{AbsoluteAxisType, InputEvent, InputEventKind};
use std::time::SystemTime;

/// Raw LSB to m/s² (the driver reports 64 LSB per g)
pub const CONVERT: f32 = GRAVITY_EARTH / 64.0;

/// Size of one `struct input_event` record on this platform
pub const EVENT_SIZE: usize = std::mem::size_of::<libc::input_event>();

/// Decode one record read from an evdev node
pub fn decode_event(buf: &[u8]) -> SensorResult<InputEvent> {
    if buf.len() < EVENT_SIZE {
        return Err(SensorError::ShortRead {
            expected: EVENT_SIZE,
            actual: buf.len(),
        });
    }
    // SAFETY: input_event is plain old data and buf holds at least EVENT_SIZE bytes.
    let raw = unsafe { std::ptr::read_unaligned(buf.as_ptr().cast::<libc::input_event>()) };
    Ok(InputEvent::from(raw))
}

/// Serialize an event the way the kernel writes it
pub fn encode_event(event: &InputEvent) -> [u8; EVENT_SIZE] {
    let raw: &libc::input_event = event.as_ref();
    let mut out = [0u8; EVENT_SIZE];
    // SAFETY: both regions are EVENT_SIZE bytes and do not overlap.
    unsafe {
        std::ptr::copy_nonoverlapping(
            (raw as *const libc::input_event).cast::<u8>(),
            out.as_mut_ptr(),
            EVENT_SIZE,
        );
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn from_abs(code: AbsoluteAxisType) -> Option<Self> {
        match code {
            AbsoluteAxisType::ABS_X => Some(Axis::X),
            AbsoluteAxisType::ABS_Y => Some(Axis::Y),
            AbsoluteAxisType::ABS_Z => Some(Axis::Z),
            _ => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    fn bit(self) -> u8 {
        1 << self.index()
    }
}

const ALL_AXES: u8 = 0b111;

/// One complete accelerometer sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// m/s²
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub status: SensorStatus,
    pub sensor_type: SensorType,
    /// Kernel timestamp of the event that completed the sample
    pub timestamp: SystemTime,
}

/// Result of feeding one event into the accumulator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Keep reading, the sample is not complete yet
    Pending,
    Complete(Reading),
    /// A non-axis event arrived; hand control back to the caller
    Yield,
}

/// Per-axis values collected since the last complete sample
#[derive(Debug, Default, Clone)]
pub struct AxisAccumulator {
    values: [f32; 3],
    observed: u8,
}

impl AxisAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// True when no axis was seen since the last reset
    pub fn is_empty(&self) -> bool {
        self.observed == 0
    }

    pub fn feed(&mut self, event: &InputEvent) -> Step {
        let InputEventKind::AbsAxis(code) = event.kind() else {
            self.reset();
            return Step::Yield;
        };

        if let Some(axis) = Axis::from_abs(code) {
            self.values[axis.index()] = event.value() as f32 * CONVERT;
            self.observed |= axis.bit();
        }

        if self.observed != ALL_AXES {
            return Step::Pending;
        }

        let [x, y, z] = self.values;
        self.reset();
        Step::Complete(Reading {
            x,
            y,
            z,
            status: SensorStatus::AccuracyHigh,
            sensor_type: SensorType::Accelerometer,
            timestamp: event.timestamp(),
        })
    }
}
