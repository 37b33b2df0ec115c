//! Error types for the accelerometer HAL

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the sensor HAL
#[derive(Error, Debug)]
pub enum SensorError {
    #[error("no accelerometer found under {sys_dir:?} / {input_dir:?}")]
    DeviceNotFound {
        sys_dir: PathBuf,
        input_dir: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("short read from input device: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    #[error("input device I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("wake channel unavailable: {0}")]
    WakeChannel(#[source] std::io::Error),

    #[error("data source is not open")]
    NotOpen,

    #[error("unknown sensor handle {0}")]
    InvalidHandle(u32),

    #[error("unknown HAL device name '{0}'")]
    InvalidDeviceName(String),
}

pub type SensorResult<T> = Result<T, SensorError>;
