//! HAL settings management
//!
//! Discovery paths are configurable so the HAL can be pointed at a board
//! whose accelerometer sits on a different I2C address.

use crate::lifecycle::SensorsControl;
use crate::locator::{ACCEL_SYS_DIR, DeviceLocator, INPUT_DIR};
use crate::wake::WAKE_SOURCE;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// HAL settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HalSettings {
    /// Directory holding the `eventN` character devices
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    /// sysfs directory listing the accelerometer's `inputN` nodes
    #[serde(default = "default_sys_dir")]
    pub sys_dir: PathBuf,

    /// Byte that makes a blocked poll return `Cancelled`
    #[serde(default = "default_wake_byte")]
    pub wake_byte: u8,
}

fn default_input_dir() -> PathBuf {
    PathBuf::from(INPUT_DIR)
}

fn default_sys_dir() -> PathBuf {
    PathBuf::from(ACCEL_SYS_DIR)
}

fn default_wake_byte() -> u8 {
    WAKE_SOURCE
}

impl Default for HalSettings {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            sys_dir: default_sys_dir(),
            wake_byte: default_wake_byte(),
        }
    }
}

impl HalSettings {
    /// Get the settings file path
    pub fn settings_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("accelhal");
        Ok(config_dir.join("settings.toml"))
    }

    /// Load settings from the user config dir (or use defaults)
    pub fn load() -> Result<Self> {
        let path = Self::settings_path()?;
        Self::load_from(&path)
    }

    /// Load settings from `path`; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No settings file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {path:?}"))?;
        let settings: HalSettings = toml::from_str(&content)
            .with_context(|| format!("Invalid settings file {path:?}"))?;
        info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Save settings to the user config dir
    pub fn save(&self) -> Result<()> {
        let path = Self::settings_path()?;
        self.save_to(&path)
    }

    /// Save settings to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory {dir:?}"))?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Locator over the configured directories
    pub fn locator(&self) -> DeviceLocator {
        DeviceLocator::new(&self.input_dir, &self.sys_dir)
    }

    /// Control device configured from these settings
    pub fn control(&self) -> SensorsControl {
        SensorsControl::new(self.locator()).with_wake_byte(self.wake_byte)
    }
}
