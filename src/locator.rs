//! Accelerometer discovery
//!
//! The LIS331DL shows up as an `inputN` node under its I2C device in sysfs.
//! Each such node maps to an `/dev/input/eventM` character device; the first
//! one whose absolute-axis capabilities are exactly X, Y and Z is the sensor.

use crate::error::{SensorError, SensorResult};
use crate::handle::DeviceHandle;
use evdev::{AbsoluteAxisType, EventType};
use nix::ioctl_read_buf;
use std::fs::{self, File};
use std::io;
use std::os::fd::{AsRawFd, OwnedFd};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const INPUT_DIR: &str = "/dev/input";
pub const ACCEL_SYS_DIR: &str = "/sys/devices/i2c-0/0-003a/input";

/// Absolute-axis capability bits as reported by EVIOCGBIT(EV_ABS).
///
/// Bit n is set when the device reports ABS code n. ABS_MAX is 0x3f, so the
/// full capability set fits in 64 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AbsCapabilities(pub u64);

impl AbsCapabilities {
    /// X, Y and Z and nothing else
    pub const ACCEL_ALL: Self = Self(
        (1 << AbsoluteAxisType::ABS_X.0)
            | (1 << AbsoluteAxisType::ABS_Y.0)
            | (1 << AbsoluteAxisType::ABS_Z.0),
    );

    /// Assemble the set from the kernel's `unsigned long` bitmap words
    fn from_words(words: &[libc::c_ulong]) -> Self {
        let bits = words
            .iter()
            .enumerate()
            .fold(0u64, |acc, (i, word)| acc | (u64::from(*word) << (i * WORD_BITS)));
        Self(bits)
    }
}

const WORD_BITS: usize = std::mem::size_of::<libc::c_ulong>() * 8;
const ABS_WORDS: usize = 64 / WORD_BITS;

// EVIOCGBIT(EV_ABS, len)
ioctl_read_buf!(
    eviocgbit_abs,
    b'E',
    0x20 + EventType::ABSOLUTE.0,
    libc::c_ulong
);

/// An opened candidate together with what it claims to support
#[derive(Debug)]
pub struct ProbedDevice {
    pub fd: OwnedFd,
    pub capabilities: AbsCapabilities,
}

/// Opens a candidate node and queries its absolute-axis capabilities
pub trait CapabilityProbe: Send + Sync {
    fn probe(&self, path: &Path) -> io::Result<ProbedDevice>;
}

/// Queries real evdev nodes, opened read-only
#[derive(Debug, Default, Clone, Copy)]
pub struct EvdevProbe;

impl CapabilityProbe for EvdevProbe {
    fn probe(&self, path: &Path) -> io::Result<ProbedDevice> {
        let file = File::open(path)?;
        let mut words = [0 as libc::c_ulong; ABS_WORDS];
        // SAFETY: `words` is a writable buffer and the ioctl writes at most its size.
        unsafe { eviocgbit_abs(file.as_raw_fd(), &mut words) }?;
        Ok(ProbedDevice {
            fd: OwnedFd::from(file),
            capabilities: AbsCapabilities::from_words(&words),
        })
    }
}

pub struct DeviceLocator {
    input_dir: PathBuf,
    sys_dir: PathBuf,
    probe: Box<dyn CapabilityProbe>,
}

impl std::fmt::Debug for DeviceLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceLocator")
            .field("input_dir", &self.input_dir)
            .field("sys_dir", &self.sys_dir)
            .finish_non_exhaustive()
    }
}

impl Default for DeviceLocator {
    fn default() -> Self {
        Self::new(INPUT_DIR, ACCEL_SYS_DIR)
    }
}

impl DeviceLocator {
    pub fn new(input_dir: impl Into<PathBuf>, sys_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            sys_dir: sys_dir.into(),
            probe: Box::new(EvdevProbe),
        }
    }

    /// Replace the capability probe (tests use a stub)
    pub fn with_probe(mut self, probe: impl CapabilityProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn sys_dir(&self) -> &Path {
        &self.sys_dir
    }

    /// Event node paths to try, in order
    pub fn candidates(&self) -> io::Result<Vec<PathBuf>> {
        let mut entries: Vec<(u32, PathBuf, String)> = Vec::new();
        for entry in fs::read_dir(&self.sys_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            match numeric_suffix(&name, "input") {
                Some(n) => entries.push((n, entry.path(), name)),
                None => debug!("Skipping sysfs entry {:?}", name),
            }
        }
        entries.sort_by_key(|(n, _, _)| *n);

        let candidates = entries
            .into_iter()
            .map(|(n, sys_path, _)| {
                let node = event_child(&sys_path).unwrap_or_else(|| format!("event{n}"));
                self.input_dir.join(node)
            })
            .collect();
        Ok(candidates)
    }

    /// Find and open the accelerometer
    pub fn locate(&self) -> SensorResult<DeviceHandle> {
        let not_found = |source: Option<io::Error>| SensorError::DeviceNotFound {
            sys_dir: self.sys_dir.clone(),
            input_dir: self.input_dir.clone(),
            source,
        };

        if let Err(e) = fs::read_dir(&self.input_dir) {
            warn!("Accelerometer: cannot read {:?}: {}", self.input_dir, e);
            return Err(not_found(Some(e)));
        }
        let candidates = match self.candidates() {
            Ok(c) => c,
            Err(e) => {
                warn!("Accelerometer: cannot read {:?}: {}", self.sys_dir, e);
                return Err(not_found(Some(e)));
            }
        };

        for path in candidates {
            let probed = match self.probe.probe(&path) {
                Ok(p) => p,
                Err(e) => {
                    warn!("Accelerometer: couldn't open {:?}: {}", path, e);
                    continue;
                }
            };

            if probed.capabilities != AbsCapabilities::ACCEL_ALL {
                debug!(
                    "Accelerometer: {:?} has abs bits {:#x}, want {:#x}",
                    path,
                    probed.capabilities.0,
                    AbsCapabilities::ACCEL_ALL.0
                );
                continue;
            }

            info!("Accelerometer: using {:?}", path);
            return Ok(DeviceHandle::new(probed.fd, path));
        }

        warn!("Accelerometer: no input device under {:?} matched", self.sys_dir);
        Err(not_found(None))
    }
}

fn numeric_suffix(name: &str, prefix: &str) -> Option<u32> {
    let digits = name.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// `inputN/eventM` child in sysfs, if the kernel exposes one
fn event_child(sys_path: &Path) -> Option<String> {
    fs::read_dir(sys_path)
        .ok()?
        .flatten()
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            numeric_suffix(&name, "event").map(|n| (n, name))
        })
        .min_by_key(|(n, _)| *n)
        .map(|(_, name)| name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accel_mask_is_three_low_bits() {
        assert_eq!(AbsCapabilities::ACCEL_ALL.0, 0b111);
    }

    #[test]
    fn test_from_words_includes_high_codes() {
        // ABS_X..ABS_Z plus ABS_MT_POSITION_X (0x35)
        let bits: u64 = 0b111 | (1 << AbsoluteAxisType::ABS_MT_POSITION_X.0);
        let mut words = [0 as libc::c_ulong; ABS_WORDS];
        for (i, word) in words.iter_mut().enumerate() {
            *word = (bits >> (i * WORD_BITS)) as libc::c_ulong;
        }
        let caps = AbsCapabilities::from_words(&words);
        assert_eq!(caps.0, bits);
        assert_ne!(caps, AbsCapabilities::ACCEL_ALL);
    }

    #[test]
    fn test_probe_rejects_non_evdev_node() {
        // /dev/null opens fine but does not answer EVIOCGBIT.
        assert!(EvdevProbe.probe(Path::new("/dev/null")).is_err());
    }

    #[test]
    fn test_numeric_suffix() {
        assert_eq!(numeric_suffix("input3", "input"), Some(3));
        assert_eq!(numeric_suffix("input12", "input"), Some(12));
        assert_eq!(numeric_suffix("input", "input"), None);
        assert_eq!(numeric_suffix("inputx", "input"), None);
        assert_eq!(numeric_suffix("power", "input"), None);
        assert_eq!(numeric_suffix("event7", "event"), Some(7));
    }

    #[test]
    fn test_candidates_prefer_event_child() {
        let root = tempfile::tempdir().unwrap();
        let sys = root.path().join("sys");
        fs::create_dir_all(sys.join("input2/event5")).unwrap();
        fs::create_dir_all(sys.join("input10")).unwrap();
        fs::create_dir_all(sys.join("uevent_dir")).unwrap();

        let locator = DeviceLocator::new("/dev/input", &sys);
        let found = locator.candidates().unwrap();
        assert_eq!(
            found,
            vec![
                PathBuf::from("/dev/input/event5"),
                PathBuf::from("/dev/input/event10"),
            ]
        );
    }

    #[test]
    fn test_event_child_picked_numerically() {
        let root = tempfile::tempdir().unwrap();
        let sys = root.path().join("sys");
        fs::create_dir_all(sys.join("input0/event10")).unwrap();
        fs::create_dir_all(sys.join("input0/event9")).unwrap();

        let locator = DeviceLocator::new("/dev/input", &sys);
        assert_eq!(
            locator.candidates().unwrap(),
            vec![PathBuf::from("/dev/input/event9")]
        );
    }

    #[test]
    fn test_missing_sys_dir_is_not_found() {
        let root = tempfile::tempdir().unwrap();
        let locator = DeviceLocator::new(root.path(), root.path().join("absent"));
        assert!(matches!(
            locator.locate(),
            Err(SensorError::DeviceNotFound { source: Some(_), .. })
        ));
    }
}
