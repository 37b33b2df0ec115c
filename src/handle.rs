//! Owned descriptor handles passed between the control and data paths
//!
//! Every descriptor lives inside a `File` or `UnixStream`, so it is closed
//! exactly once when its owner is dropped. Duplicates are independent: closing
//! the control-side device never invalidates the data-side copy.

use crate::wake::WakeReceiver;
use std::fs::File;
use std::io::{self, Read};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd, RawFd};
use std::path::{Path, PathBuf};

/// An open, exclusively owned input device descriptor
#[derive(Debug)]
pub struct DeviceHandle {
    file: File,
    path: PathBuf,
}

impl DeviceHandle {
    /// Wrap an already opened descriptor
    pub fn new(fd: OwnedFd, path: impl Into<PathBuf>) -> Self {
        Self {
            file: File::from(fd),
            path: path.into(),
        }
    }

    /// Node this descriptor was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Duplicate the descriptor (dup with close-on-exec)
    pub fn try_clone(&self) -> io::Result<Self> {
        Ok(Self {
            file: self.file.try_clone()?,
            path: self.path.clone(),
        })
    }

    /// Issue a single read(2); the kernel delivers whole event records
    pub(crate) fn read_once(&self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match (&self.file).read(buf) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                other => return other,
            }
        }
    }
}

impl AsFd for DeviceHandle {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

impl AsRawFd for DeviceHandle {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

/// Transferable bundle handed from the control device to the data device.
///
/// Carries its own duplicates of the device descriptor and of the wake
/// channel's read end. It is move-only; `SensorsData::data_open` consumes it.
#[derive(Debug)]
pub struct DataSourceHandle {
    pub(crate) device: DeviceHandle,
    pub(crate) wake: WakeReceiver,
}

impl DataSourceHandle {
    pub(crate) fn new(device: DeviceHandle, wake: WakeReceiver) -> Self {
        Self { device, wake }
    }

    /// Device node the data path will read from
    pub fn device_path(&self) -> &Path {
        self.device.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::unix::net::UnixStream;

    #[test]
    fn test_clone_survives_original_drop() {
        let (local, mut peer) = UnixStream::pair().unwrap();
        let original = DeviceHandle::new(OwnedFd::from(local), "/dev/input/event0");
        let copy = original.try_clone().unwrap();
        assert_ne!(original.as_raw_fd(), copy.as_raw_fd());
        drop(original);

        peer.write_all(&[1, 2, 3]).unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(copy.read_once(&mut buf).unwrap(), 3);
        assert_eq!(copy.path(), Path::new("/dev/input/event0"));
    }
}
