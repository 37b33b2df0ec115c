//! Wake channel used to cancel a blocked poll
//!
//! A connected `UnixStream` pair. The control side writes a single sentinel
//! byte (`WAKE_SOURCE` unless configured otherwise); the poller watches the
//! other end next to the input device. `poll(2)` is level-triggered, so a byte
//! written before the poller starts waiting is still seen by that wait: there
//! is no lost wakeup.

use crate::error::{SensorError, SensorResult};
use std::io::{self, Read, Write};
use std::os::fd::{AsFd, BorrowedFd};
use std::os::unix::net::UnixStream;
use tracing::debug;

/// Default sentinel byte that requests cancellation
pub const WAKE_SOURCE: u8 = 0x1a;

/// Both ends of the wake channel, owned by the control device
#[derive(Debug)]
pub struct WakeChannel {
    writer: UnixStream,
    reader: UnixStream,
    sentinel: u8,
}

impl WakeChannel {
    pub fn new() -> SensorResult<Self> {
        Self::with_sentinel(WAKE_SOURCE)
    }

    /// Channel whose wake requests are carried by `sentinel`
    pub fn with_sentinel(sentinel: u8) -> SensorResult<Self> {
        let (writer, reader) = UnixStream::pair().map_err(SensorError::WakeChannel)?;
        // A full buffer already holds a pending wake, so never block the control thread on it.
        writer
            .set_nonblocking(true)
            .map_err(SensorError::WakeChannel)?;
        Ok(Self {
            writer,
            reader,
            sentinel,
        })
    }

    /// Ask a blocked (or the next) poll to return `Cancelled`
    pub fn signal(&self) -> SensorResult<()> {
        send_sentinel(&self.writer, self.sentinel)
    }

    /// A write-end duplicate that can be moved to another thread
    pub fn waker(&self) -> SensorResult<Waker> {
        let stream = self.writer.try_clone().map_err(SensorError::WakeChannel)?;
        Ok(Waker {
            stream,
            sentinel: self.sentinel,
        })
    }

    /// A read-end duplicate for the data path
    pub fn receiver(&self) -> SensorResult<WakeReceiver> {
        let stream = self.reader.try_clone().map_err(SensorError::WakeChannel)?;
        Ok(WakeReceiver {
            stream,
            sentinel: self.sentinel,
        })
    }

    #[cfg(test)]
    pub(crate) fn write_raw(&self, byte: u8) {
        (&self.writer).write_all(&[byte]).unwrap();
    }
}

/// Detached write end of a wake channel
#[derive(Debug)]
pub struct Waker {
    stream: UnixStream,
    sentinel: u8,
}

impl Waker {
    pub fn wake(&self) -> SensorResult<()> {
        send_sentinel(&self.stream, self.sentinel)
    }
}

fn send_sentinel(stream: &UnixStream, sentinel: u8) -> SensorResult<()> {
    let mut writer = stream;
    loop {
        match writer.write(&[sentinel]) {
            Ok(_) => return Ok(()),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                debug!("wake channel full, a wake is already pending");
                return Ok(());
            }
            Err(e) => return Err(SensorError::WakeChannel(e)),
        }
    }
}

/// What one byte drained from the wake channel meant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WakeEvent {
    Wake,
    /// Every write end is gone; nobody can wake us any more.
    Closed,
    Spurious(u8),
}

/// Read end of a wake channel, watched by the poller
#[derive(Debug)]
pub struct WakeReceiver {
    stream: UnixStream,
    sentinel: u8,
}

impl WakeReceiver {
    /// Consume exactly one byte. Call only after the end was reported readable.
    pub(crate) fn drain_one(&self) -> io::Result<WakeEvent> {
        let mut byte = [0u8; 1];
        let mut reader = &self.stream;
        loop {
            match reader.read(&mut byte) {
                Ok(0) => return Ok(WakeEvent::Closed),
                Ok(_) if byte[0] == self.sentinel => return Ok(WakeEvent::Wake),
                Ok(_) => return Ok(WakeEvent::Spurious(byte[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

impl AsFd for WakeReceiver {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.stream.as_fd()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_then_drain() {
        let channel = WakeChannel::new().unwrap();
        let rx = channel.receiver().unwrap();
        channel.signal().unwrap();
        assert_eq!(rx.drain_one().unwrap(), WakeEvent::Wake);
    }

    #[test]
    fn test_waker_from_other_thread() {
        let channel = WakeChannel::new().unwrap();
        let rx = channel.receiver().unwrap();
        let waker = channel.waker().unwrap();
        std::thread::spawn(move || waker.wake().unwrap())
            .join()
            .unwrap();
        assert_eq!(rx.drain_one().unwrap(), WakeEvent::Wake);
    }

    #[test]
    fn test_foreign_byte_is_spurious() {
        let channel = WakeChannel::new().unwrap();
        let rx = channel.receiver().unwrap();
        channel.write_raw(0x00);
        assert_eq!(rx.drain_one().unwrap(), WakeEvent::Spurious(0));
    }

    #[test]
    fn test_custom_sentinel() {
        let channel = WakeChannel::with_sentinel(0x42).unwrap();
        let rx = channel.receiver().unwrap();
        channel.write_raw(WAKE_SOURCE);
        assert_eq!(rx.drain_one().unwrap(), WakeEvent::Spurious(WAKE_SOURCE));

        channel.waker().unwrap().wake().unwrap();
        assert_eq!(rx.drain_one().unwrap(), WakeEvent::Wake);
    }

    #[test]
    fn test_closed_after_channel_dropped() {
        let channel = WakeChannel::new().unwrap();
        let rx = channel.receiver().unwrap();
        drop(channel);
        assert_eq!(rx.drain_one().unwrap(), WakeEvent::Closed);
    }

    #[test]
    fn test_repeated_signals_never_block() {
        let channel = WakeChannel::new().unwrap();
        // Far more than a socket buffer holds.
        for _ in 0..100_000 {
            channel.signal().unwrap();
        }
    }
}
