//! Blocking poll loop over the input device and the wake channel

use crate::decoder::{AxisAccumulator, EVENT_SIZE, Reading, Step, decode_event};
use crate::error::SensorResult;
use crate::handle::DeviceHandle;
use crate::wake::{WakeEvent, WakeReceiver};
use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd};
use tracing::debug;

/// What a single `poll` call produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PollOutcome {
    Reading(Reading),
    /// The control side asked the poller to stop waiting
    Cancelled,
    /// A non-axis event (typically EV_SYN) arrived; call `poll` again
    Idle,
}

#[derive(Debug, Default, Clone, Copy)]
struct Ready {
    device: bool,
    wake: bool,
}

const READABLE: libc::c_short = libc::POLLIN | libc::POLLHUP | libc::POLLERR;

/// Wait with no timeout until the device or the wake end has something to read
fn wait_readable(device: BorrowedFd<'_>, wake: Option<BorrowedFd<'_>>) -> io::Result<Ready> {
    // poll(2) skips entries with a negative fd.
    let mut fds = [
        libc::pollfd {
            fd: device.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        },
        libc::pollfd {
            fd: wake.map_or(-1, |w| w.as_raw_fd()),
            events: libc::POLLIN,
            revents: 0,
        },
    ];

    loop {
        // SAFETY: `fds` is a live array of `fds.len()` pollfd entries.
        let rc = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, -1) };
        if rc >= 0 {
            break;
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }

    if fds[0].revents & libc::POLLNVAL != 0 {
        return Err(io::Error::from_raw_os_error(libc::EBADF));
    }
    Ok(Ready {
        device: fds[0].revents & READABLE != 0,
        wake: fds[1].revents & READABLE != 0,
    })
}

/// Block until one complete reading, a cancellation, or a non-axis event.
///
/// Axis values gathered here are dropped when the call returns without a
/// reading. If the wake channel reports end-of-stream (the control side was
/// closed) the receiver is detached and the loop keeps waiting on the device.
pub fn poll_device(
    device: &DeviceHandle,
    wake: &mut Option<WakeReceiver>,
) -> SensorResult<PollOutcome> {
    let mut accumulator = AxisAccumulator::new();
    let mut buf = [0u8; EVENT_SIZE];

    loop {
        let ready = wait_readable(device.as_fd(), wake.as_ref().map(|w| w.as_fd()))?;

        if ready.wake {
            let drained = match wake.as_ref() {
                Some(rx) => Some(rx.drain_one()?),
                None => None,
            };
            match drained {
                Some(WakeEvent::Wake) => {
                    debug!("poll cancelled by wake request");
                    return Ok(PollOutcome::Cancelled);
                }
                Some(WakeEvent::Closed) => {
                    debug!("wake channel closed by control side, detaching");
                    *wake = None;
                }
                Some(WakeEvent::Spurious(byte)) => {
                    debug!("ignoring control byte {:#04x}", byte);
                }
                None => {}
            }
        }

        if !ready.device {
            continue;
        }

        let n = device.read_once(&mut buf)?;
        let event = decode_event(&buf[..n])?;
        match accumulator.feed(&event) {
            Step::Pending => continue,
            Step::Complete(reading) => return Ok(PollOutcome::Reading(reading)),
            Step::Yield => return Ok(PollOutcome::Idle),
        }
    }
}
