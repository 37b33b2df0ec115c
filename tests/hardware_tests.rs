//! Hardware-dependent tests that require the real accelerometer
//!
//! These tests are ignored by default and can be run with:
//! `cargo test -- --ignored`
//!
//! They require:
//! - A board with the LIS331DL at /sys/devices/i2c-0/0-003a
//! - Read access to /dev/input/event*

use accelhal::{HalSettings, PollOutcome, SensorsControl, SensorsData};
use std::time::Duration;

/// Locate the accelerometer with the default discovery paths
#[test]
#[ignore]
fn test_real_device_detection() {
    let locator = HalSettings::default().locator();
    let handle = locator.locate().expect("No accelerometer found");
    println!("Accelerometer at {:?}", handle.path());
}

/// Read a few samples, then wake the poller
#[test]
#[ignore]
fn test_real_readings_and_wake() {
    let mut control = SensorsControl::new(HalSettings::default().locator());
    let mut data = SensorsData::new();
    data.data_open(control.open_data_source().expect("open failed"));

    let mut readings = 0;
    while readings < 5 {
        match data.poll().expect("poll failed") {
            PollOutcome::Reading(r) => {
                println!("x={:.3} y={:.3} z={:.3}", r.x, r.y, r.z);
                readings += 1;
            }
            PollOutcome::Idle => {}
            PollOutcome::Cancelled => panic!("nobody asked to cancel"),
        }
    }

    let waker = control.waker().unwrap().unwrap();
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(100));
        waker.wake().unwrap();
    });
    // The sensor keeps streaming, so readings may arrive before the wake lands.
    loop {
        if data.poll().expect("poll failed") == PollOutcome::Cancelled {
            break;
        }
    }
    control.close();
    data.data_close();
}
