//! accelhal - LIS331DL accelerometer diagnostic tool
//!
//! Drives the HAL the same way the host framework does: open the control and
//! data devices, activate the accelerometer, then stream readings from a
//! poller thread until Ctrl-C wakes it.

use accelhal::hal::{SENSORS_HARDWARE_CONTROL, SENSORS_HARDWARE_DATA};
use accelhal::sensor::ACCELEROMETER_HANDLE;
use accelhal::{HalDevice, HalSettings, PollOutcome, SensorResult, SensorsData, SensorsModule};
use anyhow::{Context, Result, anyhow, bail};
use std::path::PathBuf;
use std::thread;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Delay the host would normally request; the hardware ignores it
const DEFAULT_DELAY_MS: i32 = 200;

#[derive(Debug, Default)]
struct Options {
    config: Option<PathBuf>,
    list: bool,
    write_config: bool,
    count: Option<u64>,
}

fn parse_args() -> Result<Options> {
    let mut opts = Options::default();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().context("--config needs a path")?;
                opts.config = Some(PathBuf::from(path));
            }
            "--count" => {
                let n = args.next().context("--count needs a number")?;
                opts.count = Some(n.parse().with_context(|| format!("bad --count '{n}'"))?);
            }
            "--list" => opts.list = true,
            "--write-config" => opts.write_config = true,
            "-h" | "--help" => {
                println!(
                    "usage: accelhal [--config PATH] [--count N] [--list] [--write-config]"
                );
                std::process::exit(0);
            }
            other => bail!("unknown argument '{other}'"),
        }
    }
    Ok(opts)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let opts = parse_args()?;
    let module = SensorsModule;

    if opts.list {
        let info = module.info();
        println!("{} v{}.{}", info.name, info.version_major, info.version_minor);
        for s in module.sensors_list() {
            println!(
                "  [{}] {} ({}) range={:.3} m/s² resolution={:.4} power={} mA",
                s.handle, s.name, s.vendor, s.max_range, s.resolution, s.power
            );
        }
        return Ok(());
    }

    let settings = match &opts.config {
        Some(path) => HalSettings::load_from(path)?,
        None => HalSettings::load()?,
    };

    if opts.write_config {
        match &opts.config {
            Some(path) => settings.save_to(path)?,
            None => settings.save()?,
        }
        return Ok(());
    }

    run(&module, &settings, opts.count)
}

fn run(module: &SensorsModule, settings: &HalSettings, limit: Option<u64>) -> Result<()> {
    let HalDevice::Control(mut control) = module.open(SENSORS_HARDWARE_CONTROL, settings)? else {
        bail!("module returned a non-control device");
    };
    let HalDevice::Data(mut data) = module.open(SENSORS_HARDWARE_DATA, settings)? else {
        bail!("module returned a non-data device");
    };

    let source = control
        .open_data_source()
        .context("Failed to open accelerometer")?;
    info!("Streaming from {:?}", source.device_path());
    data.data_open(source);

    control.activate(ACCELEROMETER_HANDLE, true)?;
    control.set_delay(DEFAULT_DELAY_MS)?;

    let waker = control
        .waker()?
        .context("wake channel missing after open")?;
    ctrlc::set_handler(move || {
        if let Err(e) = waker.wake() {
            warn!("Failed to wake poller: {}", e);
        }
    })
    .context("Failed to install Ctrl-C handler")?;

    let poller = thread::spawn(move || stream_readings(&mut data, limit));
    let result = poller
        .join()
        .map_err(|_| anyhow!("poller thread panicked"))?;

    control.activate(ACCELEROMETER_HANDLE, false)?;
    control.close();

    match result {
        Ok(received) => {
            info!("Received {} reading(s)", received);
            Ok(())
        }
        Err(e) => {
            error!("Poller stopped: {}", e);
            Err(e.into())
        }
    }
}

fn stream_readings(data: &mut SensorsData, limit: Option<u64>) -> SensorResult<u64> {
    let mut received = 0u64;
    let result = loop {
        match data.poll() {
            Ok(PollOutcome::Reading(r)) => {
                println!("x={:+8.3} y={:+8.3} z={:+8.3} m/s²", r.x, r.y, r.z);
                received += 1;
                if limit.is_some_and(|n| received >= n) {
                    break Ok(received);
                }
            }
            Ok(PollOutcome::Idle) => {}
            Ok(PollOutcome::Cancelled) => {
                info!("Poller woken, stopping");
                break Ok(received);
            }
            Err(e) => break Err(e),
        }
    };
    data.data_close();
    result
}
