//! Linux IIO accelerometer host
//!
//! Polls `in_accel_{x,y,z}_raw` under `/sys/bus/iio/devices/` at the
//! requested cadence from a dedicated thread, applying `in_accel_scale`
//! when the driver exposes one. The kernel does no gravity compensation,
//! so only the raw accelerometer kind is offered.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{SensorHost, SensorKind, SensorReading};

const IIO_BUS_DIR: &str = "/sys/bus/iio/devices";

pub struct IioSensorHost {
    device_dir: PathBuf,
    scale: f64,
}

impl IioSensorHost {
    /// Scan the IIO bus for the first device exposing 3-axis acceleration.
    pub fn discover() -> Option<Self> {
        Self::discover_in(Path::new(IIO_BUS_DIR))
    }

    fn discover_in(bus_dir: &Path) -> Option<Self> {
        let entries = fs::read_dir(bus_dir).ok()?;
        for entry in entries.flatten() {
            let dir = entry.path();
            let has_axes = ["x", "y", "z"]
                .iter()
                .all(|axis| dir.join(format!("in_accel_{}_raw", axis)).exists());
            if !has_axes {
                continue;
            }
            let scale = fs::read_to_string(dir.join("in_accel_scale"))
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(1.0);
            info!(device = %dir.display(), scale, "found IIO accelerometer");
            return Some(Self {
                device_dir: dir,
                scale,
            });
        }
        None
    }
}

fn read_axis(device_dir: &Path, axis: &str, scale: f64) -> Option<f64> {
    let raw: f64 = fs::read_to_string(device_dir.join(format!("in_accel_{}_raw", axis)))
        .ok()?
        .trim()
        .parse()
        .ok()?;
    Some(raw * scale)
}

impl SensorHost for IioSensorHost {
    fn available(&self, kind: SensorKind) -> bool {
        kind == SensorKind::Accelerometer
    }

    fn register(&self, kind: SensorKind, rate_hz: u32) -> Option<mpsc::Receiver<SensorReading>> {
        if kind != SensorKind::Accelerometer {
            return None;
        }

        let (tx, rx) = mpsc::channel(256);
        let device_dir = self.device_dir.clone();
        let scale = self.scale;
        let period = Duration::from_micros(1_000_000 / u64::from(rate_hz.max(1)));
        debug!(rate_hz, "IIO accelerometer registered");

        // Sysfs reads are blocking, so poll from a plain thread.
        std::thread::spawn(move || loop {
            let reading = (
                read_axis(&device_dir, "x", scale),
                read_axis(&device_dir, "y", scale),
                read_axis(&device_dir, "z", scale),
            );
            if let (Some(x), Some(y), Some(z)) = reading {
                let reading = SensorReading {
                    x,
                    y,
                    z,
                    timestamp_ms: Utc::now().timestamp_millis(),
                };
                if tx.blocking_send(reading).is_err() {
                    // Receiver dropped: unregistered.
                    break;
                }
            }
            std::thread::sleep(period);
        });

        Some(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_device(dir: &Path, x: i64, y: i64, z: i64, scale: Option<&str>) {
        fs::write(dir.join("in_accel_x_raw"), format!("{}\n", x)).unwrap();
        fs::write(dir.join("in_accel_y_raw"), format!("{}\n", y)).unwrap();
        fs::write(dir.join("in_accel_z_raw"), format!("{}\n", z)).unwrap();
        if let Some(scale) = scale {
            fs::write(dir.join("in_accel_scale"), scale).unwrap();
        }
    }

    #[test]
    fn test_discover_finds_three_axis_device() {
        let bus = tempfile::tempdir().unwrap();
        let device = bus.path().join("iio:device0");
        fs::create_dir(&device).unwrap();
        write_device(&device, 10, -20, 8192, Some("0.001197\n"));

        let host = IioSensorHost::discover_in(bus.path()).unwrap();
        assert!((host.scale - 0.001197).abs() < 1e-9);
        assert!(host.available(SensorKind::Accelerometer));
        assert!(!host.available(SensorKind::LinearAcceleration));
    }

    #[test]
    fn test_discover_skips_incomplete_devices() {
        let bus = tempfile::tempdir().unwrap();
        let device = bus.path().join("iio:device0");
        fs::create_dir(&device).unwrap();
        // Only one axis present.
        fs::write(device.join("in_accel_x_raw"), "1\n").unwrap();

        assert!(IioSensorHost::discover_in(bus.path()).is_none());
    }

    #[tokio::test]
    async fn test_readings_are_scaled() {
        let bus = tempfile::tempdir().unwrap();
        let device = bus.path().join("iio:device0");
        fs::create_dir(&device).unwrap();
        write_device(&device, 1000, 0, 2000, Some("0.01\n"));

        let host = IioSensorHost::discover_in(bus.path()).unwrap();
        let mut rx = host.register(SensorKind::Accelerometer, 200).unwrap();

        let reading = rx.recv().await.unwrap();
        assert!((reading.x - 10.0).abs() < 1e-9);
        assert!((reading.z - 20.0).abs() < 1e-9);
    }
}
