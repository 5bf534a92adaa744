// Motion-sensor sources feeding the streaming service
//
// `SensorHost` models the device's sensor-registration API; `SampleSource`
// is what the streaming service consumes. `AccelerometerSource` adapts one
// to the other, picking the preferred sensor kind and falling back to the
// coarser one when it is missing.

mod accelerometer;
#[cfg(target_os = "linux")]
mod iio;
mod synthetic;

pub use accelerometer::AccelerometerSource;
#[cfg(target_os = "linux")]
pub use iio::IioSensorHost;
pub use synthetic::SyntheticSensorHost;

use tokio::sync::mpsc;

use crate::streamer::StreamerError;
use crate::types::Sample;

/// Sensor kinds, in preference order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    /// Gravity-compensated acceleration (preferred)
    LinearAcceleration,
    /// Raw accelerometer (fallback)
    Accelerometer,
}

/// One raw reading delivered by a sensor host
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Capture time, epoch milliseconds
    pub timestamp_ms: i64,
}

/// Device sensor-registration API.
///
/// Registration starts delivery at the requested cadence and continues until
/// the receiver is dropped; hosts never restart delivery on their own.
pub trait SensorHost: Send + Sync {
    /// Whether the host exposes a sensor of the given kind
    fn available(&self, kind: SensorKind) -> bool;

    /// Register for readings at the given rate hint. `None` when the kind is
    /// unavailable.
    fn register(&self, kind: SensorKind, rate_hz: u32) -> Option<mpsc::Receiver<SensorReading>>;
}

/// Produces the unbounded sample stream consumed by the streaming service.
pub trait SampleSource: Send + Sync {
    /// Begin producing samples. The stream ends only when the receiver is
    /// dropped; sources never resubscribe themselves.
    fn subscribe(&self) -> Result<mpsc::Receiver<Sample>, StreamerError>;
}
