//! Shared data types for the yure client

use serde::{Deserialize, Serialize};

/// One timestamped 3-axis motion reading plus device/client metadata.
///
/// Immutable once constructed. A sample is owned by the sample buffer from
/// enqueue until the batch containing it is accepted by the transport; no
/// server acknowledgment is modeled beyond that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Stable per-installation identifier
    #[serde(rename = "yureId")]
    pub device_id: String,

    /// Axis readings in m/s²
    pub x: f64,
    pub y: f64,
    pub z: f64,

    /// Capture time, epoch milliseconds
    #[serde(rename = "t")]
    pub timestamp_ms: i64,

    /// Free-form client/platform descriptor
    #[serde(rename = "userAgent", skip_serializing_if = "Option::is_none")]
    pub client_tag: Option<String>,
}

impl Sample {
    pub fn new(
        device_id: String,
        x: f64,
        y: f64,
        z: f64,
        timestamp_ms: i64,
        client_tag: Option<String>,
    ) -> Self {
        Self {
            device_id,
            x,
            y,
            z,
            timestamp_ms,
            client_tag,
        }
    }
}

/// Build the client/platform descriptor attached to outgoing samples.
pub fn client_tag() -> String {
    format!(
        "{} v{} on {} {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Where the daemon gets its samples from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Read the device accelerometer
    Device,
    /// Generate a synthetic waveform
    Simulation,
}
