//! Adapter from a sensor host to the sample stream

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{SampleSource, SensorHost, SensorKind, SensorReading};
use crate::streamer::StreamerError;
use crate::types::Sample;

/// Motion-sensor source over a [`SensorHost`].
///
/// Prefers the linear-acceleration sensor and falls back to the raw
/// accelerometer; when neither exists, subscribing fails with
/// [`StreamerError::SensorUnavailable`]. Each reading is stamped with the
/// device id and client tag.
pub struct AccelerometerSource {
    host: Arc<dyn SensorHost>,
    device_id: String,
    client_tag: Option<String>,
    rate_hz: u32,
}

impl AccelerometerSource {
    pub fn new(
        host: Arc<dyn SensorHost>,
        device_id: String,
        client_tag: Option<String>,
        rate_hz: u32,
    ) -> Self {
        Self {
            host,
            device_id,
            client_tag,
            rate_hz,
        }
    }

    fn pick_kind(&self) -> Option<SensorKind> {
        [SensorKind::LinearAcceleration, SensorKind::Accelerometer]
            .into_iter()
            .find(|kind| self.host.available(*kind))
    }
}

impl SampleSource for AccelerometerSource {
    fn subscribe(&self) -> Result<mpsc::Receiver<Sample>, StreamerError> {
        let kind = self.pick_kind().ok_or_else(|| {
            StreamerError::SensorUnavailable(
                "neither linear-acceleration nor accelerometer is present".to_string(),
            )
        })?;
        if kind == SensorKind::Accelerometer {
            info!("linear-acceleration sensor unavailable, using raw accelerometer");
        }

        let mut readings = self.host.register(kind, self.rate_hz).ok_or_else(|| {
            StreamerError::SensorUnavailable(format!("registration for {:?} was refused", kind))
        })?;
        debug!(?kind, rate_hz = self.rate_hz, "sensor registered");

        let (tx, rx) = mpsc::channel(256);
        let device_id = self.device_id.clone();
        let client_tag = self.client_tag.clone();
        tokio::spawn(async move {
            while let Some(reading) = readings.recv().await {
                let SensorReading {
                    x,
                    y,
                    z,
                    timestamp_ms,
                } = reading;
                let sample =
                    Sample::new(device_id.clone(), x, y, z, timestamp_ms, client_tag.clone());
                if tx.send(sample).await.is_err() {
                    // Subscriber gone; dropping `readings` unregisters.
                    break;
                }
            }
        });

        Ok(rx)
    }
}
