//! Synthetic sensor host for simulation mode and tests

use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use super::{SensorHost, SensorKind, SensorReading};

/// Generates a smooth oscillation around gravity at the requested cadence.
///
/// Reports both sensor kinds as available, so it also exercises the
/// preferred-sensor path.
pub struct SyntheticSensorHost {
    amplitude: f64,
}

impl SyntheticSensorHost {
    pub fn new() -> Self {
        Self { amplitude: 0.5 }
    }

    pub fn with_amplitude(amplitude: f64) -> Self {
        Self { amplitude }
    }
}

impl Default for SyntheticSensorHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorHost for SyntheticSensorHost {
    fn available(&self, _kind: SensorKind) -> bool {
        true
    }

    fn register(&self, kind: SensorKind, rate_hz: u32) -> Option<mpsc::Receiver<SensorReading>> {
        let (tx, rx) = mpsc::channel(256);
        let amplitude = self.amplitude;
        let rate_hz = rate_hz.max(1);
        let period = Duration::from_micros(1_000_000 / u64::from(rate_hz));
        let step = std::f64::consts::TAU / f64::from(rate_hz);
        debug!(?kind, rate_hz, "synthetic sensor registered");

        tokio::spawn(async move {
            let mut tick = tokio::time::interval(period);
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut phase: f64 = 0.0;

            loop {
                tick.tick().await;
                phase += step;
                let reading = SensorReading {
                    x: amplitude * phase.sin(),
                    y: amplitude * (0.7 * phase).cos(),
                    z: 9.81 + 0.1 * amplitude * (1.3 * phase).sin(),
                    timestamp_ms: Utc::now().timestamp_millis(),
                };
                if tx.send(reading).await.is_err() {
                    // Receiver dropped: unregistered.
                    break;
                }
            }
        });

        Some(rx)
    }
}
