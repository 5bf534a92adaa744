//! Telemetry module with atomic counters and snapshot export

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Atomic counters for zero-overhead tracking on the sampling path
#[derive(Debug, Default)]
pub struct StreamerMetrics {
    /// Samples received from the sensor source
    pub samples_captured: AtomicU64,
    /// Samples accepted by the transport
    pub samples_sent: AtomicU64,
    /// Batches accepted by the transport
    pub batches_sent: AtomicU64,
    /// Flushes that failed and re-queued their batch
    pub send_failures: AtomicU64,
    /// Connection attempts, initial and retried
    pub connect_attempts: AtomicU64,
    /// Times the reconnect timer was armed
    pub reconnects_scheduled: AtomicU64,
}

/// Point-in-time view of the counters
#[derive(Debug, Clone, Serialize)]
pub struct TelemetrySnapshot {
    pub samples_captured: u64,
    pub samples_sent: u64,
    pub batches_sent: u64,
    pub send_failures: u64,
    pub connect_attempts: u64,
    pub reconnects_scheduled: u64,
}

impl StreamerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            samples_captured: self.samples_captured.load(Ordering::Relaxed),
            samples_sent: self.samples_sent.load(Ordering::Relaxed),
            batches_sent: self.batches_sent.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            connect_attempts: self.connect_attempts.load(Ordering::Relaxed),
            reconnects_scheduled: self.reconnects_scheduled.load(Ordering::Relaxed),
        }
    }
}
