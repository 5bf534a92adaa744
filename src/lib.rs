//! yure-client - background motion-telemetry streaming client
//!
//! Samples a device motion sensor and streams batches of readings to a
//! collection endpoint over a persistent WebSocket, buffering through
//! connectivity loss and reconnecting on a fixed interval. This library
//! exposes the core modules for the `yured` daemon and for integration
//! tests.

pub mod config;
pub mod device_id;
pub mod sensor;
pub mod status;
pub mod streamer;
pub mod types;

// Re-export commonly used types
pub use status::{LogStatusSink, ServiceStatus, StatusSink};
pub use streamer::{
    ConnectionManager, ConnectionState, SampleBuffer, StreamerError, StreamerMetrics,
    StreamingService, WsTransport,
};
pub use types::Sample;
