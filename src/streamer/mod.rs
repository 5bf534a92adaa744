// Streaming subsystem components
pub mod buffer; // SampleBuffer: enqueue / drain_all / requeue_front under one lock
pub mod connection; // ConnectionManager: state machine + fixed-delay reconnect timer
pub mod errors; // StreamerError taxonomy
pub mod service; // StreamingService: source → buffer → connection wiring
pub mod telemetry; // atomic counters + snapshot export
pub mod transport; // Transport/MessageSink traits + tokio-tungstenite adapter

// Re-export commonly used types
pub use buffer::SampleBuffer;
pub use connection::{ConnectionManager, ConnectionState, RECONNECT_INTERVAL};
pub use errors::StreamerError;
pub use service::StreamingService;
pub use telemetry::{StreamerMetrics, TelemetrySnapshot};
pub use transport::{MessageSink, Transport, TransportEvent, TransportLink, WsTransport};
