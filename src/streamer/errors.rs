//! Error types for the streaming subsystem
//!
//! Errors never cross component boundaries as panics; recoverable ones
//! surface as connection-state transitions and status updates, and the user
//! only ever sees the single status string.

use thiserror::Error;

/// Error type covering the streaming pipeline lifecycle
#[derive(Error, Debug)]
pub enum StreamerError {
    /// No usable motion sensor on this device
    ///
    /// Fatal to starting the service, but not to the process.
    #[error("no motion sensor available: {0}")]
    SensorUnavailable(String),

    /// Establishing the connection failed
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The connection was closed
    #[error("connection closed")]
    ConnectionClosed,

    /// A send was attempted while not connected
    ///
    /// The manager never queues internally; the caller keeps the batch.
    #[error("not connected")]
    NotConnected,

    /// The transport rejected an outbound message
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Batch serialization failed
    ///
    /// The wire schema is fixed, so this indicates a defect rather than a
    /// runtime condition to recover from.
    #[error("batch serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StreamerError {
    /// Recoverable errors drive the reconnect loop; the rest do not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_)
                | Self::ConnectionClosed
                | Self::NotConnected
                | Self::SendFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(StreamerError::ConnectionFailed("refused".into()).is_recoverable());
        assert!(StreamerError::ConnectionClosed.is_recoverable());
        assert!(StreamerError::NotConnected.is_recoverable());
        assert!(StreamerError::SendFailed("broken pipe".into()).is_recoverable());
        assert!(!StreamerError::SensorUnavailable("none".into()).is_recoverable());
    }

    #[test]
    fn test_display_has_no_internals() {
        let err = StreamerError::NotConnected;
        assert_eq!(err.to_string(), "not connected");
    }
}
