//! Status reporting surface
//!
//! The core reports a single human-readable state string to an external
//! notifier (the platform notification / keep-alive collaborator). No error
//! codes or backtraces cross this boundary.

use std::fmt;

use tracing::info;

/// The latest known state of the streaming service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    Disconnected,
    Connecting,
    Connected,
    /// A batch of this many samples was just handed to the transport
    Sending(usize),
    /// Waiting out the fixed delay before the next connection attempt
    Reconnecting,
    Stopped,
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Sending(count) => write!(f, "sending {} samples", count),
            Self::Reconnecting => write!(f, "reconnecting"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Sink the service pushes status updates into
pub trait StatusSink: Send + Sync {
    fn update(&self, status: ServiceStatus);
}

/// Logs each status change; stands in for a platform notification surface.
pub struct LogStatusSink;

impl StatusSink for LogStatusSink {
    fn update(&self, status: ServiceStatus) {
        info!(status = %status, "status changed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings() {
        assert_eq!(ServiceStatus::Disconnected.to_string(), "disconnected");
        assert_eq!(ServiceStatus::Connecting.to_string(), "connecting");
        assert_eq!(ServiceStatus::Connected.to_string(), "connected");
        assert_eq!(ServiceStatus::Sending(30).to_string(), "sending 30 samples");
        assert_eq!(ServiceStatus::Reconnecting.to_string(), "reconnecting");
        assert_eq!(ServiceStatus::Stopped.to_string(), "stopped");
    }
}
