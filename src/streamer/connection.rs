//! Connection lifecycle management with fixed-interval reconnect
//!
//! Owns one logical persistent connection to the collection endpoint.
//! Transitions are computed by a pure function over the three lifecycle
//! states; transport events are fed in by a thin adapter task, so the state
//! machine stays independent of the WebSocket library's callback shape.
//! Retry policy is a single fixed-interval loop: no backoff, no jitter, no
//! attempt ceiling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::errors::StreamerError;
use super::telemetry::StreamerMetrics;
use super::transport::{MessageSink, Transport, TransportEvent};
use crate::status::{ServiceStatus, StatusSink};

/// Fixed delay between reconnect attempts
pub const RECONNECT_INTERVAL: Duration = Duration::from_secs(5);

/// Connection lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Inputs to the connection state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConnEvent {
    /// `connect()` began an attempt
    AttemptStarted,
    /// The transport handshake completed
    Opened,
    /// The attempt failed before opening
    AttemptFailed,
    /// The peer closed an open connection
    PeerClosed,
    /// The read side reported a failure
    LinkFailed,
    /// An outbound send was rejected
    SendRejected,
    /// The manager is shutting down
    Shutdown,
}

/// Outcome of one transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Transition {
    pub next: ConnectionState,
    pub schedule_reconnect: bool,
}

/// Pure transition function for the connection state machine.
pub(crate) fn transition(state: ConnectionState, event: ConnEvent) -> Transition {
    use ConnectionState::*;

    let stay = |state| Transition {
        next: state,
        schedule_reconnect: false,
    };

    match (state, event) {
        (_, ConnEvent::Shutdown) => stay(Disconnected),
        (_, ConnEvent::AttemptStarted) => stay(Connecting),
        (Connecting, ConnEvent::Opened) => stay(Connected),
        (Connecting, ConnEvent::AttemptFailed) => Transition {
            next: Disconnected,
            schedule_reconnect: true,
        },
        (Connected, ConnEvent::PeerClosed | ConnEvent::LinkFailed | ConnEvent::SendRejected) => {
            Transition {
                next: Disconnected,
                schedule_reconnect: true,
            }
        }
        // Events for a link that was already torn down change nothing.
        (state, _) => stay(state),
    }
}

/// Manager for the one persistent connection.
///
/// Cheap to clone and hand to tasks: all state lives behind one `Arc`.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<ConnInner>,
}

struct ConnInner {
    url: String,
    transport: Arc<dyn Transport>,
    state: Mutex<ConnectionState>,
    sink: AsyncMutex<Option<Box<dyn MessageSink>>>,
    /// At most one reconnect timer outstanding; cleared exactly on Connected
    reconnect_pending: AtomicBool,
    shutdown: AtomicBool,
    reconnect_delay: Duration,
    /// Serializes connect attempts; `close()` waits on it too
    connect_guard: AsyncMutex<()>,
    adapter_task: Mutex<Option<JoinHandle<()>>>,
    timer_task: Mutex<Option<JoinHandle<()>>>,
    status: Arc<dyn StatusSink>,
    metrics: Arc<StreamerMetrics>,
}

impl ConnectionManager {
    pub fn new(
        url: String,
        transport: Arc<dyn Transport>,
        status: Arc<dyn StatusSink>,
        metrics: Arc<StreamerMetrics>,
    ) -> Self {
        Self {
            inner: Arc::new(ConnInner {
                url,
                transport,
                state: Mutex::new(ConnectionState::Disconnected),
                sink: AsyncMutex::new(None),
                reconnect_pending: AtomicBool::new(false),
                shutdown: AtomicBool::new(false),
                reconnect_delay: RECONNECT_INTERVAL,
                connect_guard: AsyncMutex::new(()),
                adapter_task: Mutex::new(None),
                timer_task: Mutex::new(None),
                status,
                metrics,
            }),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.lock()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Whether a reconnect attempt is currently scheduled
    pub fn reconnect_pending(&self) -> bool {
        self.inner.reconnect_pending.load(Ordering::SeqCst)
    }

    /// Establish the connection, tearing down any prior in-flight attempt.
    ///
    /// Safe to call in any state; attempts never overlap. Failure arms the
    /// reconnect timer.
    pub async fn connect(&self) -> Result<(), StreamerError> {
        ConnInner::connect(&self.inner).await
    }

    /// Hand one message to the live connection.
    ///
    /// Fails immediately when not connected; nothing is queued here —
    /// buffering is the caller's responsibility. A rejected send drops the
    /// connection and arms the reconnect timer.
    pub async fn send(&self, payload: String) -> Result<(), StreamerError> {
        ConnInner::send(&self.inner, payload).await
    }

    /// Arm the one-shot reconnect timer; a no-op while one is pending.
    pub fn schedule_reconnect(&self) {
        ConnInner::schedule_reconnect(&self.inner);
    }

    /// Tear the connection down for good and cancel any pending reconnect.
    pub async fn close(&self) {
        ConnInner::close(&self.inner).await;
    }
}

impl ConnInner {
    /// Apply one event to the state machine, reacting to its outcome.
    fn apply(this: &Arc<Self>, event: ConnEvent) {
        let outcome = {
            let mut state = this.state.lock();
            let outcome = transition(*state, event);
            if *state != outcome.next {
                debug!(from = ?*state, to = ?outcome.next, event = ?event, "connection transition");
            }
            *state = outcome.next;
            outcome
        };
        if outcome.schedule_reconnect {
            Self::schedule_reconnect(this);
        }
    }

    async fn connect(this: &Arc<Self>) -> Result<(), StreamerError> {
        let _guard = this.connect_guard.lock().await;
        if this.shutdown.load(Ordering::SeqCst) {
            return Err(StreamerError::ConnectionClosed);
        }

        Self::teardown_link(this).await;

        Self::apply(this, ConnEvent::AttemptStarted);
        this.status.update(ServiceStatus::Connecting);
        this.metrics.connect_attempts.fetch_add(1, Ordering::Relaxed);

        match this.transport.open(&this.url).await {
            Ok(link) => {
                *this.sink.lock().await = Some(link.sink);
                Self::apply(this, ConnEvent::Opened);
                this.reconnect_pending.store(false, Ordering::SeqCst);
                this.status.update(ServiceStatus::Connected);
                info!("connected to {}", this.url);

                // Thin adapter: forward read-side events into the machine.
                let inner = Arc::clone(this);
                let mut events = link.events;
                let handle = tokio::spawn(async move {
                    while let Some(event) = events.recv().await {
                        match event {
                            TransportEvent::Closed => {
                                info!("connection closed by peer");
                                Self::apply(&inner, ConnEvent::PeerClosed);
                            }
                            TransportEvent::Failed(reason) => {
                                warn!("connection failed: {}", reason);
                                Self::apply(&inner, ConnEvent::LinkFailed);
                            }
                        }
                    }
                });
                *this.adapter_task.lock() = Some(handle);
                Ok(())
            }
            Err(e) => {
                warn!("connection attempt failed: {}", e);
                Self::apply(this, ConnEvent::AttemptFailed);
                this.status.update(ServiceStatus::Reconnecting);
                Err(e)
            }
        }
    }

    async fn send(this: &Arc<Self>, payload: String) -> Result<(), StreamerError> {
        if *this.state.lock() != ConnectionState::Connected {
            return Err(StreamerError::NotConnected);
        }

        let mut sink = this.sink.lock().await;
        let Some(link) = sink.as_mut() else {
            return Err(StreamerError::NotConnected);
        };

        match link.send_text(payload).await {
            Ok(()) => Ok(()),
            Err(e) => {
                drop(sink);
                Self::apply(this, ConnEvent::SendRejected);
                Err(e)
            }
        }
    }

    fn schedule_reconnect(this: &Arc<Self>) {
        if this.shutdown.load(Ordering::SeqCst) {
            return;
        }
        if this.reconnect_pending.swap(true, Ordering::SeqCst) {
            return;
        }

        this.metrics.reconnects_scheduled.fetch_add(1, Ordering::Relaxed);
        this.status.update(ServiceStatus::Reconnecting);
        debug!("reconnect armed, next attempt in {:?}", this.reconnect_delay);

        let inner = Arc::clone(this);
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(inner.reconnect_delay).await;
                if inner.shutdown.load(Ordering::SeqCst) {
                    return;
                }
                if *inner.state.lock() == ConnectionState::Connected {
                    // Connected in the meantime; the pending flag is already
                    // cleared by connect().
                    return;
                }
                let _ = ConnInner::connect(&inner).await;
                if *inner.state.lock() == ConnectionState::Connected {
                    return;
                }
                // Still disconnected: stay armed and try again after the
                // same fixed delay.
            }
        });
        *this.timer_task.lock() = Some(handle);
    }

    async fn close(this: &Arc<Self>) {
        this.shutdown.store(true, Ordering::SeqCst);
        if let Some(timer) = this.timer_task.lock().take() {
            timer.abort();
        }

        // Wait out any in-flight connect attempt before tearing down.
        let _guard = this.connect_guard.lock().await;
        Self::teardown_link(this).await;
        Self::apply(this, ConnEvent::Shutdown);
        this.reconnect_pending.store(false, Ordering::SeqCst);
        debug!("connection manager closed");
    }

    async fn teardown_link(this: &Arc<Self>) {
        if let Some(adapter) = this.adapter_task.lock().take() {
            adapter.abort();
        }
        if let Some(mut sink) = this.sink.lock().await.take() {
            sink.close().await;
        }
    }
}
