//! Shared fakes for integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::Instant;

use yure_client::sensor::SampleSource;
use yure_client::status::{ServiceStatus, StatusSink};
use yure_client::streamer::{MessageSink, StreamerError, Transport, TransportEvent, TransportLink};
use yure_client::types::Sample;

/// Transport with scripted connect/send outcomes and attempt accounting.
#[derive(Default)]
pub struct MockTransport {
    connect_attempts: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    connect_times: Mutex<Vec<Instant>>,
    fail_next_connects: AtomicUsize,
    fail_sends: Arc<AtomicBool>,
    sent: Arc<Mutex<Vec<String>>>,
    last_events: Mutex<Option<mpsc::Sender<TransportEvent>>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail the next `n` connect attempts before letting one succeed.
    pub fn fail_next_connects(&self, n: usize) {
        self.fail_next_connects.store(n, Ordering::SeqCst);
    }

    /// Make every send fail until cleared.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> usize {
        self.connect_attempts.load(Ordering::SeqCst)
    }

    /// Most connect attempts that were ever in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn connect_times(&self) -> Vec<Instant> {
        self.connect_times.lock().clone()
    }

    pub fn sent_payloads(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    /// Inject a read-side event on the most recent link.
    pub async fn emit(&self, event: TransportEvent) {
        let tx = self.last_events.lock().clone();
        if let Some(tx) = tx {
            let _ = tx.send(event).await;
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open(&self, _url: &str) -> Result<TransportLink, StreamerError> {
        self.connect_attempts.fetch_add(1, Ordering::SeqCst);
        self.connect_times.lock().push(Instant::now());

        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        // Give a concurrent attempt the chance to overlap before returning.
        tokio::task::yield_now().await;

        let scripted_failure = self
            .fail_next_connects
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();

        let result = if scripted_failure {
            Err(StreamerError::ConnectionFailed("scripted failure".into()))
        } else {
            let (event_tx, events) = mpsc::channel(8);
            *self.last_events.lock() = Some(event_tx);
            Ok(TransportLink {
                sink: Box::new(MockSink {
                    fail_sends: Arc::clone(&self.fail_sends),
                    sent: Arc::clone(&self.sent),
                }),
                events,
            })
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

pub struct MockSink {
    fail_sends: Arc<AtomicBool>,
    sent: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl MessageSink for MockSink {
    async fn send_text(&mut self, payload: String) -> Result<(), StreamerError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(StreamerError::SendFailed("scripted send failure".into()));
        }
        self.sent.lock().push(payload);
        Ok(())
    }

    async fn close(&mut self) {}
}

/// Records every status update the service reports.
#[derive(Default)]
pub struct RecordingStatusSink {
    updates: Mutex<Vec<ServiceStatus>>,
}

impl RecordingStatusSink {
    pub fn updates(&self) -> Vec<ServiceStatus> {
        self.updates.lock().clone()
    }

    pub fn last(&self) -> Option<ServiceStatus> {
        self.updates.lock().last().copied()
    }
}

impl StatusSink for RecordingStatusSink {
    fn update(&self, status: ServiceStatus) {
        self.updates.lock().push(status);
    }
}

/// Sample source fed by the test through a channel.
pub struct ChannelSource {
    rx: Mutex<Option<mpsc::Receiver<Sample>>>,
}

impl ChannelSource {
    pub fn new() -> (mpsc::Sender<Sample>, Self) {
        let (tx, rx) = mpsc::channel(256);
        (
            tx,
            Self {
                rx: Mutex::new(Some(rx)),
            },
        )
    }
}

impl SampleSource for ChannelSource {
    fn subscribe(&self) -> Result<mpsc::Receiver<Sample>, StreamerError> {
        self.rx
            .lock()
            .take()
            .ok_or_else(|| StreamerError::SensorUnavailable("source already subscribed".into()))
    }
}

/// Sample whose timestamp doubles as a sequence number.
pub fn sample(seq: i64) -> Sample {
    Sample::new(
        "YUREyureYUR".to_string(),
        seq as f64,
        0.5,
        9.8,
        seq,
        Some("yure-client test".to_string()),
    )
}
