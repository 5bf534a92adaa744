//! Streaming service: composition root for source → buffer → connection
//!
//! Applies the flush-threshold policy, re-queues failed batches at the
//! buffer head, and reports status to the external notifier. The buffer
//! lock is only ever held for queue bookkeeping; serialization and the
//! network send happen with no lock held, so a slow network never stalls
//! ingestion.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::buffer::SampleBuffer;
use super::connection::{ConnectionManager, ConnectionState};
use super::errors::StreamerError;
use super::telemetry::StreamerMetrics;
use crate::sensor::SampleSource;
use crate::status::{ServiceStatus, StatusSink};
use crate::types::Sample;

/// Wires a sample source into the buffered, reconnecting uplink.
pub struct StreamingService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    buffer: SampleBuffer,
    connection: ConnectionManager,
    /// Buffered samples at or above this count trigger a flush
    flush_threshold: usize,
    /// At most one drain/re-queue in flight; `stop()` waits on it too
    flush_guard: AsyncMutex<()>,
    status: Arc<dyn StatusSink>,
    metrics: Arc<StreamerMetrics>,
    ingest_task: Mutex<Option<JoinHandle<()>>>,
    /// Asks the ingest loop to wind down between samples
    shutdown: Notify,
    running: AtomicBool,
}

impl StreamingService {
    pub fn new(
        connection: ConnectionManager,
        status: Arc<dyn StatusSink>,
        metrics: Arc<StreamerMetrics>,
        flush_threshold: usize,
    ) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                buffer: SampleBuffer::new(),
                connection,
                flush_threshold: flush_threshold.max(1),
                flush_guard: AsyncMutex::new(()),
                status,
                metrics,
                ingest_task: Mutex::new(None),
                shutdown: Notify::new(),
                running: AtomicBool::new(false),
            }),
        }
    }

    /// Subscribe the source and open the connection.
    ///
    /// Sensor unavailability is fatal to starting and is returned as an
    /// error; a failed first connection attempt is not — it arms the
    /// reconnect loop instead.
    pub async fn start(&self, source: &dyn SampleSource) -> Result<(), StreamerError> {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            warn!("streaming service already running");
            return Ok(());
        }

        let mut samples = match source.subscribe() {
            Ok(samples) => samples,
            Err(e) => {
                self.inner.running.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            // Never interrupted mid-flush: shutdown is only observed between
            // samples, and dropping `samples` at the end unregisters the
            // source.
            loop {
                tokio::select! {
                    biased;

                    _ = inner.shutdown.notified() => break,

                    maybe = samples.recv() => match maybe {
                        Some(sample) => ServiceInner::on_sample(&inner, sample).await,
                        None => break,
                    },
                }
            }
            debug!("sample stream ended");
        });
        *self.inner.ingest_task.lock() = Some(handle);

        if let Err(e) = self.inner.connection.connect().await {
            warn!("initial connection attempt failed: {}", e);
        }
        Ok(())
    }

    /// Enqueue one sample, flushing when the threshold is reached.
    pub async fn on_sample(&self, sample: Sample) {
        ServiceInner::on_sample(&self.inner, sample).await;
    }

    /// Drain the buffer and attempt one transmission of its contents.
    ///
    /// Returns the number of samples handed to the transport; zero when the
    /// buffer was empty (no send is attempted). On failure the batch is back
    /// at the buffer head and the reconnect timer is armed.
    pub async fn flush(&self) -> Result<usize, StreamerError> {
        ServiceInner::flush(&self.inner).await
    }

    /// Unsubscribe the source, drain what is left, and close the transport.
    ///
    /// Waits out any in-flight flush, so a batch mid-send either completes
    /// or is re-queued — never dropped.
    pub async fn stop(&self) {
        if !self.inner.running.swap(false, Ordering::SeqCst) {
            return;
        }

        // Wind the ingest loop down and wait it out, so any flush it is in
        // the middle of completes or re-queues its batch first.
        let ingest = self.inner.ingest_task.lock().take();
        self.inner.shutdown.notify_one();
        if let Some(ingest) = ingest {
            let _ = ingest.await;
        }

        if let Err(e) = ServiceInner::flush(&self.inner).await {
            warn!("final flush failed, {} samples unsent: {}", self.buffered(), e);
        }

        self.inner.connection.close().await;
        self.inner.status.update(ServiceStatus::Stopped);
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Samples currently waiting for transmission
    pub fn buffered(&self) -> usize {
        self.inner.buffer.len()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.inner.connection.state()
    }

    /// The managed connection, e.g. for driving reconnects in tests
    pub fn connection(&self) -> &ConnectionManager {
        &self.inner.connection
    }
}

impl ServiceInner {
    async fn on_sample(this: &Arc<Self>, sample: Sample) {
        this.metrics.samples_captured.fetch_add(1, Ordering::Relaxed);
        let buffered = this.buffer.enqueue(sample);
        if buffered >= this.flush_threshold {
            // Failures are already re-queued and logged inside flush.
            let _ = Self::flush(this).await;
        }
    }

    async fn flush(this: &Arc<Self>) -> Result<usize, StreamerError> {
        let _guard = this.flush_guard.lock().await;

        let batch = this.buffer.drain_all();
        if batch.is_empty() {
            return Ok(0);
        }
        let count = batch.len();

        let payload = match serde_json::to_string(&batch) {
            Ok(payload) => payload,
            Err(e) => {
                // The wire schema is fixed; reaching this is a defect. Keep
                // the samples rather than losing them.
                error!("batch serialization failed: {}", e);
                this.buffer.requeue_front(batch);
                return Err(StreamerError::Serialization(e));
            }
        };

        match this.connection.send(payload).await {
            Ok(()) => {
                this.metrics.batches_sent.fetch_add(1, Ordering::Relaxed);
                this.metrics
                    .samples_sent
                    .fetch_add(count as u64, Ordering::Relaxed);
                this.status.update(ServiceStatus::Sending(count));
                debug!(count, "batch sent");
                Ok(count)
            }
            Err(e) => {
                this.metrics.send_failures.fetch_add(1, Ordering::Relaxed);
                this.buffer.requeue_front(batch);
                this.connection.schedule_reconnect();
                debug!("send failed, batch of {} re-queued: {}", count, e);
                Err(e)
            }
        }
    }
}
