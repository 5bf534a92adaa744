//! Lock-guarded sample queue between ingestion and transmission

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::types::Sample;

/// Ordered queue of samples awaiting transmission.
///
/// Every operation takes the single writer lock, so no caller observes a
/// partial state. The lock is held only for queue bookkeeping; drained
/// batches are moved out and sent with no lock held.
#[derive(Default)]
pub struct SampleBuffer {
    queue: Mutex<VecDeque<Sample>>,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one sample to the tail. Returns the new length.
    pub fn enqueue(&self, sample: Sample) -> usize {
        let mut queue = self.queue.lock();
        queue.push_back(sample);
        queue.len()
    }

    /// Atomically detach and return the whole queue, oldest first.
    ///
    /// An empty buffer yields an empty batch, not an error.
    pub fn drain_all(&self) -> Vec<Sample> {
        let mut queue = self.queue.lock();
        queue.drain(..).collect()
    }

    /// Reinsert a failed batch at the head, ahead of anything enqueued
    /// since, preserving the batch's internal order.
    pub fn requeue_front(&self, batch: Vec<Sample>) {
        let mut queue = self.queue.lock();
        for sample in batch.into_iter().rev() {
            queue.push_front(sample);
        }
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}
