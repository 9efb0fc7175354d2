use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters shared by the writer and the stream (relaxed atomics).
#[derive(Debug, Default)]
pub struct BridgeMetrics {
    chunks_written: AtomicU64,
    bytes_written: AtomicU64,
    chunks_delivered: AtomicU64,
    bytes_delivered: AtomicU64,
    flushes_resolved: AtomicU64,
    timeouts: AtomicU64,
}

impl BridgeMetrics {
    pub fn chunks_written(&self) -> u64 {
        self.chunks_written.load(Ordering::Relaxed)
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    pub fn chunks_delivered(&self) -> u64 {
        self.chunks_delivered.load(Ordering::Relaxed)
    }

    pub fn bytes_delivered(&self) -> u64 {
        self.bytes_delivered.load(Ordering::Relaxed)
    }

    pub fn flushes_resolved(&self) -> u64 {
        self.flushes_resolved.load(Ordering::Relaxed)
    }

    /// Writer calls that gave up on the configured timeout.
    pub fn timeouts(&self) -> u64 {
        self.timeouts.load(Ordering::Relaxed)
    }

    pub(crate) fn record_written(&self, len: usize) {
        self.chunks_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(len as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_delivered(&self, len: usize) {
        self.chunks_delivered.fetch_add(1, Ordering::Relaxed);
        self.bytes_delivered.fetch_add(len as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_flush(&self) {
        self.flushes_resolved.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }
}
