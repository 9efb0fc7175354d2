/// Configuration for a [`HandoffQueue`](crate::HandoffQueue).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    /// Maximum number of buffered items (must be > 0)
    pub capacity: usize,
}

impl QueueConfig {
    /// Creates a new configuration with the given capacity.
    pub const fn new(capacity: usize) -> Self {
        Self { capacity }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { capacity: 16 }
    }
}

/// Low latency configuration (small buffer, writer feels backpressure early)
pub const LOW_LATENCY_QUEUE: QueueConfig = QueueConfig::new(4);

/// High throughput configuration (deep buffer absorbs bursts)
pub const HIGH_THROUGHPUT_QUEUE: QueueConfig = QueueConfig::new(256);
