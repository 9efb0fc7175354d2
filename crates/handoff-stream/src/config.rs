//! Configuration for the writer/stream bridge.

use crate::error::ConfigError;
use handoff_rs::QueueConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for an [`output_stream`](crate::output_stream) bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Number of chunks the handoff queue buffers before `write` blocks.
    ///
    /// Must be > 0. Default: 16
    pub capacity: usize,

    /// Upper bound for every blocking writer call (write, flush, close).
    ///
    /// Unbounded waits are not supported; must be > 0. Default: 5s
    pub timeout: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            capacity: 16,
            timeout: Duration::from_secs(5),
        }
    }
}

impl StreamConfig {
    /// Small buffer and short timeout: the writer learns about a slow or
    /// dead consumer quickly.
    pub fn low_latency() -> Self {
        Self {
            capacity: 4,
            timeout: Duration::from_secs(1),
        }
    }

    /// Deep buffer and generous timeout for bulk transfers.
    pub fn high_throughput() -> Self {
        Self {
            capacity: 256,
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the queue capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the writer timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Rejects non-positive capacity and timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    pub(crate) fn queue_config(&self) -> QueueConfig {
        QueueConfig::new(self.capacity)
    }
}
