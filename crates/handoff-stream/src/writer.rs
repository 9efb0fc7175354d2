//! Blocking writer front-end implementing `std::io::Write`.

use crate::bridge::{AsyncBridge, ControlKind};
use crate::error::{Operation, StreamError};
use crate::metrics::BridgeMetrics;
use bytes::Bytes;
use handoff_rs::{HandoffQueue, LifecycleGuard, PutError};
use std::io;
use std::sync::Arc;
use std::time::Duration;

/// Blocking writer feeding the paired
/// [`OutputStreamSource`](crate::OutputStreamSource).
///
/// Every call blocks the calling thread, bounded by the configured timeout:
/// writes block while the handoff queue is full, flush and close block until
/// the stream settles the request on its next poll.
///
/// # Note
///
/// `StreamWriter` does NOT implement `Clone`: exactly one thread writes.
/// It must not be used from inside an async task; move it to a dedicated
/// thread or `spawn_blocking`.
///
/// Dropping the writer without calling [`close`](Self::close) lets the
/// stream drain what was written and then end.
pub struct StreamWriter {
    queue: Arc<HandoffQueue<Bytes>>,
    guard: Arc<LifecycleGuard>,
    bridge: AsyncBridge,
    metrics: Arc<BridgeMetrics>,
    timeout: Duration,
    is_open: bool,
    /// Sticky: once the downstream is known to be gone it stays gone.
    is_downstream_alive: bool,
}

impl StreamWriter {
    pub(crate) fn new(
        queue: Arc<HandoffQueue<Bytes>>,
        guard: Arc<LifecycleGuard>,
        bridge: AsyncBridge,
        metrics: Arc<BridgeMetrics>,
        timeout: Duration,
    ) -> Self {
        Self {
            queue,
            guard,
            bridge,
            metrics,
            timeout,
            is_open: true,
            is_downstream_alive: true,
        }
    }

    /// Copies `buf` into a chunk and enqueues it.
    pub fn try_write(&mut self, buf: &[u8]) -> Result<(), StreamError> {
        self.ensure_writable()?;
        if buf.is_empty() {
            return Ok(());
        }
        self.enqueue(Bytes::copy_from_slice(buf))
    }

    /// Enqueues an owned chunk without copying.
    pub fn try_write_bytes(&mut self, chunk: Bytes) -> Result<(), StreamError> {
        self.ensure_writable()?;
        if chunk.is_empty() {
            return Ok(());
        }
        self.enqueue(chunk)
    }

    /// Waits until every chunk written so far has been taken by the stream.
    ///
    /// Fails with [`StreamError::Terminated`] if the downstream is canceled
    /// before that happens.
    pub fn try_flush(&mut self) -> Result<(), StreamError> {
        self.ensure_writable()?;

        let status = self
            .bridge
            .send(ControlKind::Flush)
            .wait(self.timeout)
            .map_err(|_| self.timed_out(Operation::Flush))?;

        if status.is_canceled() {
            self.is_downstream_alive = false;
            return Err(StreamError::Terminated);
        }
        Ok(())
    }

    /// Closes the writer and ends the stream once everything written is taken.
    ///
    /// Succeeds even if the downstream already canceled. Idempotent: calls
    /// after the first one return `Ok(())`. The writer is closed afterwards
    /// even if the wait timed out.
    pub fn close(&mut self) -> Result<(), StreamError> {
        if !self.is_open {
            return Ok(());
        }

        let result = if self.is_downstream_alive && !self.guard.is_canceled() {
            self.bridge.send(ControlKind::Close).wait(self.timeout)
        } else {
            Ok(self.guard.status())
        };
        self.is_open = false;

        match result {
            Ok(status) => {
                tracing::debug!(?status, "writer closed");
                Ok(())
            }
            Err(_) => Err(self.timed_out(Operation::Close)),
        }
    }

    /// Returns `true` until [`close`](Self::close) has been called.
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn metrics(&self) -> &Arc<BridgeMetrics> {
        &self.metrics
    }

    fn ensure_writable(&self) -> Result<(), StreamError> {
        if !self.is_open {
            return Err(StreamError::Closed);
        }
        if !self.is_downstream_alive {
            return Err(StreamError::Terminated);
        }
        Ok(())
    }

    fn enqueue(&mut self, chunk: Bytes) -> Result<(), StreamError> {
        let len = chunk.len();

        match self.queue.put_timeout(chunk, self.timeout) {
            Ok(()) => self.metrics.record_written(len),
            Err(PutError::Poisoned(_)) if self.guard.is_canceled() => {
                self.is_downstream_alive = false;
                return Err(StreamError::Terminated);
            }
            Err(err @ PutError::Poisoned(_)) => {
                return Err(StreamError::Enqueue(err.to_string()));
            }
            Err(PutError::Timeout(_)) => return Err(self.timed_out(Operation::Write)),
        }

        // The chunk may be buffered already, but the caller has to learn now
        // that nothing more will be read.
        if self.guard.is_canceled() {
            self.is_downstream_alive = false;
            return Err(StreamError::Terminated);
        }
        Ok(())
    }

    fn timed_out(&self, operation: Operation) -> StreamError {
        self.metrics.record_timeout();
        tracing::warn!(%operation, timeout = ?self.timeout, "writer call timed out");
        StreamError::Timeout {
            operation,
            after: self.timeout,
        }
    }
}

impl io::Write for StreamWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.try_write(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.try_flush()?;
        Ok(())
    }
}

impl std::fmt::Debug for StreamWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamWriter")
            .field("is_open", &self.is_open)
            .field("is_downstream_alive", &self.is_downstream_alive)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
