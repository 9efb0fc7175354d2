//! Pull-driven async stream fed by the blocking writer.

use crate::bridge::{BridgeReceiver, ControlKind, ControlRequest};
#[cfg(debug_assertions)]
use crate::invariants::{
    debug_assert_running, debug_assert_shutdown_complete, debug_assert_superseded_abandoned,
};
use crate::metrics::BridgeMetrics;
use crate::shutdown::{teardown, CancelSignal};
use bytes::Bytes;
use futures_core::Stream;
use handoff_rs::{CancellationToken, DownstreamStatus, HandoffQueue, LifecycleGuard, TakeError};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// A blocking take running on the runtime's blocking pool.
struct InFlightTake {
    task: JoinHandle<Result<Bytes, TakeError>>,
    /// Releases the pool thread if it is parked on an empty queue.
    cancel: CancellationToken,
}

/// Async stream of the chunks written through the paired
/// [`StreamWriter`](crate::StreamWriter).
///
/// Each `poll_next` is one turn of a single-threaded controller:
///
/// 1. Drain control requests (flush, close) sent by the writer
/// 2. Take the next chunk: without blocking if one is buffered, otherwise
///    through a blocking take offloaded to `spawn_blocking`
/// 3. Settle pending requests once the queue is observed empty
///
/// The turn itself never blocks. All controller state (pending requests,
/// in-flight take) is only touched from `poll_next` and `Drop`, so it needs
/// no synchronization.
///
/// # Cancellation
///
/// Dropping the stream, calling [`cancel`](Self::cancel), or firing a
/// [`CancelSignal`] marks the downstream as canceled. Pending requests are
/// settled at once without waiting for the queue to drain, the queue is
/// poisoned, and a parked take is released.
pub struct OutputStreamSource {
    queue: Arc<HandoffQueue<Bytes>>,
    guard: Arc<LifecycleGuard>,
    requests: BridgeReceiver,
    runtime: Handle,
    metrics: Arc<BridgeMetrics>,
    /// Fired by teardown; writers waiting on a control request watch it.
    downstream: CancellationToken,
    in_flight: Option<InFlightTake>,
    pending_flush: Option<ControlRequest>,
    pending_close: Option<ControlRequest>,
    /// The writer was dropped; behaves like a close nobody waits for.
    writer_gone: bool,
    terminated: bool,
}

impl OutputStreamSource {
    pub(crate) fn new(
        queue: Arc<HandoffQueue<Bytes>>,
        guard: Arc<LifecycleGuard>,
        requests: BridgeReceiver,
        runtime: Handle,
        metrics: Arc<BridgeMetrics>,
        downstream: CancellationToken,
    ) -> Self {
        Self {
            queue,
            guard,
            requests,
            runtime,
            metrics,
            downstream,
            in_flight: None,
            pending_flush: None,
            pending_close: None,
            writer_gone: false,
            terminated: false,
        }
    }

    /// Cancels the stream from the consumer side.
    ///
    /// Subsequent polls return `None`.
    pub fn cancel(&mut self) {
        self.shutdown();
    }

    /// Returns a cloneable signal that cancels this stream from elsewhere.
    pub fn cancel_signal(&self) -> CancelSignal {
        CancelSignal::new(
            Arc::clone(&self.guard),
            Arc::clone(&self.queue),
            self.downstream.clone(),
        )
    }

    /// Returns `true` once the stream has ended, by close or cancellation.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn metrics(&self) -> &Arc<BridgeMetrics> {
        &self.metrics
    }

    /// Number of chunks buffered and not yet taken.
    pub fn buffered_count(&self) -> usize {
        self.queue.len()
    }

    #[inline]
    fn closing(&self) -> bool {
        self.pending_close.is_some() || self.writer_gone
    }

    fn poll_requests(&mut self, cx: &mut Context<'_>) {
        while !self.writer_gone {
            match self.requests.poll_recv(cx) {
                Poll::Ready(Some(request)) => self.register(request),
                Poll::Ready(None) => {
                    tracing::debug!("writer disconnected; completing once drained");
                    self.writer_gone = true;
                }
                Poll::Pending => break,
            }
        }
        self.resolve_pending();
    }

    fn register(&mut self, request: ControlRequest) {
        let kind = request.kind;
        let slot = match kind {
            ControlKind::Flush => &mut self.pending_flush,
            ControlKind::Close => &mut self.pending_close,
        };

        // A previous same-kind request is still here only if its writer
        // timed out. Replacing it keeps a stale resolution from ever
        // answering the new request.
        if let Some(stale) = slot.replace(request) {
            #[cfg(debug_assertions)]
            debug_assert_superseded_abandoned!(kind, stale.is_abandoned());

            tracing::trace!(?kind, "superseding timed-out control request");
            drop(stale);
        }
    }

    /// Settles pending requests if the queue is empty or downstream is gone.
    ///
    /// A close also waits for the in-flight take: a chunk it already
    /// dequeued is still delivered before the stream ends.
    fn resolve_pending(&mut self) {
        let canceled = self.guard.is_canceled();
        if !canceled && !self.queue.is_empty() {
            return;
        }

        let status = self.guard.status();
        if let Some(flush) = self.pending_flush.take() {
            self.metrics.record_flush();
            flush.complete(status);
        }

        if self.closing() && (canceled || self.in_flight.is_none()) {
            if let Some(close) = self.pending_close.take() {
                close.complete(status);
            }
            tracing::debug!("stream closed by writer");
            self.shutdown();
        }
    }

    fn spawn_take(&mut self) {
        let queue = Arc::clone(&self.queue);
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let task = self.runtime.spawn_blocking(move || queue.take(&token));
        self.in_flight = Some(InFlightTake { task, cancel });
    }

    /// Terminates the stream. Idempotent.
    fn shutdown(&mut self) {
        let in_flight = self.in_flight.take();
        let first = teardown(
            &self.guard,
            &self.queue,
            in_flight.as_ref().map(|take| &take.cancel),
            &self.downstream,
        );
        // Dropping the join handle detaches the pool thread; the poison slot
        // and its token make sure it is not parked anymore.
        drop(in_flight);

        let status = DownstreamStatus::Canceled;
        if let Some(flush) = self.pending_flush.take() {
            flush.complete(status);
        }
        if let Some(close) = self.pending_close.take() {
            close.complete(status);
        }

        // Requests sent after this point fail at the writer and read as canceled
        self.requests.close();
        while let Ok(request) = self.requests.try_recv() {
            request.complete(status);
        }

        #[cfg(debug_assertions)]
        debug_assert_shutdown_complete!(self.guard.is_canceled(), self.queue.is_poisoned());

        if !self.terminated {
            tracing::debug!(
                canceled_here = first,
                delivered = self.metrics.chunks_delivered(),
                "stream terminated"
            );
        }
        self.terminated = true;
    }
}

impl Stream for OutputStreamSource {
    type Item = Bytes;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if this.terminated {
                return Poll::Ready(None);
            }

            this.poll_requests(cx);
            if this.terminated {
                return Poll::Ready(None);
            }

            if this.guard.is_canceled() {
                this.shutdown();
                return Poll::Ready(None);
            }

            // Closing with nothing left: release the parked take so the
            // close can settle once it reports back.
            if this.closing() && this.queue.is_empty() {
                if let Some(take) = &this.in_flight {
                    take.cancel.cancel();
                    this.queue.wake_takers();
                }
            }

            let chunk = if let Some(take) = this.in_flight.as_mut() {
                let Poll::Ready(result) = Pin::new(&mut take.task).poll(cx) else {
                    return Poll::Pending;
                };
                this.in_flight = None;

                match result {
                    Ok(Ok(chunk)) => chunk,
                    Ok(Err(err)) => {
                        tracing::trace!(%err, "blocking take ended");
                        this.shutdown();
                        return Poll::Ready(None);
                    }
                    Err(err) => {
                        tracing::warn!(%err, "blocking take task failed");
                        this.shutdown();
                        return Poll::Ready(None);
                    }
                }
            } else {
                match this.queue.try_take() {
                    Some(Ok(chunk)) => chunk,
                    Some(Err(_)) => {
                        this.shutdown();
                        return Poll::Ready(None);
                    }
                    None if this.closing() => {
                        this.resolve_pending();
                        continue;
                    }
                    None => {
                        this.spawn_take();
                        continue;
                    }
                }
            };

            // Downstream may have been canceled while the take was running
            if this.guard.is_canceled() {
                this.shutdown();
                return Poll::Ready(None);
            }

            #[cfg(debug_assertions)]
            debug_assert_running!(this.terminated);

            tracing::trace!(len = chunk.len(), "delivering chunk");
            this.metrics.record_delivered(chunk.len());
            this.resolve_pending();
            return Poll::Ready(Some(chunk));
        }
    }
}

impl Drop for OutputStreamSource {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for OutputStreamSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputStreamSource")
            .field("queue", &self.queue)
            .field("status", &self.guard.status())
            .field("in_flight", &self.in_flight.is_some())
            .field("terminated", &self.terminated)
            .finish_non_exhaustive()
    }
}
