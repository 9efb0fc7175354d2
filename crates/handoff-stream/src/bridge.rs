//! Control channel from the writer thread into the stream's poll turn.
//!
//! Flush and close are rendezvous operations: the writer sends a request and
//! parks until the consumer settles it on its own turn. Requests travel over
//! an unbounded mpsc channel; each carries a oneshot completion that is
//! settled exactly once with the downstream status at resolution time.
//! A waiting writer is also released by the shared downstream token, so a
//! cancel from outside the poll turn never leaves it parked.

use handoff_rs::{CancellationToken, DownstreamStatus};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::time::error::Elapsed;

/// Kind of rendezvous the writer asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ControlKind {
    Flush,
    Close,
}

/// A control request plus its completion handle.
#[derive(Debug)]
pub(crate) struct ControlRequest {
    pub(crate) kind: ControlKind,
    completion: oneshot::Sender<DownstreamStatus>,
}

impl ControlRequest {
    /// Settles the request. Returns `false` if nobody is listening anymore
    /// (the writer timed out and dropped its handle).
    pub(crate) fn complete(self, status: DownstreamStatus) -> bool {
        self.completion.send(status).is_ok()
    }

    /// Returns `true` once the writer stopped waiting for this request.
    pub(crate) fn is_abandoned(&self) -> bool {
        self.completion.is_closed()
    }
}

pub(crate) type BridgeReceiver = mpsc::UnboundedReceiver<ControlRequest>;

/// Writer-side end of the control channel.
#[derive(Debug)]
pub(crate) struct AsyncBridge {
    tx: mpsc::UnboundedSender<ControlRequest>,
    runtime: Handle,
    downstream: CancellationToken,
}

/// Creates a connected bridge. `runtime` drives the writer's bounded waits;
/// `downstream` is fired when the consumer side tears down.
pub(crate) fn bridge(
    runtime: Handle,
    downstream: CancellationToken,
) -> (AsyncBridge, BridgeReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        AsyncBridge {
            tx,
            runtime,
            downstream,
        },
        rx,
    )
}

impl AsyncBridge {
    /// Enqueues a request for the consumer's next turn.
    ///
    /// If the consumer is already gone the request is dropped here, which
    /// drops its completion: the returned handle then reads as canceled.
    pub(crate) fn send(&self, kind: ControlKind) -> ControlHandle {
        let (completion, rx) = oneshot::channel();
        if self.tx.send(ControlRequest { kind, completion }).is_err() {
            tracing::trace!(?kind, "control request sent after consumer shut down");
        }
        ControlHandle {
            rx,
            runtime: self.runtime.clone(),
            downstream: self.downstream.clone(),
        }
    }
}

/// Future-like handle for one control request.
#[derive(Debug)]
pub(crate) struct ControlHandle {
    rx: oneshot::Receiver<DownstreamStatus>,
    runtime: Handle,
    downstream: CancellationToken,
}

impl ControlHandle {
    /// Blocks the calling thread until the request is settled or `timeout`
    /// elapses. A completion dropped without being settled means the
    /// consumer is gone and reads as [`DownstreamStatus::Canceled`]; so does
    /// a fired downstream token, even if the request is still unsettled.
    ///
    /// Must not be called from within an async task.
    pub(crate) fn wait(self, timeout: Duration) -> Result<DownstreamStatus, Elapsed> {
        let Self {
            rx,
            runtime,
            downstream,
        } = self;
        runtime.block_on(async move {
            tokio::time::timeout(timeout, async move {
                tokio::select! {
                    biased;
                    settled = rx => settled.unwrap_or(DownstreamStatus::Canceled),
                    () = downstream.cancelled() => DownstreamStatus::Canceled,
                }
            })
            .await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_requests_arrive_in_order_and_settle() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (bridge, mut rx) = bridge(runtime.handle().clone(), CancellationToken::new());

        let flush = bridge.send(ControlKind::Flush);
        let close = bridge.send(ControlKind::Close);

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert_eq!(first.kind, ControlKind::Flush);
        assert_eq!(second.kind, ControlKind::Close);

        assert!(first.complete(DownstreamStatus::Open));
        assert!(second.complete(DownstreamStatus::Canceled));

        let waiter = thread::spawn(move || {
            (
                flush.wait(Duration::from_secs(1)),
                close.wait(Duration::from_secs(1)),
            )
        });
        let (flush, close) = waiter.join().unwrap();
        assert_eq!(flush.unwrap(), DownstreamStatus::Open);
        assert_eq!(close.unwrap(), DownstreamStatus::Canceled);
    }

    #[test]
    fn test_wait_times_out_and_abandons() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (bridge, mut rx) = bridge(runtime.handle().clone(), CancellationToken::new());

        let handle = bridge.send(ControlKind::Flush);
        let waiter = thread::spawn(move || handle.wait(Duration::from_millis(20)));
        assert!(waiter.join().unwrap().is_err());

        let request = rx.try_recv().unwrap();
        assert!(request.is_abandoned());
        assert!(!request.complete(DownstreamStatus::Open));
    }

    #[test]
    fn test_consumer_gone_reads_as_canceled() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (bridge, rx) = bridge(runtime.handle().clone(), CancellationToken::new());
        drop(rx);

        let handle = bridge.send(ControlKind::Close);
        let waiter = thread::spawn(move || handle.wait(Duration::from_secs(1)));
        assert_eq!(waiter.join().unwrap().unwrap(), DownstreamStatus::Canceled);
    }

    #[test]
    fn test_downstream_token_releases_unsettled_wait() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let downstream = CancellationToken::new();
        let (bridge, mut rx) = bridge(runtime.handle().clone(), downstream.clone());

        let handle = bridge.send(ControlKind::Flush);
        let waiter = thread::spawn(move || {
            let start = std::time::Instant::now();
            (handle.wait(Duration::from_secs(5)), start.elapsed())
        });

        thread::sleep(Duration::from_millis(50));
        downstream.cancel();

        let (status, elapsed) = waiter.join().unwrap();
        assert_eq!(status.unwrap(), DownstreamStatus::Canceled);
        assert!(elapsed < Duration::from_secs(2));

        // The request itself was never settled by the consumer
        let request = rx.try_recv().unwrap();
        assert!(request.is_abandoned());
    }
}
