//! Shutdown utilities for tearing the bridge down from the consumer side.

use bytes::Bytes;
use handoff_rs::{CancellationToken, HandoffQueue, LifecycleGuard};
use std::sync::Arc;

/// Runs the teardown steps shared by every shutdown path.
///
/// 1. Force the downstream status to `Canceled`
/// 2. Clear the queue and insert the poison slot, releasing a parked writer
///    and any parked take
/// 3. Cancel the recorded in-flight take, if any, and wake takers
/// 4. Fire `downstream`, releasing a writer parked on a flush or close
///
/// Steps 2 and 3 are both attempted: either one alone can race with a take
/// that is just about to start waiting. Returns `true` if this call moved
/// the status to `Canceled`.
pub(crate) fn teardown(
    guard: &LifecycleGuard,
    queue: &HandoffQueue<Bytes>,
    in_flight: Option<&CancellationToken>,
    downstream: &CancellationToken,
) -> bool {
    let first = guard.cancel();
    queue.poison();

    if let Some(token) = in_flight {
        token.cancel();
        queue.wake_takers();
    }

    downstream.cancel();
    first
}

/// A cloneable handle for canceling the stream from another task or thread.
///
/// Canceling has the same effect as the consumer dropping the stream: the
/// writer's next call fails with [`StreamError::Terminated`], and a write
/// parked on a full queue or a flush waiting for the stream is released at
/// once. The stream itself ends on its next poll. Only the first call has
/// any effect.
///
/// [`StreamError::Terminated`]: crate::StreamError::Terminated
#[derive(Clone)]
pub struct CancelSignal {
    guard: Arc<LifecycleGuard>,
    queue: Arc<HandoffQueue<Bytes>>,
    downstream: CancellationToken,
}

impl CancelSignal {
    pub(crate) fn new(
        guard: Arc<LifecycleGuard>,
        queue: Arc<HandoffQueue<Bytes>>,
        downstream: CancellationToken,
    ) -> Self {
        Self {
            guard,
            queue,
            downstream,
        }
    }

    /// Cancels the stream.
    pub fn cancel(&self) {
        if teardown(&self.guard, &self.queue, None, &self.downstream) {
            tracing::debug!("stream canceled through signal");
        }
    }

    /// Returns `true` once the stream is canceled, by any path.
    pub fn is_canceled(&self) -> bool {
        self.guard.is_canceled()
    }
}

impl std::fmt::Debug for CancelSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelSignal")
            .field("status", &self.guard.status())
            .finish()
    }
}
