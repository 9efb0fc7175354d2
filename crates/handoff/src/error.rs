use thiserror::Error;

/// Errors raised while constructing a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    /// Capacity must be strictly positive.
    #[error("queue capacity must be greater than zero")]
    ZeroCapacity,
}

/// A failed `put`. The rejected item is handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PutError<T> {
    /// The queue was poisoned; no further items are accepted.
    #[error("queue is poisoned")]
    Poisoned(T),

    /// No space became available before the deadline.
    #[error("timed out waiting for queue space")]
    Timeout(T),
}

impl<T> PutError<T> {
    /// Returns the item that could not be enqueued.
    pub fn into_inner(self) -> T {
        match self {
            Self::Poisoned(item) | Self::Timeout(item) => item,
        }
    }
}

/// A failed `take`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TakeError {
    /// The poison slot was reached; the queue is shut down.
    #[error("queue is poisoned")]
    Poisoned,

    /// The wait was cancelled through its token.
    #[error("take was canceled")]
    Canceled,
}
