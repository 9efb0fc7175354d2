//! Error types for handoff-stream operations.

use handoff_rs::QueueError;
use std::fmt;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while setting up a bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Queue capacity must be greater than zero.
    #[error("queue capacity must be greater than zero")]
    ZeroCapacity,

    /// The writer timeout must be greater than zero.
    #[error("writer timeout must be greater than zero")]
    ZeroTimeout,

    /// `output_stream` was called outside a tokio runtime.
    #[error("no tokio runtime available; use output_stream_with_handle")]
    NoRuntime,
}

impl From<QueueError> for ConfigError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::ZeroCapacity => Self::ZeroCapacity,
        }
    }
}

/// Writer call that produced a [`StreamError::Timeout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Write,
    Flush,
    Close,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Write => "write",
            Self::Flush => "flush",
            Self::Close => "close",
        })
    }
}

/// Errors surfaced to the writer thread.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// The writer was closed; no further write or flush is accepted.
    #[error("stream is closed")]
    Closed,

    /// The downstream consumer canceled the stream.
    #[error("stream was terminated by downstream")]
    Terminated,

    /// The call did not complete within the configured timeout.
    ///
    /// For flush and close the request stays with the consumer and may
    /// still complete later, unobserved.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// The call that timed out.
        operation: Operation,
        /// The configured bound.
        after: Duration,
    },

    /// Enqueueing the chunk failed for a reason other than cancellation.
    #[error("failed to enqueue chunk: {0}")]
    Enqueue(String),
}

impl StreamError {
    /// Returns `true` if the writer can never succeed again.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Terminated)
    }

    /// Returns `true` if the caller may retry the same call.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<StreamError> for io::Error {
    fn from(err: StreamError) -> Self {
        let kind = match err {
            StreamError::Closed | StreamError::Terminated => io::ErrorKind::BrokenPipe,
            StreamError::Timeout { .. } => io::ErrorKind::TimedOut,
            StreamError::Enqueue(_) => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}
