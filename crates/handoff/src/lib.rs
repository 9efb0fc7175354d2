//! Handoff - Bounded Blocking Queue with Poison and Cancellable Take
//!
//! Synchronous building blocks for moving items from one blocking producer
//! thread to one consumer that must be able to shut the producer down.
//!
//! # Key Features
//!
//! - Fixed capacity: a full queue parks the producer (backpressure)
//! - Sticky poison slot: shutdown releases every blocked `put` and `take`
//! - Cancellable `take` via [`CancellationToken`]
//! - One-way atomic [`LifecycleGuard`] shared by both sides
//!
//! # Example
//!
//! ```
//! use handoff_rs::{CancellationToken, HandoffQueue, LifecycleGuard, QueueConfig, TakeError};
//!
//! let queue = HandoffQueue::<u64>::new(QueueConfig::new(2)).unwrap();
//! let guard = LifecycleGuard::new();
//!
//! queue.put(42).unwrap();
//! assert_eq!(queue.take(&CancellationToken::new()), Ok(42));
//!
//! // Consumer shuts down: status first, then the queue
//! guard.cancel();
//! queue.poison();
//! assert_eq!(queue.try_take(), Some(Err(TakeError::Poisoned)));
//! ```

mod config;
mod error;
mod invariants;
mod lifecycle;
mod queue;

pub use config::{QueueConfig, HIGH_THROUGHPUT_QUEUE, LOW_LATENCY_QUEUE};
pub use error::{PutError, QueueError, TakeError};
pub use lifecycle::{DownstreamStatus, LifecycleGuard};
pub use queue::HandoffQueue;

// Re-export the token type used by `HandoffQueue::take`
pub use tokio_util::sync::CancellationToken;
