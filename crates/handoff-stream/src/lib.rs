//! Blocking Writer to Async Stream Bridge
//!
//! This crate lets a thread that only knows `write`, `flush` and `close`
//! feed a pull-driven [`futures_core::Stream`] of [`bytes::Bytes`] chunks,
//! with backpressure and without ever touching async code.
//!
//! # Features
//!
//! - **Backpressure**: a bounded handoff queue parks the writer when full
//! - **Rendezvous flush/close**: the writer waits until the stream has taken
//!   everything written before the call
//! - **Non-blocking consumer**: blocking takes run on tokio's blocking pool
//! - **Deterministic shutdown**: cancel or drop the stream and every parked
//!   thread is released; the writer's next call fails with `Terminated`
//! - **Bounded waits**: every writer call is bounded by the configured timeout
//!
//! # Example
//!
//! ```ignore
//! use handoff_stream::{output_stream, StreamConfig, StreamExt};
//! use std::io::Write;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (mut writer, mut source) = output_stream(StreamConfig::default()).unwrap();
//!
//!     // The writer lives on a plain thread
//!     let producer = std::thread::spawn(move || {
//!         writer.write_all(b"hello ").unwrap();
//!         writer.write_all(b"world").unwrap();
//!         writer.close().unwrap();
//!     });
//!
//!     while let Some(chunk) = source.next().await {
//!         println!("Received: {:?}", chunk);
//!     }
//!     producer.join().unwrap();
//! }
//! ```

mod bridge;
mod channel;
mod config;
mod error;
mod invariants;
mod metrics;
mod shutdown;
mod source;
mod writer;

pub use channel::{output_stream, output_stream_with_handle};
pub use config::StreamConfig;
pub use error::{ConfigError, Operation, StreamError};
pub use metrics::BridgeMetrics;
pub use shutdown::CancelSignal;
pub use source::OutputStreamSource;
pub use writer::StreamWriter;

pub use handoff_rs::DownstreamStatus;

// Re-export useful stream combinators
pub use tokio_stream::StreamExt;
