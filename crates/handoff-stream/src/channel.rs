//! Bridge construction.

use crate::bridge::bridge;
use crate::config::StreamConfig;
use crate::error::ConfigError;
use crate::metrics::BridgeMetrics;
use crate::source::OutputStreamSource;
use crate::writer::StreamWriter;
use handoff_rs::{CancellationToken, HandoffQueue, LifecycleGuard};
use std::sync::Arc;
use tokio::runtime::Handle;

/// Creates a writer/stream pair on the current tokio runtime.
///
/// Returns a blocking [`StreamWriter`] for one writer thread and an
/// [`OutputStreamSource`] to be polled as a `Stream` of chunks.
///
/// # Example
///
/// ```ignore
/// use handoff_stream::{output_stream, StreamConfig, StreamExt};
/// use std::io::Write;
///
/// let (mut writer, mut source) = output_stream(StreamConfig::default())?;
///
/// std::thread::spawn(move || {
///     writer.write_all(b"hello").unwrap();
///     writer.close().unwrap();
/// });
///
/// while let Some(chunk) = source.next().await {
///     println!("{:?}", chunk);
/// }
/// ```
pub fn output_stream(
    config: StreamConfig,
) -> Result<(StreamWriter, OutputStreamSource), ConfigError> {
    let runtime = Handle::try_current().map_err(|_| ConfigError::NoRuntime)?;
    output_stream_with_handle(config, runtime)
}

/// Creates a writer/stream pair on an explicit runtime.
///
/// `runtime` runs the stream's blocking takes and drives the writer's
/// bounded waits.
pub fn output_stream_with_handle(
    config: StreamConfig,
    runtime: Handle,
) -> Result<(StreamWriter, OutputStreamSource), ConfigError> {
    config.validate()?;

    let queue = Arc::new(HandoffQueue::new(config.queue_config())?);
    let guard = Arc::new(LifecycleGuard::new());
    let metrics = Arc::new(BridgeMetrics::default());
    let downstream = CancellationToken::new();
    let (bridge, requests) = bridge(runtime.clone(), downstream.clone());

    let source = OutputStreamSource::new(
        Arc::clone(&queue),
        Arc::clone(&guard),
        requests,
        runtime,
        Arc::clone(&metrics),
        downstream,
    );
    let writer = StreamWriter::new(queue, guard, bridge, metrics, config.timeout);

    tracing::debug!(
        capacity = config.capacity,
        timeout = ?config.timeout,
        "output stream created"
    );

    Ok((writer, source))
}
