//! Demonstration of handoff-stream features.
//!
//! Run with: `RUST_LOG=handoff_stream=debug cargo run -p handoff-stream --features demo --bin demo`

use handoff_stream::{output_stream, StreamConfig, StreamError, StreamExt};
use std::io::Write;
use std::time::Duration;
use tokio::time::timeout;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    println!("=== handoff-stream Demo ===\n");

    demo_basic_usage().await?;
    demo_backpressure().await?;
    demo_flush_rendezvous().await?;
    demo_configuration_presets().await?;
    demo_downstream_cancel().await?;

    println!("\n=== All demos completed successfully! ===");
    Ok(())
}

/// Demo 1: A plain thread writes, an async task consumes
async fn demo_basic_usage() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- Demo 1: Basic Usage ---");

    let (mut writer, mut source) = output_stream(StreamConfig::default())?;

    let producer = std::thread::spawn(move || -> std::io::Result<()> {
        for i in 0..5 {
            writeln!(writer, "line {i}")?;
        }
        writer.close()?;
        Ok(())
    });

    while let Some(chunk) = source.next().await {
        print!("  Received: {}", String::from_utf8_lossy(&chunk));
    }

    producer.join().map_err(|_| "producer panicked")??;
    println!("  ✓ Basic usage complete\n");
    Ok(())
}

/// Demo 2: A slow consumer parks the writer on a full queue
async fn demo_backpressure() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- Demo 2: Backpressure ---");

    let config = StreamConfig::default().with_capacity(2);
    let (mut writer, mut source) = output_stream(config)?;
    let metrics = std::sync::Arc::clone(source.metrics());

    let producer = std::thread::spawn(move || -> Result<(), StreamError> {
        for i in 0..10u8 {
            writer.try_write(&[i])?;
        }
        writer.close()
    });

    let mut count = 0;
    while let Some(_chunk) = source.next().await {
        count += 1;
        // Slow consumer
        tokio::time::sleep(Duration::from_millis(10)).await;
        println!("  Consumed {count}, buffered {}", source.buffered_count());
    }

    producer.join().map_err(|_| "producer panicked")??;
    println!(
        "  Written {} chunks, delivered {}",
        metrics.chunks_written(),
        metrics.chunks_delivered()
    );
    println!("  ✓ Backpressure complete\n");
    Ok(())
}

/// Demo 3: flush returns only after the stream took everything
async fn demo_flush_rendezvous() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- Demo 3: Flush Rendezvous ---");

    let (mut writer, mut source) = output_stream(StreamConfig::default())?;

    let producer = std::thread::spawn(move || -> Result<(), StreamError> {
        writer.try_write(b"first batch")?;
        writer.try_flush()?;
        println!("  Writer: first batch taken by the stream");
        writer.try_write(b"second batch")?;
        writer.close()?;
        println!("  Writer: closed");
        Ok(())
    });

    while let Some(chunk) = source.next().await {
        println!("  Stream: {}", String::from_utf8_lossy(&chunk));
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    producer.join().map_err(|_| "producer panicked")??;
    println!("  ✓ Flush rendezvous complete\n");
    Ok(())
}

/// Demo 4: Configuration presets
async fn demo_configuration_presets() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- Demo 4: Configuration Presets ---");

    let low_latency = StreamConfig::low_latency();
    println!(
        "  Low-latency: capacity={}, timeout={:?}",
        low_latency.capacity, low_latency.timeout
    );

    let high_throughput = StreamConfig::high_throughput();
    println!(
        "  High-throughput: capacity={}, timeout={:?}",
        high_throughput.capacity, high_throughput.timeout
    );

    // Nobody polls the stream: the flush gives up after the timeout
    let config = StreamConfig::low_latency().with_timeout(Duration::from_millis(100));
    let (mut writer, _source) = output_stream(config)?;
    let result = tokio::task::spawn_blocking(move || {
        writer.try_write(b"unread")?;
        writer.try_flush()
    })
    .await?;
    println!("  Flush without a consumer: {result:?}");

    println!("  ✓ Configuration presets complete\n");
    Ok(())
}

/// Demo 5: The consumer cancels; the writer is told on its next call
async fn demo_downstream_cancel() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- Demo 5: Downstream Cancel ---");

    let (mut writer, mut source) = output_stream(StreamConfig::default().with_capacity(4))?;
    let signal = source.cancel_signal();

    let producer = std::thread::spawn(move || {
        let mut sent = 0u64;
        loop {
            match writer.try_write(&sent.to_le_bytes()) {
                Ok(()) => sent += 1,
                Err(err) => {
                    println!("  Writer stopped after {sent} chunks: {err}");
                    break;
                }
            }
        }
        writer.close()
    });

    let mut received = 0u64;
    while let Ok(Some(_chunk)) = timeout(Duration::from_millis(500), source.next()).await {
        received += 1;
        if received == 100 {
            println!("  Canceling via CancelSignal...");
            signal.cancel();
        }
    }

    producer.join().map_err(|_| "producer panicked")??;
    println!("  Consumer received {received} chunks before the stream ended");
    println!("  ✓ Downstream cancel complete\n");
    Ok(())
}
