//! Property-based tests for the writer/stream bridge.
//!
//! Whatever the chunk sizes, queue capacity and flush pattern, the stream
//! yields exactly the non-empty chunks written, in write order.

use bytes::Bytes;
use handoff_stream::{output_stream, StreamConfig, StreamExt};
use proptest::prelude::*;
use std::time::Duration;

#[derive(Debug, Clone)]
enum WriterOp {
    Write(Vec<u8>),
    Flush,
}

fn writer_op() -> impl Strategy<Value = WriterOp> {
    prop_oneof![
        8 => prop::collection::vec(any::<u8>(), 0..48).prop_map(WriterOp::Write),
        1 => Just(WriterOp::Flush),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_stream_preserves_order_and_content(
        ops in prop::collection::vec(writer_op(), 0..40),
        capacity in 1usize..6,
    ) {
        let runtime = runtime();
        let expected: Vec<Bytes> = ops
            .iter()
            .filter_map(|op| match op {
                WriterOp::Write(data) if !data.is_empty() => Some(Bytes::copy_from_slice(data)),
                _ => None,
            })
            .collect();

        let received = runtime.block_on(async move {
            let config = StreamConfig::default()
                .with_capacity(capacity)
                .with_timeout(Duration::from_secs(5));
            let (mut writer, mut source) = output_stream(config).unwrap();

            let producer = tokio::task::spawn_blocking(move || {
                for op in ops {
                    match op {
                        WriterOp::Write(data) => writer.try_write(&data)?,
                        WriterOp::Flush => writer.try_flush()?,
                    }
                }
                writer.close()
            });

            let mut received = Vec::new();
            while let Some(chunk) = source.next().await {
                received.push(chunk);
            }
            producer.await.unwrap().map(|()| received)
        });

        prop_assert_eq!(received, Ok(expected));
    }

    #[test]
    fn prop_cancel_midway_delivers_a_prefix(
        chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..16), 1..30),
        keep in 0usize..30,
    ) {
        let runtime = runtime();
        let written: Vec<Bytes> = chunks.iter().map(|c| Bytes::copy_from_slice(c)).collect();

        let (received, writer_result) = runtime.block_on(async move {
            let config = StreamConfig::default()
                .with_capacity(2)
                .with_timeout(Duration::from_secs(5));
            let (mut writer, mut source) = output_stream(config).unwrap();

            let producer = tokio::task::spawn_blocking(move || {
                for chunk in chunks {
                    writer.try_write(&chunk)?;
                }
                writer.close()
            });

            let mut received = Vec::new();
            while received.len() < keep {
                match source.next().await {
                    Some(chunk) => received.push(chunk),
                    None => break,
                }
            }
            drop(source);
            (received, producer.await.unwrap())
        });

        prop_assert!(received.len() <= written.len());
        prop_assert_eq!(&received[..], &written[..received.len()]);
        if keep > written.len() {
            prop_assert_eq!(writer_result, Ok(()));
        }
    }
}
