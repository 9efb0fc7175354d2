use handoff_rs::{
    CancellationToken, DownstreamStatus, HandoffQueue, LifecycleGuard, PutError, QueueConfig,
    TakeError,
};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_fifo_ordering_across_threads() {
    const N: u64 = 10_000;

    let queue = Arc::new(HandoffQueue::<u64>::new(QueueConfig::new(8)).unwrap());

    let producer = {
        let q = Arc::clone(&queue);
        thread::spawn(move || {
            for i in 0..N {
                q.put(i).unwrap();
            }
        })
    };

    // Consume on this thread while the producer keeps hitting backpressure
    let token = CancellationToken::new();
    for expected in 0..N {
        let item = queue.take(&token).unwrap();
        assert_eq!(item, expected, "FIFO violation: expected {}, got {}", expected, item);
        assert!(queue.len() <= queue.capacity());
    }

    producer.join().unwrap();
    assert!(queue.is_empty());
}

#[test]
fn test_capacity_two_backpressure() {
    let queue = Arc::new(HandoffQueue::new(QueueConfig::new(2)).unwrap());
    queue.put("A").unwrap();
    queue.put("B").unwrap();

    let q = Arc::clone(&queue);
    let writer = thread::spawn(move || q.put("C"));

    thread::sleep(Duration::from_millis(30));
    assert!(!writer.is_finished(), "third put must block on a full queue");

    let token = CancellationToken::new();
    assert_eq!(queue.take(&token), Ok("A"));
    writer.join().unwrap().unwrap();

    assert_eq!(queue.take(&token), Ok("B"));
    assert_eq!(queue.take(&token), Ok("C"));
}

#[test]
fn test_shutdown_sequence_releases_both_sides() {
    let queue = Arc::new(HandoffQueue::<u32>::new(QueueConfig::new(1)).unwrap());
    let guard = Arc::new(LifecycleGuard::new());
    queue.put(0).unwrap();

    // Writer parked on a full queue
    let writer = {
        let q = Arc::clone(&queue);
        let g = Arc::clone(&guard);
        thread::spawn(move || {
            let result = q.put(1);
            (result, g.status())
        })
    };

    // Second queue with a parked reader, released by token only
    let empty = Arc::new(HandoffQueue::<u32>::new(QueueConfig::new(1)).unwrap());
    let token = CancellationToken::new();
    let reader = {
        let q = Arc::clone(&empty);
        let t = token.clone();
        thread::spawn(move || q.take(&t))
    };

    thread::sleep(Duration::from_millis(20));
    let start = Instant::now();

    guard.cancel();
    queue.poison();
    token.cancel();
    empty.wake_takers();

    let (put_result, status) = writer.join().unwrap();
    assert_eq!(put_result, Err(PutError::Poisoned(1)));
    assert_eq!(status, DownstreamStatus::Canceled);
    assert_eq!(reader.join().unwrap(), Err(TakeError::Canceled));
    assert!(start.elapsed() < Duration::from_secs(1));
}
