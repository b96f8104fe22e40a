//! Integration tests for marshaling SDK callbacks into one discovery stream.
//!
//! Vendor SDKs call back on their own threads. These tests drive the sink
//! from plain OS threads and from Tokio tasks and check that the consumer
//! sees one ordered sequence per producer and nothing after cancellation.

use std::collections::HashMap;

use cardpay_core::ReaderId;
use cardpay_hardware::discovery::discovery_channel;
use cardpay_hardware::{DiscoveryEvent, Reader};

fn found(id: String) -> DiscoveryEvent {
    DiscoveryEvent::ReaderFound(Reader::new(ReaderId::new(&id).unwrap(), id))
}

/// Every event from every callback thread arrives, in per-thread order.
#[tokio::test]
async fn test_callbacks_from_many_threads_are_serialized() {
    const THREADS: usize = 4;
    const PER_THREAD: usize = 25;

    let (sink, mut stream) = discovery_channel(THREADS * PER_THREAD);

    let workers: Vec<_> = (0..THREADS)
        .map(|t| {
            let sink = sink.clone();
            std::thread::spawn(move || {
                for i in 0..PER_THREAD {
                    assert!(sink.try_emit(found(format!("T{t}-{i:03}"))));
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }
    drop(sink);

    let mut last_seen: HashMap<String, usize> = HashMap::new();
    let mut total = 0;

    while let Some(event) = stream.recv().await {
        let DiscoveryEvent::ReaderFound(reader) = event else {
            panic!("unexpected event");
        };
        let (thread, index) = reader.id.as_str().split_once('-').unwrap();
        let index: usize = index.parse().unwrap();

        if let Some(previous) = last_seen.insert(thread.to_string(), index) {
            assert!(index > previous, "events of {thread} out of order");
        }
        total += 1;
    }

    assert_eq!(total, THREADS * PER_THREAD);
}

/// A cancelled scan swallows callbacks that are still in flight.
#[tokio::test]
async fn test_late_callbacks_after_cancel_are_dropped() {
    let (sink, mut stream) = discovery_channel(16);

    assert!(sink.emit(found("early".to_string())).await);
    assert!(matches!(stream.recv().await, Some(DiscoveryEvent::ReaderFound(_))));

    stream.cancel();

    let late = tokio::spawn({
        let sink = sink.clone();
        async move { sink.emit(found("late".to_string())).await }
    });

    assert!(!late.await.unwrap());
    assert!(stream.recv().await.is_none());
}

/// A producer blocked on a full channel is released by cancellation.
#[tokio::test]
async fn test_blocked_producer_released_by_cancel() {
    let (sink, stream) = discovery_channel(1);
    assert!(sink.emit(found("first".to_string())).await);

    let blocked = tokio::spawn({
        let sink = sink.clone();
        async move { sink.emit(found("second".to_string())).await }
    });

    tokio::task::yield_now().await;
    stream.cancel();

    assert!(!blocked.await.unwrap());
}
