//! PartitionedConsumer over an in-memory partitioned stream.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use fn_enricher::domain::error::HandleError;
use fn_enricher::pipeline::{
    MessageHandler, MessageStream, PartitionReader, PartitionedConsumer, StreamMessage,
};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

// ---------- stream ----------

enum Item {
    Message(Vec<u8>),
    ConsumeError,
}

/// Fixed messages per partition. With `open_ended` a partition stays open
/// after its messages until the consumer is cancelled.
#[derive(Default)]
struct MemoryStream {
    partitions: HashMap<i32, Vec<Item>>,
    fail_discovery: bool,
    fail_open: Option<i32>,
    open_ended: bool,
}

impl MemoryStream {
    fn with_partition(mut self, partition: i32, payloads: impl IntoIterator<Item = String>) -> Self {
        self.partitions.insert(
            partition,
            payloads
                .into_iter()
                .map(|p| Item::Message(p.into_bytes()))
                .collect(),
        );
        self
    }
}

struct MemoryReader {
    partition: i32,
    offset: i64,
    items: std::vec::IntoIter<Item>,
    open_ended: bool,
}

#[async_trait]
impl MessageStream for MemoryStream {
    type Reader = MemoryReader;

    async fn partitions(&self) -> anyhow::Result<Vec<i32>> {
        if self.fail_discovery {
            return Err(anyhow!("broker unreachable"));
        }
        let mut ids: Vec<i32> = self.partitions.keys().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn open(&self, partition: i32) -> anyhow::Result<MemoryReader> {
        if self.fail_open == Some(partition) {
            return Err(anyhow!("leader not available"));
        }
        let items: Vec<Item> = self.partitions[&partition]
            .iter()
            .map(|i| match i {
                Item::Message(p) => Item::Message(p.clone()),
                Item::ConsumeError => Item::ConsumeError,
            })
            .collect();
        Ok(MemoryReader {
            partition,
            offset: 0,
            items: items.into_iter(),
            open_ended: self.open_ended,
        })
    }
}

#[async_trait]
impl PartitionReader for MemoryReader {
    async fn next_message(&mut self) -> Option<anyhow::Result<StreamMessage>> {
        let Some(item) = self.items.next() else {
            if self.open_ended {
                std::future::pending::<()>().await;
            }
            return None;
        };
        let offset = self.offset;
        self.offset += 1;
        Some(match item {
            Item::Message(payload) => Ok(StreamMessage {
                partition: self.partition,
                offset,
                payload,
            }),
            Item::ConsumeError => Err(anyhow!("corrupt message at offset {offset}")),
        })
    }
}

// ---------- handler ----------

#[derive(Default)]
struct RecordingHandler {
    seen: Mutex<Vec<String>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
    delay: Duration,
    started: Option<mpsc::UnboundedSender<()>>,
}

impl RecordingHandler {
    fn seen(&self) -> Vec<String> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl MessageHandler for RecordingHandler {
    async fn handle(&self, _cancel: &CancellationToken, payload: &[u8]) -> Result<(), HandleError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        if let Some(started) = &self.started {
            let _ = started.send(());
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let text = String::from_utf8_lossy(payload).into_owned();
        self.seen.lock().push(text.clone());
        self.active.fetch_sub(1, Ordering::SeqCst);

        if text.starts_with("bad") {
            return Err(HandleError::storage("rejected by test"));
        }
        Ok(())
    }
}

fn payloads(prefix: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{prefix}-{i}")).collect()
}

const SHUTDOWN: Duration = Duration::from_secs(5);

// ---------- tests ----------

#[tokio::test]
async fn every_message_is_handled_once_with_bounded_concurrency() {
    let stream = MemoryStream::default().with_partition(0, payloads("p0", 20));
    let handler = Arc::new(RecordingHandler {
        delay: Duration::from_millis(10),
        ..Default::default()
    });

    let consumer = PartitionedConsumer::new(stream, handler.clone(), 3, SHUTDOWN);
    assert_eq!(consumer.workers(), 3);
    consumer.run(CancellationToken::new()).await.unwrap();

    let mut seen = handler.seen();
    seen.sort();
    let mut expected = payloads("p0", 20);
    expected.sort();
    assert_eq!(seen, expected);
    assert!(handler.max_active.load(Ordering::SeqCst) <= 3);
}

#[tokio::test]
async fn all_partitions_are_consumed() {
    let stream = MemoryStream::default()
        .with_partition(0, payloads("a", 5))
        .with_partition(1, payloads("b", 5))
        .with_partition(2, payloads("c", 5));
    let handler = Arc::new(RecordingHandler::default());

    PartitionedConsumer::new(stream, handler.clone(), 2, SHUTDOWN)
        .run(CancellationToken::new())
        .await
        .unwrap();

    let seen = handler.seen();
    assert_eq!(seen.len(), 15);
    for prefix in ["a-", "b-", "c-"] {
        assert_eq!(seen.iter().filter(|s| s.starts_with(prefix)).count(), 5);
    }
}

#[tokio::test]
async fn single_worker_preserves_partition_order() {
    let stream = MemoryStream::default().with_partition(0, payloads("p0", 10));
    let handler = Arc::new(RecordingHandler::default());

    PartitionedConsumer::new(stream, handler.clone(), 1, SHUTDOWN)
        .run(CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(handler.seen(), payloads("p0", 10));
}

#[tokio::test]
async fn handle_errors_and_consume_errors_do_not_stop_the_run() {
    let mut stream = MemoryStream::default();
    stream.partitions.insert(
        0,
        vec![
            Item::Message(b"bad-0".to_vec()),
            Item::ConsumeError,
            Item::Message(b"good-1".to_vec()),
            Item::Message(b"bad-2".to_vec()),
            Item::Message(b"good-3".to_vec()),
        ],
    );
    let handler = Arc::new(RecordingHandler::default());

    PartitionedConsumer::new(stream, handler.clone(), 1, SHUTDOWN)
        .run(CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(handler.seen(), vec!["bad-0", "good-1", "bad-2", "good-3"]);
}

#[tokio::test]
async fn partition_discovery_failure_is_fatal() {
    let stream = MemoryStream {
        fail_discovery: true,
        ..Default::default()
    };
    let handler = Arc::new(RecordingHandler::default());

    let err = PartitionedConsumer::new(stream, handler.clone(), 2, SHUTDOWN)
        .run(CancellationToken::new())
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("partitions are not available"));
    assert!(handler.seen().is_empty());
}

#[tokio::test]
async fn partition_open_failure_is_fatal_and_nothing_is_handled() {
    let stream = MemoryStream {
        fail_open: Some(1),
        ..Default::default()
    }
    .with_partition(0, payloads("a", 3))
    .with_partition(1, payloads("b", 3));
    let handler = Arc::new(RecordingHandler::default());

    let err = PartitionedConsumer::new(stream, handler.clone(), 2, SHUTDOWN)
        .run(CancellationToken::new())
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("partition 1"));
    assert!(handler.seen().is_empty());
}

#[tokio::test]
async fn cancellation_lets_in_flight_work_finish() {
    let (started_tx, mut started_rx) = mpsc::unbounded_channel();
    let stream = MemoryStream {
        open_ended: true,
        ..Default::default()
    }
    .with_partition(0, payloads("p0", 2));
    let handler = Arc::new(RecordingHandler {
        delay: Duration::from_millis(200),
        started: Some(started_tx),
        ..Default::default()
    });

    let cancel = CancellationToken::new();
    let consumer = PartitionedConsumer::new(stream, handler.clone(), 2, SHUTDOWN);
    let run = tokio::spawn(consumer.run(cancel.clone()));

    // both messages are in flight, then the stream just idles
    started_rx.recv().await.unwrap();
    started_rx.recv().await.unwrap();
    cancel.cancel();

    tokio::time::timeout(Duration::from_secs(3), run)
        .await
        .expect("run must return after cancellation")
        .unwrap()
        .unwrap();

    assert_eq!(handler.seen().len(), 2);
}

#[tokio::test]
async fn cancelled_before_start_handles_nothing() {
    let stream = MemoryStream {
        open_ended: true,
        ..Default::default()
    }
    .with_partition(0, payloads("p0", 5));
    let handler = Arc::new(RecordingHandler::default());
    let cancel = CancellationToken::new();
    cancel.cancel();

    PartitionedConsumer::new(stream, handler.clone(), 1, SHUTDOWN)
        .run(cancel)
        .await
        .unwrap();

    assert!(handler.seen().is_empty());
}
