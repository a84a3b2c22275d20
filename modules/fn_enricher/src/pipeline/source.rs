use async_trait::async_trait;

/// One message pulled from a stream partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamMessage {
    pub partition: i32,
    pub offset: i64,
    pub payload: Vec<u8>,
}

/// A partitioned, ordered message stream (one topic).
///
/// Group membership and offset commits belong to the stream client; the
/// consumer only discovers partitions and reads them.
#[async_trait]
pub trait MessageStream: Send + Sync + 'static {
    type Reader: PartitionReader;

    /// Discover all partitions of the topic.
    async fn partitions(&self) -> anyhow::Result<Vec<i32>>;

    /// Open an independent reader positioned on `partition`.
    async fn open(&self, partition: i32) -> anyhow::Result<Self::Reader>;
}

/// Reads one partition in offset order.
#[async_trait]
pub trait PartitionReader: Send + 'static {
    /// `None` when the partition is exhausted or closed. Errors are
    /// per-message and do not end the partition.
    async fn next_message(&mut self) -> Option<anyhow::Result<StreamMessage>>;
}
