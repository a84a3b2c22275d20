use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use rdkafka::consumer::{BaseConsumer, Consumer, StreamConsumer};
use rdkafka::util::Timeout;
use rdkafka::{Message, Offset, TopicPartitionList};
use tracing::{debug, instrument};

use super::KafkaSettings;
use crate::pipeline::source::{MessageStream, PartitionReader, StreamMessage};

const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

/// One topic, read partition by partition.
///
/// Each reader is a dedicated consumer manually assigned to one partition,
/// starting at the newest offset. Offsets are never committed, so nothing is
/// redelivered across restarts: messages that failed or were in flight when
/// the process stopped are not read again, and a restart only sees messages
/// produced after it.
pub struct KafkaPartitionStream {
    settings: KafkaSettings,
    topic: String,
}

impl KafkaPartitionStream {
    pub fn new(settings: KafkaSettings, topic: impl Into<String>) -> Self {
        Self {
            settings,
            topic: topic.into(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl MessageStream for KafkaPartitionStream {
    type Reader = KafkaPartitionReader;

    #[instrument(name = "fn_enricher.kafka.partitions", skip(self), fields(topic = %self.topic))]
    async fn partitions(&self) -> anyhow::Result<Vec<i32>> {
        let config = self.settings.client_config();
        let topic = self.topic.clone();

        // Metadata fetch is blocking in librdkafka.
        tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<i32>> {
            let consumer: BaseConsumer = config.create().context("failed to create consumer")?;
            let metadata = consumer
                .fetch_metadata(Some(&topic), Timeout::After(METADATA_TIMEOUT))
                .with_context(|| format!("failed to fetch metadata for topic {topic}"))?;

            let described = metadata
                .topics()
                .iter()
                .find(|t| t.name() == topic)
                .ok_or_else(|| anyhow!("topic {topic} is missing from metadata"))?;
            if let Some(err) = described.error() {
                return Err(anyhow!("topic {topic} metadata error: {err:?}"));
            }

            let partitions: Vec<i32> = described.partitions().iter().map(|p| p.id()).collect();
            if partitions.is_empty() {
                return Err(anyhow!("topic {topic} has no partitions"));
            }
            debug!(count = partitions.len(), "partitions discovered");
            Ok(partitions)
        })
        .await
        .context("metadata task failed")?
    }

    async fn open(&self, partition: i32) -> anyhow::Result<KafkaPartitionReader> {
        let consumer: StreamConsumer = self
            .settings
            .client_config()
            .set("group.id", &self.settings.group_id)
            .set("enable.auto.commit", "false")
            .set("enable.auto.offset.store", "false")
            .set("isolation.level", "read_committed")
            .create()
            .context("failed to create partition consumer")?;

        let mut assignment = TopicPartitionList::new();
        assignment
            .add_partition_offset(&self.topic, partition, Offset::End)
            .context("failed to build partition assignment")?;
        consumer
            .assign(&assignment)
            .with_context(|| format!("failed to assign {}/{partition}", self.topic))?;

        Ok(KafkaPartitionReader { consumer })
    }
}

pub struct KafkaPartitionReader {
    consumer: StreamConsumer,
}

#[async_trait]
impl PartitionReader for KafkaPartitionReader {
    async fn next_message(&mut self) -> Option<anyhow::Result<StreamMessage>> {
        let next = match self.consumer.recv().await {
            Ok(message) => Ok(StreamMessage {
                partition: message.partition(),
                offset: message.offset(),
                payload: message.payload().map(<[u8]>::to_vec).unwrap_or_default(),
            }),
            Err(e) => Err(anyhow::Error::new(e).context("consume failed")),
        };
        Some(next)
    }
}
