use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use tracing::{debug, info};

use super::KafkaSettings;
use crate::domain::ports::RejectionPublisher;

/// Appends rejection records to the dead-letter topic.
///
/// Waits for every in-sync replica (`acks=all`) and lets librdkafka retry a
/// send up to three times.
pub struct KafkaRejectionPublisher {
    producer: FutureProducer,
    topic: String,
    send_timeout: Duration,
}

impl KafkaRejectionPublisher {
    pub fn new(
        settings: &KafkaSettings,
        topic: impl Into<String>,
        send_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let producer: FutureProducer = settings
            .client_config()
            .set("acks", "all")
            .set("message.send.max.retries", "3")
            .set("compression.type", "snappy")
            .create()
            .context("failed to create rejection producer")?;

        let topic = topic.into();
        info!(topic = %topic, "rejection producer created");
        Ok(Self {
            producer,
            topic,
            send_timeout,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl RejectionPublisher for KafkaRejectionPublisher {
    async fn publish(&self, payload: &[u8]) -> anyhow::Result<()> {
        let record = FutureRecord::<(), [u8]>::to(&self.topic).payload(payload);
        let (partition, offset) = self
            .producer
            .send(record, Timeout::After(self.send_timeout))
            .await
            .map_err(|(e, _)| e)
            .with_context(|| format!("failed to send message to topic {}", self.topic))?;
        debug!(partition, offset, "rejection delivered");
        Ok(())
    }
}
