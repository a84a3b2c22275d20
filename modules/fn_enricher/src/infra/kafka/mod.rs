//! rdkafka adapters: the partitioned inbound stream and the rejection producer.

pub mod producer;
pub mod stream;

pub use producer::KafkaRejectionPublisher;
pub use stream::{KafkaPartitionReader, KafkaPartitionStream};

use rdkafka::ClientConfig;

/// Connection settings shared by the consumer and producer sides.
#[derive(Debug, Clone)]
pub struct KafkaSettings {
    pub brokers: Vec<String>,
    pub group_id: String,
}

impl KafkaSettings {
    pub(crate) fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config.set("bootstrap.servers", self.brokers.join(","));
        config
    }
}
