use async_trait::async_trait;

/// Output port: append an already-encoded rejection to the dead-letter stream.
#[async_trait]
pub trait RejectionPublisher: Send + Sync {
    async fn publish(&self, payload: &[u8]) -> anyhow::Result<()>;
}
