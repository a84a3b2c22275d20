use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::error::HandleError;
use crate::domain::service::EnrichmentService;
use crate::pipeline::pool::{PoolHandle, WorkerPool};
use crate::pipeline::source::{MessageStream, PartitionReader};

pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// What the consumer invokes for every pulled payload.
#[async_trait]
pub trait MessageHandler: Send + Sync + 'static {
    async fn handle(&self, cancel: &CancellationToken, payload: &[u8]) -> Result<(), HandleError>;
}

#[async_trait]
impl MessageHandler for EnrichmentService {
    async fn handle(&self, cancel: &CancellationToken, payload: &[u8]) -> Result<(), HandleError> {
        EnrichmentService::handle(self, cancel, payload).await
    }
}

/// One pulling task per partition feeding a fixed worker pool.
///
/// Messages of one partition are submitted in offset order; completion order
/// is not guaranteed once more than one worker is active. Handle errors are
/// logged and dropped; offsets are left to the stream client, so processing
/// is at-least-once.
pub struct PartitionedConsumer<S: MessageStream> {
    stream: S,
    handler: Arc<dyn MessageHandler>,
    pool: WorkerPool,
    shutdown_timeout: Duration,
}

impl<S: MessageStream> PartitionedConsumer<S> {
    /// Starts the `workers` pool immediately. Must be called inside a Tokio runtime.
    pub fn new(
        stream: S,
        handler: Arc<dyn MessageHandler>,
        workers: usize,
        shutdown_timeout: Duration,
    ) -> Self {
        Self {
            stream,
            handler,
            pool: WorkerPool::new(workers),
            shutdown_timeout,
        }
    }

    pub fn workers(&self) -> usize {
        self.pool.workers()
    }

    /// Consume until `cancel` fires or every partition is exhausted, then
    /// drain the pool (bounded by the shutdown timeout).
    ///
    /// Partition discovery and opening failures are fatal; nothing is
    /// submitted in that case.
    #[instrument(name = "fn_enricher.consumer.run", skip_all)]
    pub async fn run(self, cancel: CancellationToken) -> anyhow::Result<()> {
        let Self {
            stream,
            handler,
            pool,
            shutdown_timeout,
        } = self;

        let partitions = stream
            .partitions()
            .await
            .context("partitions are not available")?;

        let mut readers = Vec::with_capacity(partitions.len());
        for partition in partitions {
            let reader = stream
                .open(partition)
                .await
                .with_context(|| format!("partition {partition} is not available"))?;
            readers.push((partition, reader));
        }

        info!(
            partitions = readers.len(),
            workers = pool.workers(),
            "consumer is ready to consume messages"
        );

        let mut pullers = JoinSet::new();
        for (partition, reader) in readers {
            pullers.spawn(pull_partition(
                partition,
                reader,
                pool.handle(),
                handler.clone(),
                cancel.clone(),
            ));
        }

        while let Some(joined) = pullers.join_next().await {
            if let Err(e) = joined {
                error!("partition task failed: {e}");
            }
        }

        // Every PoolHandle died with its puller, so the queue closes here.
        info!("partition readers stopped; draining worker pool");
        pool.shutdown(shutdown_timeout).await;
        Ok(())
    }
}

async fn pull_partition<R: PartitionReader>(
    partition: i32,
    mut reader: R,
    pool: PoolHandle,
    handler: Arc<dyn MessageHandler>,
    cancel: CancellationToken,
) {
    debug!(partition, "partition reader started");
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            next = reader.next_message() => next,
        };

        let message = match next {
            None => break,
            Some(Err(e)) => {
                warn!(partition, "consume error: {e:#}");
                continue;
            }
            Some(Ok(message)) => message,
        };

        // Best effort: a message dequeued just before cancellation may still go through.
        if cancel.is_cancelled() {
            break;
        }

        let handler = handler.clone();
        let job_cancel = cancel.clone();
        let submitted = pool
            .submit(async move {
                if let Err(e) = handler.handle(&job_cancel, &message.payload).await {
                    warn!(
                        partition = message.partition,
                        offset = message.offset,
                        "handling message: {}: {e}",
                        String::from_utf8_lossy(&message.payload)
                    );
                }
            })
            .await;

        if submitted.is_err() {
            warn!(partition, "worker pool closed; stopping partition reader");
            break;
        }
    }
    debug!(partition, "partition reader stopped");
}
