pub mod consumer;
pub mod pool;
pub mod source;

pub use consumer::{MessageHandler, PartitionedConsumer, DEFAULT_SHUTDOWN_TIMEOUT};
pub use pool::{Job, PoolClosed, PoolHandle, WorkerPool};
pub use source::{MessageStream, PartitionReader, StreamMessage};
