//! Fixed-size worker pool over one bounded job queue.
//!
//! Exactly `W` long-lived workers pull boxed futures off a shared queue of
//! capacity `W` and run each to completion before pulling the next. Submitting
//! waits while the queue is full, which is the backpressure the partition
//! readers see.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::{mpsc, Mutex};
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

pub type Job = BoxFuture<'static, ()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("worker pool is closed")]
pub struct PoolClosed;

/// Owner of the pool. Dropping it (or calling [`WorkerPool::shutdown`]) closes
/// the queue once every [`PoolHandle`] is gone as well.
pub struct WorkerPool {
    sender: mpsc::Sender<Job>,
    tracker: TaskTracker,
    workers: usize,
}

/// Cloneable submit side of the pool.
#[derive(Clone)]
pub struct PoolHandle {
    sender: mpsc::Sender<Job>,
}

impl WorkerPool {
    /// Spawn `workers` tasks (at least one). Must be called inside a Tokio runtime.
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        let (sender, receiver) = mpsc::channel::<Job>(workers);
        let queue = Arc::new(Mutex::new(receiver));

        let tracker = TaskTracker::new();
        for id in 0..workers {
            tracker.spawn(worker_loop(id, queue.clone()));
        }
        tracker.close();

        info!(workers, "worker pool started");
        Self {
            sender,
            tracker,
            workers,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn handle(&self) -> PoolHandle {
        PoolHandle {
            sender: self.sender.clone(),
        }
    }

    pub async fn submit<F>(&self, job: F) -> Result<(), PoolClosed>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        submit_on(&self.sender, job).await
    }

    /// Close the queue and wait for workers to finish queued and in-flight
    /// jobs, for at most `timeout`. Outstanding [`PoolHandle`]s keep the queue
    /// open, so drop them first.
    ///
    /// Returns `false` if the timeout elapsed; remaining jobs keep running
    /// detached.
    pub async fn shutdown(self, timeout: Duration) -> bool {
        let Self {
            sender, tracker, ..
        } = self;
        drop(sender);

        match tokio::time::timeout(timeout, tracker.wait()).await {
            Ok(()) => {
                info!("worker pool drained");
                true
            }
            Err(_) => {
                warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "worker pool did not drain before the shutdown timeout"
                );
                false
            }
        }
    }
}

impl PoolHandle {
    /// Queue a job, waiting while all workers are busy and the queue is full.
    pub async fn submit<F>(&self, job: F) -> Result<(), PoolClosed>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        submit_on(&self.sender, job).await
    }
}

async fn submit_on<F>(sender: &mpsc::Sender<Job>, job: F) -> Result<(), PoolClosed>
where
    F: Future<Output = ()> + Send + 'static,
{
    sender.send(job.boxed()).await.map_err(|_| PoolClosed)
}

async fn worker_loop(id: usize, queue: Arc<Mutex<mpsc::Receiver<Job>>>) {
    debug!(worker = id, "worker started");
    loop {
        // The lock is only held while waiting for the next job.
        let next = { queue.lock().await.recv().await };
        let Some(job) = next else {
            break;
        };
        if let Err(panic) = AssertUnwindSafe(job).catch_unwind().await {
            error!(worker = id, "job panicked: {}", panic_message(panic.as_ref()));
        }
    }
    debug!(worker = id, "worker stopped");
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
