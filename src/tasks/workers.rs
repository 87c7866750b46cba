//! Worker Pool
//!
//! Fixed set of long-lived tasks draining the connection queue. Each
//! connection runs in its own child task which the worker awaits, so a
//! panic while serving one client is reported and contained to that client.

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::logging::Logger;
use crate::queue::BoundedQueue;

const TAG: &str = "worker";

// == Connection Handler ==
/// Request-handling pipeline run by a worker for every dequeued connection.
///
/// The handler owns the connection for the duration of the call; dropping it
/// closes the connection.
pub trait ConnectionHandler<C>: Send + Sync + 'static {
    fn handle(&self, conn: C) -> impl Future<Output = Result<()>> + Send;
}

// == Worker Pool ==
/// Handles of the running workers.
#[derive(Debug)]
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    // == Spawn ==
    /// Starts `size` workers pulling from `queue`.
    ///
    /// Workers run until the queue is closed and drained.
    pub fn spawn<C, H>(
        size: usize,
        queue: Arc<BoundedQueue<C>>,
        handler: Arc<H>,
        logger: Logger,
    ) -> Self
    where
        C: Send + 'static,
        H: ConnectionHandler<C>,
    {
        let handles = (0..size)
            .map(|id| {
                tokio::spawn(run_worker(
                    id,
                    Arc::clone(&queue),
                    Arc::clone(&handler),
                    logger.clone(),
                ))
            })
            .collect();

        Self { handles }
    }

    /// Number of workers in the pool.
    pub fn size(&self) -> usize {
        self.handles.len()
    }

    // == Join ==
    /// Waits for every worker to exit. Only returns once the connection
    /// queue has been closed.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(err) = handle.await {
                error!("Worker task failed: {}", err);
            }
        }
    }
}

// == Worker Loop ==
async fn run_worker<C, H>(id: usize, queue: Arc<BoundedQueue<C>>, handler: Arc<H>, logger: Logger)
where
    C: Send + 'static,
    H: ConnectionHandler<C>,
{
    logger.log(TAG, format!("worker {} launched", id)).await;
    info!(worker = id, "Worker started");

    while let Ok(conn) = queue.remove().await {
        let handler = Arc::clone(&handler);
        let outcome = tokio::spawn(async move { handler.handle(conn).await }).await;

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                logger
                    .log(TAG, format!("worker {}: connection closed with error: {}", id, err))
                    .await;
            }
            Err(join_err) if join_err.is_panic() => {
                error!(worker = id, "Connection handler panicked");
                logger
                    .log(TAG, format!("worker {}: connection handler panicked", id))
                    .await;
            }
            Err(join_err) => {
                warn!(worker = id, "Connection handler cancelled: {}", join_err);
            }
        }
    }

    info!(worker = id, "Worker stopped: connection queue closed");
}
