//! Server Lifecycle
//!
//! Wires the queues, cache, log consumer, worker pool, dispatcher and admin
//! surface together and tears them down in dependency order.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::fs::File;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::api::{create_router, AppState};
use crate::cache::SharedCache;
use crate::config::Config;
use crate::logging::{LogQueue, Logger};
use crate::proxy::{run_dispatcher, Connection, ProxyHandler};
use crate::queue::BoundedQueue;
use crate::tasks::{open_log_file, spawn_log_consumer, WorkerPool};

const TAG: &str = "main";

// == Proxy Server ==
/// Handle to a running proxy.
pub struct ProxyServer {
    local_addr: SocketAddr,
    admin_addr: Option<SocketAddr>,
    cache: SharedCache,
    logger: Logger,
    conn_queue: Arc<BoundedQueue<Connection>>,
    log_queue: Arc<LogQueue>,
    shutdown: broadcast::Sender<()>,
    dispatcher: JoinHandle<()>,
    admin: Option<JoinHandle<()>>,
    workers: WorkerPool,
    log_consumer: JoinHandle<File>,
}

impl ProxyServer {
    // == Start ==
    /// Starts every task and begins accepting connections.
    ///
    /// # Startup Sequence
    /// 1. Validate the configuration
    /// 2. Truncate the log file and start the log consumer
    /// 3. Bind the proxy listener (and the admin listener, if enabled)
    /// 4. Start the worker pool
    /// 5. Start the dispatcher and the admin server
    pub async fn start(config: Config) -> anyhow::Result<Self> {
        config.validate().context("Invalid configuration")?;

        let log_file = open_log_file(&config.log_file)
            .await
            .with_context(|| format!("Failed to open log file {}", config.log_file.display()))?;
        let log_queue = Arc::new(LogQueue::new(config.log_queue_capacity));
        let log_consumer = spawn_log_consumer(Arc::clone(&log_queue), log_file);
        let logger = Logger::new(Arc::clone(&log_queue));
        logger.log(TAG, "Successfully started log consumer").await;

        let listener = TcpListener::bind(config.listen_addr())
            .await
            .with_context(|| format!("Failed to bind {}", config.listen_addr()))?;
        let local_addr = listener.local_addr()?;

        let admin_listener = match config.admin_addr() {
            Some(addr) => Some(
                TcpListener::bind(addr)
                    .await
                    .with_context(|| format!("Failed to bind admin surface on {}", addr))?,
            ),
            None => None,
        };
        let admin_addr = admin_listener
            .as_ref()
            .map(TcpListener::local_addr)
            .transpose()?;
        if let Some(addr) = admin_addr {
            info!("Admin surface listening on http://{}", addr);
        }

        let cache = SharedCache::new(config.max_cache_size, config.max_object_size);
        let conn_queue = Arc::new(BoundedQueue::new(config.conn_queue_capacity));
        let handler = Arc::new(ProxyHandler::new(
            cache.clone(),
            logger.clone(),
            config.max_object_size,
        ));
        let workers = WorkerPool::spawn(
            config.workers,
            Arc::clone(&conn_queue),
            handler,
            logger.clone(),
        );
        info!(workers = workers.size(), "Worker pool started");

        let (shutdown, _) = broadcast::channel(1);
        let dispatcher = tokio::spawn(run_dispatcher(
            listener,
            Arc::clone(&conn_queue),
            logger.clone(),
            shutdown.subscribe(),
        ));
        info!("Proxy listening on {}", local_addr);

        let admin = admin_listener.map(|listener| {
            let state = AppState::new(cache.clone(), Arc::clone(&conn_queue), Arc::clone(&log_queue));
            let mut stop = shutdown.subscribe();

            tokio::spawn(async move {
                let served = axum::serve(listener, create_router(state))
                    .with_graceful_shutdown(async move {
                        let _ = stop.recv().await;
                    })
                    .await;
                if let Err(err) = served {
                    error!("Admin server failed: {}", err);
                }
            })
        });

        Ok(Self {
            local_addr,
            admin_addr,
            cache,
            logger,
            conn_queue,
            log_queue,
            shutdown,
            dispatcher,
            admin,
            workers,
            log_consumer,
        })
    }

    /// Address the proxy is accepting connections on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Address of the admin surface, if enabled.
    pub fn admin_addr(&self) -> Option<SocketAddr> {
        self.admin_addr
    }

    /// The shared cache served by the workers.
    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    // == Shutdown ==
    /// Stops accepting, lets the workers finish every queued connection,
    /// then flushes the remaining log records to the file.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        let _ = self.shutdown.send(());

        if let Err(err) = self.dispatcher.await {
            error!("Dispatcher task failed: {}", err);
        }
        if let Some(admin) = self.admin {
            if let Err(err) = admin.await {
                error!("Admin server task failed: {}", err);
            }
        }

        self.conn_queue.close();
        self.workers.join().await;
        info!("Worker pool stopped");

        self.logger.log(TAG, "Proxy shutting down").await;
        self.log_queue.close();
        self.log_consumer
            .await
            .context("Log consumer task failed")?;
        info!("Log consumer stopped");

        Ok(())
    }
}
