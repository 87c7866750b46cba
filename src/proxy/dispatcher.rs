//! Dispatcher
//!
//! Accept loop feeding the connection queue.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::logging::Logger;
use crate::proxy::Connection;
use crate::queue::BoundedQueue;

const TAG: &str = "main";

// == Run Dispatcher ==
/// Accepts clients and hands each one to the worker pool.
///
/// Waits while the connection queue is full, which in turn stops accepting.
/// Returns when `shutdown` fires or the queue is closed. Accept failures are
/// reported and the loop carries on.
pub async fn run_dispatcher(
    listener: TcpListener,
    queue: Arc<BoundedQueue<Connection>>,
    logger: Logger,
    mut shutdown: broadcast::Receiver<()>,
) {
    info!("Dispatcher accepting connections");

    loop {
        let accepted = tokio::select! {
            _ = shutdown.recv() => {
                info!("Dispatcher received shutdown signal, exiting loop");
                break;
            }
            accepted = listener.accept() => accepted,
        };

        let (stream, peer) = match accepted {
            Ok(pair) => pair,
            Err(err) => {
                warn!("Failed to accept connection: {}", err);
                continue;
            }
        };

        logger
            .log(
                TAG,
                format!("Accepted connection from ({}, {})", peer.ip(), peer.port()),
            )
            .await;

        let inserted = tokio::select! {
            _ = shutdown.recv() => {
                info!("Dispatcher received shutdown signal while queue was full");
                break;
            }
            inserted = queue.insert(Connection::new(stream, peer)) => inserted,
        };

        if inserted.is_err() {
            info!("Connection queue closed, dispatcher exiting");
            break;
        }
    }
}
