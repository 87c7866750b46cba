//! API Handlers
//!
//! HTTP request handlers for each admin endpoint.

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::cache::SharedCache;
use crate::logging::LogQueue;
use crate::models::{HealthResponse, QueueDepth, StatsResponse};
use crate::proxy::Connection;
use crate::queue::BoundedQueue;

/// Application state shared across all handlers.
///
/// Holds handles to the same cache and queues the proxy itself uses.
#[derive(Clone)]
pub struct AppState {
    pub cache: SharedCache,
    pub conn_queue: Arc<BoundedQueue<Connection>>,
    pub log_queue: Arc<LogQueue>,
}

impl AppState {
    pub fn new(
        cache: SharedCache,
        conn_queue: Arc<BoundedQueue<Connection>>,
        log_queue: Arc<LogQueue>,
    ) -> Self {
        Self {
            cache,
            conn_queue,
            log_queue,
        }
    }
}

async fn depth<T>(queue: &BoundedQueue<T>) -> QueueDepth {
    QueueDepth {
        len: queue.len().await,
        capacity: queue.capacity(),
    }
}

/// Handler for GET /stats
///
/// Returns current cache statistics. Only takes the read side of the cache
/// lock.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache.stats().await;
    let max_cache_size = state.cache.max_cache_size().await;

    Json(StatsResponse::new(
        stats,
        max_cache_size,
        depth(&state.conn_queue).await,
        depth(&state.log_queue).await,
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
