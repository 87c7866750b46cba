//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;

/// Fill level of one bounded queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueDepth {
    /// Items currently buffered
    pub len: usize,
    /// Maximum number of buffered items
    pub capacity: usize,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of evictions
    pub evictions: u64,
    /// Objects refused for exceeding the per-object ceiling
    pub rejected: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Bytes currently cached
    pub total_size: usize,
    /// Aggregate cache budget in bytes
    pub max_cache_size: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    pub connection_queue: QueueDepth,
    pub log_queue: QueueDepth,
}

impl StatsResponse {
    /// Creates a new StatsResponse from a cache snapshot and queue depths
    pub fn new(
        stats: CacheStats,
        max_cache_size: usize,
        connection_queue: QueueDepth,
        log_queue: QueueDepth,
    ) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            rejected: stats.rejected,
            total_entries: stats.total_entries,
            total_size: stats.total_size,
            max_cache_size,
            hit_rate: stats.hit_rate(),
            connection_queue,
            log_queue,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
