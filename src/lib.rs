//! Mini Proxy - A caching HTTP/1.0 forward proxy
//!
//! Accepted connections flow through a bounded queue to a fixed worker
//! pool. Responses are cached in a size-bounded store with recency-based
//! eviction behind a writer-fair readers-writer lock, and diagnostics are
//! funnelled through a second bounded queue to a single log writer.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod proxy;
pub mod queue;
pub mod server;
pub mod tasks;

pub use api::AppState;
pub use cache::SharedCache;
pub use config::Config;
pub use error::{ProxyError, QueueError};
pub use queue::BoundedQueue;
pub use server::ProxyServer;
