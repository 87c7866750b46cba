//! Diagnostic Logging Module
//!
//! Producers push `LogRecord`s onto a bounded queue through a `Logger`
//! handle; a single consumer task (see `tasks::spawn_log_consumer`) appends
//! them to the log file. Every record is mirrored to `tracing` at debug
//! level.

mod record;

use std::sync::Arc;

use tracing::debug;

use crate::queue::BoundedQueue;

pub use record::LogRecord;

/// Queue type carrying diagnostic records
pub type LogQueue = BoundedQueue<LogRecord>;

// == Logger ==
/// Cloneable producer handle for the log queue.
#[derive(Debug, Clone)]
pub struct Logger {
    queue: Arc<LogQueue>,
}

impl Logger {
    pub fn new(queue: Arc<LogQueue>) -> Self {
        Self { queue }
    }

    // == Log ==
    /// Records an event. Waits while the log queue is full; silently drops
    /// the record if the queue has been closed.
    pub async fn log(&self, tag: &str, message: impl Into<String>) {
        let record = LogRecord::new(tag, message);
        debug!(tag = %record.tag, "{}", record.message);

        // Diagnostics only: a closed queue during shutdown is not an error
        let _ = self.queue.insert(record).await;
    }
}
