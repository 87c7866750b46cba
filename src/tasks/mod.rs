//! Background Tasks Module
//!
//! Long-running tasks started once at start-up.
//!
//! # Tasks
//! - Worker pool: drains the connection queue and serves each client
//! - Log consumer: drains the log queue into the log file

mod log_consumer;
mod workers;

pub use log_consumer::{open_log_file, spawn_log_consumer};
pub use workers::{ConnectionHandler, WorkerPool};
