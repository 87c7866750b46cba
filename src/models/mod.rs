//! Response models for the admin API
//!
//! This module defines the DTOs serialized as JSON by the admin endpoints.

pub mod responses;

// Re-export commonly used types
pub use responses::{HealthResponse, QueueDepth, StatsResponse};
