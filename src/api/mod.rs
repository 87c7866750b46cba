//! API Module
//!
//! Optional admin HTTP surface exposing cache and queue state.
//!
//! # Endpoints
//! - `GET /stats` - Cache statistics and queue depths
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
