//! Error types for the proxy
//!
//! Provides unified error handling using thiserror.

use std::io;

use thiserror::Error;

// == Proxy Error Enum ==
/// Errors raised while serving a single client connection.
///
/// None of these are fatal to the worker that hit them; the blast radius is
/// the connection being served.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Malformed request line or header block
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Method other than GET
    #[error("Method not implemented: {0}")]
    NotImplemented(String),

    /// Could not reach the origin server
    #[error("Upstream connection to {host}:{port} failed: {source}")]
    Upstream {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// Client or upstream socket failure mid-transfer
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ProxyError {
    // == Status Mapping ==
    /// Status code and short message for the error page sent to the client.
    ///
    /// Returns `None` for errors that are not reported to the client (the
    /// connection is simply closed).
    pub fn status(&self) -> Option<(u16, &'static str)> {
        match self {
            ProxyError::BadRequest(_) => Some((400, "Bad Request")),
            ProxyError::NotImplemented(_) => Some((501, "Not Implemented")),
            ProxyError::Upstream { .. } | ProxyError::Io(_) => None,
        }
    }
}

// == Queue Error Enum ==
/// Terminal result of a queue operation after the queue was closed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    #[error("Queue closed")]
    Closed,
}

// == Result Type Alias ==
/// Convenience Result type for the proxy pipeline.
pub type Result<T> = std::result::Result<T, ProxyError>;
