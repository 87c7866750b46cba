//! Proxy Module
//!
//! Accept loop and per-connection request pipeline.
//!
//! # Flow
//! 1. `run_dispatcher` accepts a client and queues it as a `Connection`
//! 2. A worker dequeues it and runs `ProxyHandler` over it
//! 3. The handler answers from the cache or relays from the origin server

pub mod dispatcher;
pub mod handler;
pub mod request;
pub mod response;

use std::net::SocketAddr;

use tokio::net::TcpStream;

pub use dispatcher::run_dispatcher;
pub use handler::ProxyHandler;
pub use request::{build_upstream_request, RequestHead, Target};
pub use response::error_page;

// == Connection ==
/// Accepted client connection waiting to be served.
#[derive(Debug)]
pub struct Connection {
    pub stream: TcpStream,
    pub peer: SocketAddr,
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Self { stream, peer }
    }
}
