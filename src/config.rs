//! Configuration Module
//!
//! Command-line configuration with environment-variable fallbacks.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::cache::{MAX_CACHE_SIZE, MAX_OBJECT_SIZE};

/// Worker pool size when none is given
pub const DEFAULT_WORKERS: usize = 4;

/// Connection and log queue capacity when none is given
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Proxy configuration parameters.
///
/// Every option can also be supplied through the environment variable named
/// next to it.
#[derive(Debug, Clone, Parser)]
#[command(name = "mini_proxy", version, about = "Caching HTTP/1.0 forward proxy")]
pub struct Config {
    /// Listening port (`0` picks an ephemeral port)
    #[arg(env = "PROXY_PORT", value_name = "PORT")]
    pub port: u16,

    /// Address to listen on
    #[arg(long, env = "PROXY_BIND", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,

    /// Number of worker tasks
    #[arg(long, env = "NTHREADS", default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Accepted connections buffered ahead of the workers
    #[arg(long, env = "SBUFSIZE", default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub conn_queue_capacity: usize,

    /// Diagnostic records buffered ahead of the log writer
    #[arg(long, env = "LOGBUFSIZE", default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub log_queue_capacity: usize,

    /// Diagnostic log file, truncated at start-up
    #[arg(long, env = "PROXY_LOG_FILE", value_name = "PATH", default_value = "proxy.log")]
    pub log_file: PathBuf,

    /// Aggregate cache budget in bytes
    #[arg(long, env = "MAX_CACHE_SIZE", default_value_t = MAX_CACHE_SIZE)]
    pub max_cache_size: usize,

    /// Largest cacheable object in bytes
    #[arg(long, env = "MAX_OBJECT_SIZE", default_value_t = MAX_OBJECT_SIZE)]
    pub max_object_size: usize,

    /// Port of the admin HTTP surface; disabled when absent
    #[arg(long, env = "PROXY_ADMIN_PORT", value_name = "PORT")]
    pub admin_port: Option<u16>,
}

// == Config Error ==
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("max object size ({object}) exceeds max cache size ({cache})")]
    ObjectLargerThanCache { object: usize, cache: usize },
}

impl Config {
    // == Validate ==
    /// Rejects settings the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Zero("workers"));
        }
        if self.conn_queue_capacity == 0 {
            return Err(ConfigError::Zero("conn-queue-capacity"));
        }
        if self.log_queue_capacity == 0 {
            return Err(ConfigError::Zero("log-queue-capacity"));
        }
        if self.max_object_size > self.max_cache_size {
            return Err(ConfigError::ObjectLargerThanCache {
                object: self.max_object_size,
                cache: self.max_cache_size,
            });
        }
        Ok(())
    }

    /// Address the proxy listens on.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    /// Address of the admin surface, if enabled.
    pub fn admin_addr(&self) -> Option<SocketAddr> {
        self.admin_port.map(|port| SocketAddr::new(self.bind, port))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 0,
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            workers: DEFAULT_WORKERS,
            conn_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            log_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            log_file: PathBuf::from("proxy.log"),
            max_cache_size: MAX_CACHE_SIZE,
            max_object_size: MAX_OBJECT_SIZE,
            admin_port: None,
        }
    }
}
