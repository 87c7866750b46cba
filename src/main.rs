//! Mini Proxy - A caching HTTP/1.0 forward proxy
//!
//! Binary entry point: parses the configuration, runs the proxy and shuts it
//! down cleanly on Ctrl+C or SIGTERM.

use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mini_proxy::{Config, ProxyServer};

/// Main entry point for the proxy.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Parse configuration from the command line and environment
/// 3. Start the proxy (log consumer, workers, dispatcher, admin surface)
/// 4. Wait for SIGINT/SIGTERM
/// 5. Shut down, draining queued connections and log records
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mini_proxy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();
    info!(
        "Configuration loaded: port={}, workers={}, max_cache_size={}, max_object_size={}, log_file={}",
        config.port,
        config.workers,
        config.max_cache_size,
        config.max_object_size,
        config.log_file.display()
    );

    let server = ProxyServer::start(config).await?;
    info!("Proxy started on {}", server.local_addr());

    shutdown_signal().await;

    server.shutdown().await?;
    info!("Proxy shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
