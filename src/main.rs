//! Shardcache node binary
//!
//! # Startup Sequence
//! 1. Initialize tracing subscriber for logging
//! 2. Parse configuration from flags and environment variables
//! 3. Create the cache shard and start its expiry sweep
//! 4. Build the cache node (hash ring of self plus peers)
//! 5. Serve the HTTP API until SIGINT/SIGTERM

use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shardcache::cache::{SharedCache, SweepGuard};
use shardcache::{create_router, AppState, CacheNode, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shardcache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();
    info!(
        "Configuration loaded: listen={}, node={}, peers={:?}, capacity={}, write_ttl={}s, sweep_interval={}s",
        config.listen_addr,
        config.node_id(),
        config.peer_list(),
        config.capacity,
        config.write_ttl_secs,
        config.sweep_interval().as_secs()
    );

    let (cache, sweeper) = SharedCache::with_sweeper(config.capacity, config.sweep_interval());
    let node = CacheNode::from_config(&config, cache);
    let app = create_router(AppState::new(node));

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sweeper))
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for Ctrl+C or SIGTERM, then stops the expiry sweep.
async fn shutdown_signal(sweeper: SweepGuard) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
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

    sweeper.stop();
    warn!("Expiry sweep stopped");
}
