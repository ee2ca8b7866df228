//! Transit Cache - GTFS transit data API with a TTL cache
//!
//! Binary entry point: loads configuration, wires the caches and serves HTTP.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use transit_cache::api::create_router;
use transit_cache::{spawn_compaction_task, AppState, Config};

/// Main entry point for the transit API server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Build the upstream fetcher and the cache layers
/// 4. Start background compaction if enabled
/// 5. Start HTTP server on configured port
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "transit_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Transit Cache API");

    let config = Config::from_env().context("invalid configuration")?;
    info!(
        "Configuration loaded: realtime_ttl={}s, static_ttl={}h, size_limit={}, port={}",
        config.cache.realtime_ttl_seconds,
        config.cache.static_ttl_hours,
        config.cache.cache_size_limit,
        config.server_port
    );

    let state = AppState::from_config(&config).context("failed to build upstream client")?;
    info!("Cache initialized");

    let compaction_handle = if config.background_compaction {
        info!("Background compaction task started");
        Some(spawn_compaction_task(
            state.cache.clone(),
            config.compaction_interval,
        ))
    } else {
        None
    };

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(compaction_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the compaction task if one is running.
async fn shutdown_signal(compaction_handle: Option<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
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

    if let Some(handle) = compaction_handle {
        handle.abort();
        warn!("Compaction task aborted");
    }
}
