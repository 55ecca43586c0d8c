//! Slurp Server - A caching file server
//!
//! Serves files from a directory over a minimal TCP protocol and keeps
//! recently served files in a byte-bounded in-memory LRU cache.

use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use slurp_server::api::start_admin_server;
use slurp_server::cache::EvictionCache;
use slurp_server::{server, spawn_coordinator, AppState, Config, FetchPipeline, ServeArgs, ServeRoot};

/// How long in-flight insertions get to settle after the listener stops.
const COORDINATOR_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Main entry point for the file server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Parse `<serve-directory> <listen-port>` and check the directory
/// 3. Load tuning from environment variables
/// 4. Start the cache coordinator task
/// 5. Start the admin API if `ADMIN_PORT` is set
/// 6. Accept file requests until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slurp_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = ServeArgs::parse(std::env::args().skip(1))?;
    args.check_serve_dir()?;

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_cache_bytes={}, queue_depth={}, completion_timeout={}s, request_timeout={}s, admin_port={:?}",
        config.max_cache_bytes,
        config.queue_depth,
        config.completion_timeout,
        config.request_timeout,
        config.admin_port
    );

    let (coordinator, coordinator_task) = spawn_coordinator(
        EvictionCache::new(config.max_cache_bytes),
        config.queue_depth,
        config.completion_timeout(),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let admin_task = config.admin_port.map(|port| {
        let state = AppState::new(coordinator.clone());
        let mut shutdown_rx = shutdown_rx.clone();
        tokio::spawn(async move {
            let shutdown = async move {
                let _ = shutdown_rx.changed().await;
            };
            if let Err(e) = start_admin_server(state, port, shutdown).await {
                error!(error = %e, "admin API failed");
            }
        })
    });

    let listener = tokio::net::TcpListener::bind(&args.listen_addr)
        .await
        .with_context(|| format!("server couldn't listen on {}", args.listen_addr))?;
    info!("Serving {}", args.serve_dir.display());

    let pipeline = FetchPipeline::new(ServeRoot::new(&args.serve_dir), coordinator);
    server::serve(
        listener,
        pipeline,
        config.request_timeout(),
        shutdown_signal(),
    )
    .await;

    let _ = shutdown_tx.send(true);
    if let Some(admin_task) = admin_task {
        let _ = admin_task.await;
    }

    // The coordinator exits once open connections release their handles.
    match tokio::time::timeout(COORDINATOR_DRAIN_TIMEOUT, coordinator_task).await {
        Ok(_) => info!("Cache coordinator drained"),
        Err(_) => warn!("Cache coordinator still busy, exiting anyway"),
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
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
                error!(error = %e, "failed to install SIGTERM handler");
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
