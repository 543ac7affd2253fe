//! `Lockbox` server entry point.
//!
//! Applies process hardening, initializes logging, and starts the Axum HTTP
//! server with graceful shutdown.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use lockbox_server::build_router;
use lockbox_server::config::ServerConfig;
use lockbox_server::hardening;
use lockbox_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env();

    // Hardening runs before any secret can reach memory; its problems are
    // logged once the subscriber exists.
    let hardening_problems = hardening::apply(config.disable_mlock);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    for problem in &hardening_problems {
        warn!(error = %problem, "process hardening incomplete");
    }

    info!(
        max_concurrent_derivations = config.max_concurrent_derivations,
        max_analyze_records = config.max_analyze_records,
        "Lockbox starting"
    );

    let app = build_router(Arc::new(AppState::new(&config)));

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "Lockbox server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Lockbox server stopped");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, stopping server");
}
