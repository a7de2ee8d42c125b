//! # Resto POS API Server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  kiosk / cashier / kitchen / admin ──► HTTP (8080) ──► services        │
//! │                                                          │      │       │
//! │                                                          ▼      ▼       │
//! │                                                     SQLite   Midtrans   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pos_api::routes;
use pos_api::{AppState, PosConfig};
use resto_db::{Database, DbConfig};
use resto_payment::SnapClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = PosConfig::load().context("Failed to load configuration")?;
    info!(
        port = config.http_port,
        database = %config.database_path,
        gateway = %config.payment.base_url,
        "Configuration loaded"
    );

    if let Some(dir) = Path::new(&config.database_path).parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let db = Database::new(DbConfig::new(&config.database_path).max_connections(config.db_max_connections))
        .await
        .context("Failed to open database")?;

    let gateway = SnapClient::new(config.payment.snap_config()).context("Failed to build payment client")?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let state = AppState::new(db.clone(), Arc::new(gateway), config);
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Starting HTTP server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=pos_api=trace,sqlx=warn` - Per-crate overrides
/// - Default: `info,pos_api=debug,resto_db=info`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,pos_api=debug,resto_db=info"));

    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
