//! Drive Gateway
//!
//! Single-binary HTTP service that proxies the Google Drive file API for one
//! operator: OAuth2 consent with on-disk token persistence, file listing,
//! streaming download/export, and change-activity polling.

mod bootstrap;
mod config;
mod error;
mod routes;

use anyhow::{Context, Result};
use core_session::{LoopbackConsentFlow, ReqwestHttpClient};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::GatewayConfig;
use crate::routes::{router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("starting drive-gateway");

    let config = GatewayConfig::from_env().context("failed to load configuration")?;
    info!(
        listen_addr = %config.listen_addr,
        secrets_dir = %config.session.secrets_dir.display(),
        scopes = config.session.scopes.len(),
        "configuration loaded"
    );

    bootstrap::ensure_layout(&config.session).await?;

    let http = Arc::new(ReqwestHttpClient::new());
    let state = AppState {
        config: config.session,
        flow: Arc::new(LoopbackConsentFlow::new(http.clone())),
        http,
    };

    let app = router(state);
    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.listen_addr))?;

    info!(addr = %config.listen_addr, "accepting requests");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutdown complete");
    Ok(())
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
