//! HTTP front end for the read-mode pipeline.

mod config;
mod routes;

use anyhow::Context;
use readmode_core::Pipeline;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::ServerConfig;

const DEFAULT_FILTER: &str = "readmode_server=info,readmode_core=info,tower_http=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    fmt().with_env_filter(filter).init();

    let config = ServerConfig::from_env().context("failed to load server configuration")?;
    let pipeline = Pipeline::with_config(config.pipeline).context("failed to build HTTP client")?;
    let app = routes::router(pipeline);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    tracing::info!(addr = %config.addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
