//! asset-cache server entry point.
//!
//! Loads configuration, opens the cache database, optionally installs and
//! activates the current deployment, then serves MCP on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use asset_cache_client::{Coordinator, FetchConfig, HttpFetcher};
use asset_cache_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(origin = %config.origin, db_path = %config.db_path.display(), version = %config.cache_version, "Starting asset-cache server on stdio transport");

    let db = CacheDb::open(&config.db_path).await?;
    let fetcher = Arc::new(HttpFetcher::new(FetchConfig::from(&config))?);
    let coordinator = Coordinator::from_config(db, fetcher, &config)?;

    if config.install_on_start {
        let installed = coordinator.install().await?;
        if !installed.failed.is_empty() {
            tracing::warn!(failed = installed.failed.len(), "some seed URLs were not cached");
        }
        let activated = coordinator.activate().await?;
        tracing::info!(deleted = ?activated.deleted, "worker active");
    }

    let handler = handler::AssetCacheServer::new(coordinator.clone());
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    coordinator.settle_for(config.shutdown_grace()).await;

    Ok(())
}
