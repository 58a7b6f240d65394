//! HTTP entry point for the archive.
//!
//! Starts serving immediately and runs the initial sync in the background;
//! `/search` answers 503 until the content cache is ready.
//!
//! ## Environment Variables
//!
//! - `ARCHIVE_CONFIG`: Path to the config file (default: `storage/config.toml`)
//! - `ARCHIVE_FIXTURE`: Serve a JSON fixture instead of the API
//! - `NOTION_API_KEY`: API token (variable name set by `store.token_env`)
//! - `NOTION_DATABASE_ID`: Database to sync
//! - `ARCHIVE_BIND`: Listen address
//! - `RUST_LOG`: Log filter (e.g., `info`, `archive_sync=debug`)

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use archive_sync::error::{AppError, Result};
use archive_sync::models::{Config, LoggingConfig};
use archive_sync::pipeline;
use archive_sync::server::{self, AppState};
use archive_sync::store;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing, honouring `RUST_LOG` over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path =
        std::env::var("ARCHIVE_CONFIG").unwrap_or_else(|_| "storage/config.toml".to_string());
    let mut config = Config::load_or_default(&config_path);
    config.apply_env();
    init_tracing(&config.logging);

    info!("Archive server starting...");
    config.validate()?;

    let fixture = std::env::var("ARCHIVE_FIXTURE").ok().map(PathBuf::from);
    let store = store::open(&config, fixture.as_deref())?;
    let source_id = pipeline::resolve_source(store.as_ref(), &config)?;
    info!("Syncing source {}", source_id);

    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .map_err(|e| AppError::config(format!("Invalid bind address {}: {}", config.server.bind, e)))?;

    let state = Arc::new(AppState::new(store, config));
    state.start_sync();

    server::serve(state, addr).await
}
