//! # crafter-server
//!
//! HTTP backend for ConceptCrafter.
//!
//! This binary provides:
//! - **Chat gateway** relaying the guided conversation to Gemini
//! - **Summary gateway** turning a finished transcript into a structured
//!   video concept summary
//! - **Persistence** of completed conversations, summaries and extractor
//!   results in a SQLite document store
//! - **PDF export** of a reviewed summary

mod api;
mod config;
mod error;
mod gemini;
mod pdf;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crafter_shared::constants::APP_NAME;
use crafter_store::Database;

use crate::api::AppState;
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,crafter_server=debug")),
        )
        .init();

    info!("Starting {} server v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");
    if config.gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; chat and summary requests will fail");
    }

    // -----------------------------------------------------------------------
    // 3. Open the document store
    // -----------------------------------------------------------------------
    // A missing store only disables the persistence endpoints.
    let opened = match &config.database_path {
        Some(path) => Database::open_at(path),
        None => Database::new(),
    };
    let store = match opened {
        Ok(db) => Some(db),
        Err(e) => {
            error!(error = %e, "Failed to open document store; persistence disabled");
            None
        }
    };

    let http_addr = config.http_addr;
    let app_state = AppState::new(config, store);

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
