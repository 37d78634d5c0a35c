//! Server configuration loaded from environment variables.
//!
//! Everything except the Gemini API key has a usable default, so the server
//! starts with zero configuration; requests that need a missing credential
//! fail individually with a configuration error.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use crafter_shared::constants::DEFAULT_HTTP_PORT;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-latest";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:3001`
    pub http_addr: SocketAddr,

    /// Gemini API key.
    /// Env: `GEMINI_API_KEY`
    /// Default: none (generation endpoints answer 500 until set).
    pub gemini_api_key: Option<String>,

    /// Model used for both chat and summaries.
    /// Env: `GEMINI_MODEL`
    pub gemini_model: String,

    /// Base URL of the Generative Language REST API.
    /// Env: `GEMINI_API_BASE`
    pub gemini_api_base: String,

    /// SQLite file holding the document collections.
    /// Env: `DATABASE_PATH`
    /// Default: platform data directory.
    pub database_path: Option<PathBuf>,

    /// Whether any origin may call the API.
    /// Env: `CORS_ALLOW_ANY` (true/false)
    /// Default: `true`
    pub cors_allow_any: bool,

    /// Maximum accepted request body, in bytes (2 MiB).
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            database_path: None,
            cors_allow_any: true,
            max_body_size: 2 * 1024 * 1024,
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("http_addr", &self.http_addr)
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "<redacted>"))
            .field("gemini_model", &self.gemini_model)
            .field("gemini_api_base", &self.gemini_api_base)
            .field("database_path", &self.database_path)
            .field("cors_allow_any", &self.cors_allow_any)
            .field("max_body_size", &self.max_body_size)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(key) = lookup("GEMINI_API_KEY") {
            if !key.trim().is_empty() {
                config.gemini_api_key = Some(key.trim().to_string());
            }
        }

        if let Some(model) = lookup("GEMINI_MODEL") {
            if !model.is_empty() {
                config.gemini_model = model;
            }
        }

        if let Some(base) = lookup("GEMINI_API_BASE") {
            config.gemini_api_base = base.trim_end_matches('/').to_string();
        }

        if let Some(path) = lookup("DATABASE_PATH") {
            config.database_path = Some(PathBuf::from(path));
        }

        if let Some(val) = lookup("CORS_ALLOW_ANY") {
            config.cors_allow_any = val != "false" && val != "0";
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter.

        config
    }
}
