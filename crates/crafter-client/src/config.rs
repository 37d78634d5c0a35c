//! Client configuration loaded from environment variables.

use reqwest::Url;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3001";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the ConceptCrafter server.
    /// Env: `CRAFTER_SERVER_URL`
    /// Default: `http://127.0.0.1:3001`
    pub server_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("CRAFTER_SERVER_URL") {
            if Url::parse(&url).is_ok() {
                config.server_url = url.trim_end_matches('/').to_string();
            } else {
                tracing::warn!(value = %url, "Invalid CRAFTER_SERVER_URL, using default");
            }
        }

        config
    }
}
