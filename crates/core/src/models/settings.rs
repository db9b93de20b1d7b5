use serde::{Deserialize, Serialize};

use crate::errors::WatchlistError;

/// Environment variable holding the remote store's base URL.
pub const ENV_API_URL: &str = "WATCHLIST_API_URL";

/// Environment variable holding the request timeout in seconds.
pub const ENV_API_TIMEOUT: &str = "WATCHLIST_API_TIMEOUT_SECS";

/// Connection settings for the remote watchlist store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewaySettings {
    /// Base URL, e.g. `http://localhost:8000`. Endpoints are appended as `/api/...`.
    pub base_url: String,

    /// Per-request timeout (ignored on wasm32).
    pub timeout_secs: u64,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
        }
    }
}

impl GatewaySettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Read settings from the environment, falling back to defaults for unset values.
    pub fn from_env() -> Result<Self, WatchlistError> {
        let mut settings = Self::default();
        if let Ok(url) = std::env::var(ENV_API_URL) {
            settings.base_url = url;
        }
        if let Ok(raw) = std::env::var(ENV_API_TIMEOUT) {
            settings.timeout_secs = raw.trim().parse().map_err(|_| {
                WatchlistError::Config(format!("{ENV_API_TIMEOUT} must be a whole number of seconds, got '{raw}'"))
            })?;
        }
        settings.validate()?;
        Ok(settings)
    }

    /// Reject unusable settings.
    pub fn validate(&self) -> Result<(), WatchlistError> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err(WatchlistError::Config("base URL must not be empty".into()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(WatchlistError::Config(format!(
                "base URL '{url}' must start with http:// or https://"
            )));
        }
        if self.timeout_secs == 0 {
            return Err(WatchlistError::Config("timeout must be at least 1 second".into()));
        }
        Ok(())
    }

    /// Base URL without trailing slashes.
    #[must_use]
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim().trim_end_matches('/')
    }
}
