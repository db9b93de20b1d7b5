use thiserror::Error;

/// Unified error type for the entire watchlist-core library.
/// Every public function returns `Result<T, WatchlistError>`.
#[derive(Debug, Error)]
pub enum WatchlistError {
    // ── Addressing ──────────────────────────────────────────────────
    #[error("Malformed node key: {0}")]
    MalformedKey(String),

    // ── Hierarchy (user-actionable) ─────────────────────────────────
    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    // ── API / Network ───────────────────────────────────────────────
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── Configuration ───────────────────────────────────────────────
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WatchlistError {
    /// `true` for failures the user can act on (rename, pick another target, ...).
    /// These are shown as a transient notice; the local tree is left untouched.
    #[must_use]
    pub fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            WatchlistError::DuplicateName(_)
                | WatchlistError::NotFound(_)
                | WatchlistError::InvalidTarget(_)
                | WatchlistError::Api { .. }
        )
    }

    /// Map an HTTP error status plus the server's message onto a variant.
    /// The server defines no error codes beyond the status itself.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            404 => WatchlistError::NotFound(message),
            409 => WatchlistError::DuplicateName(message),
            400 | 422 => WatchlistError::InvalidTarget(message),
            _ => WatchlistError::Api { status, message },
        }
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<serde_json::Error> for WatchlistError {
    fn from(e: serde_json::Error) -> Self {
        WatchlistError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for WatchlistError {
    fn from(e: reqwest::Error) -> Self {
        // Strip query parameters from URLs before surfacing the message.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        WatchlistError::Network(sanitized)
    }
}
