use thiserror::Error;

/// Top-level error type for the `glowctl-api` crate.
///
/// Covers every way a bridge call can go wrong: the transport, the HTTP
/// status line, and the `{success, error}` JSON envelope. `glowctl-core`
/// folds these into its smaller user-facing taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request exceeded its bounded wait.
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    // ── Bridge responses ────────────────────────────────────────────
    /// Non-success HTTP status from the bridge.
    #[error("Bridge returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// HTTP 2xx but the envelope said `success: false`.
    #[error("Bridge rejected the request: {message}")]
    Rejected { message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the request never got an answer in time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if the bridge answered but refused the command.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. } | Self::Http { .. })
    }
}
