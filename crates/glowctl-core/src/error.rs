// ── Core error types ──
//
// User-facing errors from glowctl-core. Consumers never see HTTP status
// codes or JSON parse failures directly: the `From<glowctl_api::Error>`
// impl folds transport-layer errors into four outcomes.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Command outcomes ─────────────────────────────────────────────
    #[error("Cannot reach bridge at {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("Bridge did not answer within {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Device rejected the command: {message}")]
    DeviceRejected { message: String },

    /// The optional state fetch failed. Never surfaced to the user.
    #[error("State fetch failed, keeping local state: {reason}")]
    StaleDataIgnored { reason: String },

    // ── Lifecycle ────────────────────────────────────────────────────
    #[error("Controller stopped")]
    ControllerStopped,

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Errors on a command that should roll the optimistic state back.
    pub fn triggers_rollback(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Timeout { .. } | Self::DeviceRejected { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<glowctl_api::Error> for CoreError {
    fn from(err: glowctl_api::Error) -> Self {
        match err {
            glowctl_api::Error::Transport(ref e) => CoreError::Network {
                url: e
                    .url()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "<unknown>".into()),
                reason: e.to_string(),
            },
            glowctl_api::Error::Timeout { timeout_ms } => CoreError::Timeout { timeout_ms },
            glowctl_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            glowctl_api::Error::Http { status, message } => CoreError::DeviceRejected {
                message: format!("HTTP {status}: {message}"),
            },
            glowctl_api::Error::Rejected { message } => CoreError::DeviceRejected { message },
            glowctl_api::Error::Deserialization { message, body: _ } => {
                CoreError::DeviceRejected {
                    message: format!("unreadable response: {message}"),
                }
            }
        }
    }
}
