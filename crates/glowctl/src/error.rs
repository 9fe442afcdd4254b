//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use glowctl_config::ConfigError;
use glowctl_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const CONFIG: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the bridge at {url}")]
    #[diagnostic(
        code(glowctl::connection_failed),
        help(
            "Check that the bridge is running and reachable.\n\
             {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Bulb is offline")]
    #[diagnostic(
        code(glowctl::offline),
        help("The bridge at {url} answered but cannot see the bulb. Check its power and Wi-Fi.")
    )]
    Offline { url: String },

    #[error("Bridge did not answer within {timeout_ms}ms")]
    #[diagnostic(
        code(glowctl::timeout),
        help("Increase timeout with --timeout or check bridge responsiveness.")
    )]
    Timeout { timeout_ms: u64 },

    // ── Device ───────────────────────────────────────────────────────
    #[error("Command rejected: {message}")]
    #[diagnostic(code(glowctl::rejected))]
    Rejected { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(glowctl::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(glowctl::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: glowctl config init --url <URL> --name {name}"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No bridge configured")]
    #[diagnostic(
        code(glowctl::no_config),
        help(
            "Pass --url, or create a profile with: glowctl config init --url <URL>\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(glowctl::config))]
    Config(#[from] ConfigError),

    // ── Internal ─────────────────────────────────────────────────────
    #[error("Controller stopped unexpectedly")]
    #[diagnostic(code(glowctl::internal))]
    ControllerStopped,

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(glowctl::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Offline { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            Self::ProfileNotFound { .. } | Self::NoConfig { .. } | Self::Config(_) => {
                exit_code::CONFIG
            }
            Self::Rejected { .. } | Self::ControllerStopped | Self::Io(_) | Self::Json(_) => {
                exit_code::GENERAL
            }
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Network { url, reason } => CliError::ConnectionFailed { url, reason },
            CoreError::Timeout { timeout_ms } => CliError::Timeout { timeout_ms },
            CoreError::DeviceRejected { message } => CliError::Rejected { message },
            CoreError::StaleDataIgnored { reason } => CliError::Rejected { message: reason },
            CoreError::ControllerStopped => CliError::ControllerStopped,
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_class() {
        let network = CliError::from(CoreError::Network {
            url: "http://bulb".into(),
            reason: "refused".into(),
        });
        assert_eq!(network.exit_code(), exit_code::CONNECTION);

        let timeout = CliError::from(CoreError::Timeout { timeout_ms: 4500 });
        assert_eq!(timeout.exit_code(), exit_code::TIMEOUT);

        let rejected = CliError::from(CoreError::DeviceRejected {
            message: "Bulb not connected".into(),
        });
        assert_eq!(rejected.exit_code(), exit_code::GENERAL);

        let missing = CliError::NoConfig {
            path: "/tmp/config.toml".into(),
        };
        assert_eq!(missing.exit_code(), exit_code::CONFIG);
    }
}
