// ── Engine events ──
//
// The engine's only output port besides the outbox. Renderers and
// notifiers subscribe to the broadcast channel and redraw from these.

use serde::Serialize;

use crate::health::Health;

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Toast-style message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum EngineEvent {
    /// Displayed colour temperature changed.
    Kelvin(u16),
    /// Displayed brightness changed.
    Brightness(u16),
    Power(bool),
    Health(Health),
    Notice(Notice),
}
