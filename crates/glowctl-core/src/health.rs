// ── Connection health ──
//
// Bounded status probes plus the derived reachability signal. A probe is
// the only async piece here; classifying its outcome and folding it into
// the engine is synchronous.

use std::time::Duration;

use glowctl_api::{BulbClient, DeviceState};
use serde::Serialize;
use strum::Display;
use tracing::{debug, warn};

use crate::engine::Engine;
use crate::error::CoreError;
use crate::event::{EngineEvent, NoticeLevel};

/// Reachability of the device as last observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Health {
    /// Nothing observed yet.
    #[default]
    Unknown,
    Reachable,
    Unreachable,
    TimedOut,
}

impl Health {
    pub fn is_reachable(self) -> bool {
        self == Self::Reachable
    }
}

/// Outcome of one probe, with the device state if it could be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeReport {
    pub outcome: Health,
    pub state: Option<DeviceState>,
}

#[derive(Debug, Default)]
pub struct HealthMonitor {
    health: Health,
    probing: bool,
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn health(&self) -> Health {
        self.health
    }

    pub fn is_probing(&self) -> bool {
        self.probing
    }

    /// Returns `false` if a probe is already in flight.
    fn begin_probe(&mut self) -> bool {
        !std::mem::replace(&mut self.probing, true)
    }

    fn end_probe(&mut self) {
        self.probing = false;
    }

    /// Store an observation. Returns `true` if it changed the health.
    pub(crate) fn record(&mut self, health: Health) -> bool {
        std::mem::replace(&mut self.health, health) != health
    }
}

// ── Probe ────────────────────────────────────────────────────────

/// Check the bridge within `probe_timeout`, then try to read the full state
/// within `fetch_timeout` if the status call did not carry it.
///
/// A failed state fetch is not an error: the report just has no state.
pub async fn probe(client: &BulbClient, probe_timeout: Duration, fetch_timeout: Duration) -> ProbeReport {
    let report = match tokio::time::timeout(probe_timeout, client.status()).await {
        Err(_) => {
            warn!(timeout = ?probe_timeout, "status probe timed out");
            return ProbeReport {
                outcome: Health::TimedOut,
                state: None,
            };
        }
        Ok(Err(e)) => {
            warn!(error = %e, "status probe failed");
            let outcome = if e.is_timeout() {
                Health::TimedOut
            } else {
                Health::Unreachable
            };
            return ProbeReport {
                outcome,
                state: None,
            };
        }
        Ok(Ok(report)) => report,
    };

    if !report.connected {
        debug!("bridge reports bulb offline");
        return ProbeReport {
            outcome: Health::Unreachable,
            state: None,
        };
    }

    let state = match report.state {
        Some(state) => Some(state),
        None => match fetch_state(client, fetch_timeout).await {
            Ok(state) => Some(state),
            Err(e) => {
                debug!(error = %e, "state fetch skipped (non-fatal)");
                None
            }
        },
    };

    ProbeReport {
        outcome: Health::Reachable,
        state,
    }
}

async fn fetch_state(client: &BulbClient, fetch_timeout: Duration) -> Result<DeviceState, CoreError> {
    match tokio::time::timeout(fetch_timeout, client.fetch_state()).await {
        Ok(Ok(state)) => Ok(state),
        Ok(Err(e)) => Err(CoreError::StaleDataIgnored {
            reason: e.to_string(),
        }),
        Err(_) => Err(CoreError::StaleDataIgnored {
            reason: format!("no answer within {}ms", fetch_timeout.as_millis()),
        }),
    }
}

// ── Engine integration ───────────────────────────────────────────

impl Engine {
    pub fn health(&self) -> Health {
        self.health.health()
    }

    /// Claim the probe slot. Returns `false` if a probe is already running.
    pub fn begin_probe(&mut self) -> bool {
        self.health.begin_probe()
    }

    /// Fold a finished probe into the state. Adopts the device state when
    /// the probe returned one.
    pub fn apply_probe(&mut self, report: ProbeReport) {
        self.health.end_probe();
        self.mark(report.outcome);

        match report.outcome {
            Health::Reachable => {
                match report.state {
                    Some(state) => {
                        self.apply_authoritative(state);
                        self.notify(NoticeLevel::Success, "Connected! Using bulb state".into());
                    }
                    None => self.notify(NoticeLevel::Info, "Connected, using defaults".into()),
                }
            }
            Health::Unreachable => self.notify(NoticeLevel::Error, "Bulb offline".into()),
            Health::TimedOut => self.notify(NoticeLevel::Error, "Connection timeout".into()),
            Health::Unknown => {}
        }
    }

    /// Record an observation and publish it if it changed anything.
    pub(crate) fn mark(&mut self, health: Health) {
        self.state.connected = health.is_reachable();
        if self.health.record(health) {
            debug!(%health, "health changed");
            self.emit(EngineEvent::Health(health));
        }
    }
}
