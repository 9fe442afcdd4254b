// Wire models for both bridge route styles.
//
// The `api` style answers `/api/status` with the full state inline; the
// `bridge` style only reports `{connected}` there and serves the state from
// `/get-state`. Both wrap results in a loose `{success, error|message}`
// envelope that this module normalises.

use serde::{Deserialize, Serialize};

/// Lowest colour temperature the bulbs accept.
pub const MIN_KELVIN: u16 = 2700;
/// Highest colour temperature the bulbs accept.
pub const MAX_KELVIN: u16 = 6500;
/// Full scale of the raw device temperature register.
pub const DEVICE_SCALE: u16 = 1000;

/// Authoritative device state as reported by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    pub power: bool,
    pub kelvin: u16,
    pub brightness: u16,
}

/// Result of a status call.
///
/// `state` is only populated by route styles that return it inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReport {
    pub connected: bool,
    pub state: Option<DeviceState>,
}

/// Convert kelvin to the raw 0–1000 device register.
pub fn kelvin_to_device(kelvin: u16) -> u16 {
    let kelvin = u32::from(kelvin.clamp(MIN_KELVIN, MAX_KELVIN));
    let span = u32::from(MAX_KELVIN - MIN_KELVIN);
    let raw = (kelvin - u32::from(MIN_KELVIN)) * u32::from(DEVICE_SCALE) / span;
    u16::try_from(raw).unwrap_or(DEVICE_SCALE)
}

/// Convert the raw 0–1000 device register to kelvin.
pub fn device_to_kelvin(raw: u16) -> u16 {
    let raw = u32::from(raw.min(DEVICE_SCALE));
    let span = u32::from(MAX_KELVIN - MIN_KELVIN);
    let kelvin = u32::from(MIN_KELVIN) + raw * span / u32::from(DEVICE_SCALE);
    u16::try_from(kelvin).unwrap_or(MAX_KELVIN)
}

/// Bridges report either kelvin or the raw register; anything at or below
/// the register's full scale is taken as raw.
pub fn normalize_temperature(value: u16) -> u16 {
    if value <= DEVICE_SCALE {
        device_to_kelvin(value)
    } else {
        value
    }
}

// ── Response envelopes ──────────────────────────────────────────────

/// Generic `{success, message, error}` command envelope.
///
/// `success` is optional: some bridge builds answer a bare `{}` with 200.
#[derive(Debug, Deserialize)]
pub(crate) struct CommandResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// `GET /api/status`
#[derive(Debug, Deserialize)]
pub(crate) struct ApiStatusResponse {
    pub success: bool,
    #[serde(default)]
    pub power: Option<bool>,
    #[serde(default)]
    pub kelvin: Option<u16>,
    #[serde(default)]
    pub brightness: Option<u16>,
    #[serde(default)]
    pub error: Option<String>,
}

/// `GET /status`
#[derive(Debug, Deserialize)]
pub(crate) struct BridgeStatusResponse {
    pub connected: bool,
}

/// `GET /get-state`
#[derive(Debug, Deserialize)]
pub(crate) struct BridgeStateResponse {
    pub success: bool,
    #[serde(default)]
    pub state: Option<BridgeState>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BridgeState {
    pub power: bool,
    pub brightness: u16,
    pub temperature: u16,
}

impl From<BridgeState> for DeviceState {
    fn from(raw: BridgeState) -> Self {
        Self {
            power: raw.power,
            kelvin: normalize_temperature(raw.temperature),
            brightness: raw.brightness,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_scale_endpoints() {
        assert_eq!(kelvin_to_device(2700), 0);
        assert_eq!(kelvin_to_device(6500), 1000);
        assert_eq!(device_to_kelvin(0), 2700);
        assert_eq!(device_to_kelvin(1000), 6500);
    }

    #[test]
    fn kelvin_outside_range_is_clamped() {
        assert_eq!(kelvin_to_device(1000), 0);
        assert_eq!(kelvin_to_device(9000), 1000);
    }

    #[test]
    fn normalize_keeps_real_kelvin() {
        assert_eq!(normalize_temperature(4700), 4700);
        assert_eq!(normalize_temperature(500), 4600);
    }
}
