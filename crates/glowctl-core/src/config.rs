// ── Runtime engine configuration ──
//
// These types describe how the engine paces itself and which value ranges
// each control accepts. They never touch disk: glowctl-config builds a
// `ControllerConfig` and hands it in.

use std::time::Duration;

use glowctl_api::{ApiFlavor, MAX_KELVIN, MIN_KELVIN};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use url::Url;

use crate::error::CoreError;
use crate::model::{Channel, ControlState, PerChannel};

/// Native brightness units of the bridge.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BrightnessScale {
    /// 1–100.
    #[default]
    Percent,
    /// 0–1000, the raw register of the `bridge` route style.
    Permille,
}

impl BrightnessScale {
    pub fn min(self) -> u16 {
        match self {
            Self::Percent => 1,
            Self::Permille => 0,
        }
    }

    pub fn max(self) -> u16 {
        match self {
            Self::Percent => 100,
            Self::Permille => 1000,
        }
    }

    /// Convert a native value to whole percent.
    pub fn to_percent(self, value: u16) -> u16 {
        match self {
            Self::Percent => value,
            Self::Permille => (value + 5) / 10,
        }
    }

    /// Convert whole percent to the native range.
    pub fn from_percent(self, percent: u16) -> u16 {
        let percent = percent.min(100);
        match self {
            Self::Percent => percent.max(1),
            Self::Permille => percent * 10,
        }
    }

    /// Default scale for a route style.
    pub fn for_flavor(flavor: ApiFlavor) -> Self {
        match flavor {
            ApiFlavor::Api => Self::Percent,
            ApiFlavor::Bridge => Self::Permille,
        }
    }
}

/// Range, significance threshold and nudge step of one control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSpec {
    pub min: u16,
    pub max: u16,
    /// Minimum delta before a value is queued or sent.
    pub threshold: u16,
    /// Keyboard nudge step.
    pub step: u16,
}

impl ChannelSpec {
    pub fn clamp(&self, value: u16) -> u16 {
        value.clamp(self.min, self.max)
    }
}

/// Pacing and ranges for the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Cadence of the per-channel flush timer.
    pub flush_interval: Duration,
    /// Cadence of animation frames.
    pub frame_interval: Duration,
    /// Fraction of the remaining distance covered per frame, in (0, 1).
    pub animation_speed: f64,
    pub brightness_scale: BrightnessScale,
    pub channels: PerChannel<ChannelSpec>,
    /// Bound on the status check.
    pub probe_timeout: Duration,
    /// Bound on the optional full-state fetch after a good probe.
    pub state_fetch_timeout: Duration,
    /// Optimistic state used until the device answers.
    pub initial: ControlState,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::for_scale(BrightnessScale::default())
    }
}

impl EngineConfig {
    pub fn for_scale(scale: BrightnessScale) -> Self {
        let kelvin = ChannelSpec {
            min: MIN_KELVIN,
            max: MAX_KELVIN,
            threshold: 50,
            step: 100,
        };
        let brightness = ChannelSpec {
            min: scale.min(),
            max: scale.max(),
            threshold: scale.from_percent(5),
            step: scale.from_percent(10),
        };

        Self {
            flush_interval: Duration::from_millis(300),
            frame_interval: Duration::from_millis(16),
            animation_speed: 0.1,
            brightness_scale: scale,
            channels: PerChannel::new(kelvin, brightness),
            probe_timeout: Duration::from_millis(4500),
            state_fetch_timeout: Duration::from_millis(5000),
            initial: ControlState {
                power: true,
                kelvin: 4500,
                brightness: scale.from_percent(50),
                connected: false,
                synced_at: None,
            },
        }
    }

    pub fn spec(&self, channel: Channel) -> &ChannelSpec {
        self.channels.get(channel)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(self.animation_speed > 0.0 && self.animation_speed < 1.0) {
            return Err(CoreError::Config {
                message: format!(
                    "animation speed must be in (0, 1), got {}",
                    self.animation_speed
                ),
            });
        }
        if self.flush_interval.is_zero() || self.frame_interval.is_zero() {
            return Err(CoreError::Config {
                message: "flush and frame intervals must be non-zero".into(),
            });
        }
        for (name, spec) in [("kelvin", &self.channels.kelvin), ("brightness", &self.channels.brightness)] {
            if spec.min >= spec.max {
                return Err(CoreError::Config {
                    message: format!("{name} range {}..{} is empty", spec.min, spec.max),
                });
            }
        }
        Ok(())
    }
}

/// Everything needed to drive one bulb through its bridge.
///
/// Built by the CLI / config layer; core never reads config files.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Bridge base URL (e.g., `http://192.168.1.20:5000`).
    pub url: Url,
    pub flavor: ApiFlavor,
    /// Transport timeout for commands.
    pub timeout: Duration,
    pub engine: EngineConfig,
}

impl ControllerConfig {
    /// Config with the route style's default brightness scale.
    pub fn new(url: Url, flavor: ApiFlavor) -> Self {
        Self {
            url,
            flavor,
            timeout: Duration::from_secs(30),
            engine: EngineConfig::for_scale(BrightnessScale::for_flavor(flavor)),
        }
    }
}
