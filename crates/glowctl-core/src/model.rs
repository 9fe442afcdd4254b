// ── Domain model ──
//
// Local, optimistic view of one bulb plus the small enums the engine is
// driven by. Values are integers in the bridge's native units.

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{Display, EnumIter, EnumString};

/// One of the two continuously adjustable controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Channel {
    Kelvin,
    Brightness,
}

/// A pair of values, one per [`Channel`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerChannel<T> {
    pub kelvin: T,
    pub brightness: T,
}

impl<T> PerChannel<T> {
    pub fn new(kelvin: T, brightness: T) -> Self {
        Self { kelvin, brightness }
    }

    pub fn get(&self, channel: Channel) -> &T {
        match channel {
            Channel::Kelvin => &self.kelvin,
            Channel::Brightness => &self.brightness,
        }
    }

    pub fn get_mut(&mut self, channel: Channel) -> &mut T {
        match channel {
            Channel::Kelvin => &mut self.kelvin,
            Channel::Brightness => &mut self.brightness,
        }
    }
}

/// Last locally known state of the bulb.
///
/// `kelvin` and `brightness` are written optimistically by user input and
/// authoritatively by reconciliation; they always hold the latest of the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ControlState {
    pub power: bool,
    pub kelvin: u16,
    pub brightness: u16,
    pub connected: bool,
    /// When the state was last overwritten from the device.
    pub synced_at: Option<DateTime<Utc>>,
}

impl ControlState {
    pub fn get(&self, channel: Channel) -> u16 {
        match channel {
            Channel::Kelvin => self.kelvin,
            Channel::Brightness => self.brightness,
        }
    }

    pub fn set(&mut self, channel: Channel, value: u16) {
        match channel {
            Channel::Kelvin => self.kelvin = value,
            Channel::Brightness => self.brightness = value,
        }
    }
}

/// Step direction for keyboard-style nudges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Built-in scenes. Brightness is expressed in percent and scaled to the
/// bridge's native range when applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumIter, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Preset {
    Warm,
    Neutral,
    Cool,
    Daylight,
    Reading,
}

impl Preset {
    pub fn kelvin(self) -> u16 {
        match self {
            Self::Warm => 2700,
            Self::Neutral => 4000,
            Self::Cool => 5000,
            Self::Reading => 4500,
            Self::Daylight => 6500,
        }
    }

    pub fn brightness_percent(self) -> u16 {
        match self {
            Self::Warm => 40,
            Self::Neutral => 70,
            Self::Cool => 85,
            Self::Daylight | Self::Reading => 100,
        }
    }
}
