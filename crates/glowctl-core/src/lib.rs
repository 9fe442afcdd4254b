// glowctl-core: Update coalescing, animation and reconciliation for smart-bulb controls

pub mod animation;
pub mod channel;
pub mod color;
pub mod command;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod event;
pub mod health;
pub mod model;
mod reconcile;
pub mod scheduler;

pub use animation::{AnimationState, CONVERGENCE_EPSILON, Interpolator};
pub use channel::{Flushed, ValueChannel};
pub use color::{Rgb, kelvin_to_rgb, scale_rgb};
pub use command::{DeviceCommand, PendingCommand};
pub use config::{BrightnessScale, ChannelSpec, ControllerConfig, EngineConfig};
pub use controller::{Controller, ControllerHandle, Input};
pub use engine::{Engine, EngineStats};
pub use error::CoreError;
pub use event::{EngineEvent, Notice, NoticeLevel};
pub use health::{Health, ProbeReport, probe};
pub use model::{Channel, ControlState, Direction, PerChannel, Preset};
pub use scheduler::{Task, TimerId, TimerQueue};

pub use glowctl_api::{ApiFlavor, DeviceState, MAX_KELVIN, MIN_KELVIN};
