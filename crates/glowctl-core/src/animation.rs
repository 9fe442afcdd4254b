// ── Animation interpolator ──
//
// Eases each channel's displayed value toward its target with a fixed
// fraction of the remaining distance per frame. The loop is a chain of
// one-shot frame timers that stops once every channel is within
// `CONVERGENCE_EPSILON` of its target.

use std::time::Duration;

use strum::IntoEnumIterator;
use tokio::time::Instant;

use crate::model::{Channel, PerChannel};
use crate::scheduler::{Task, TimerId, TimerQueue};

/// Distance at which a channel counts as settled, in native units for
/// every channel.
pub const CONVERGENCE_EPSILON: f64 = 0.5;

/// Per-channel target and continuously converging current value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationState {
    pub target: f64,
    pub current: f64,
}

impl AnimationState {
    pub fn at(value: u16) -> Self {
        let value = f64::from(value);
        Self {
            target: value,
            current: value,
        }
    }

    pub fn delta(&self) -> f64 {
        self.target - self.current
    }

    pub fn is_settled(&self) -> bool {
        self.delta().abs() <= CONVERGENCE_EPSILON
    }

    /// `current` rounded for display and transmission.
    pub fn rounded(&self) -> u16 {
        round_to_u16(self.current)
    }

    /// Advance one frame. Returns the new rounded value if `current` moved.
    fn step(&mut self, speed: f64) -> Option<u16> {
        if self.is_settled() {
            return None;
        }
        self.current += self.delta() * speed;
        Some(self.rounded())
    }
}

/// Drives both channels' [`AnimationState`] from a single frame loop.
#[derive(Debug)]
pub struct Interpolator {
    speed: f64,
    frame_interval: Duration,
    states: PerChannel<AnimationState>,
    frame: Option<TimerId>,
}

impl Interpolator {
    pub fn new(speed: f64, frame_interval: Duration, kelvin: u16, brightness: u16) -> Self {
        Self {
            speed,
            frame_interval,
            states: PerChannel::new(AnimationState::at(kelvin), AnimationState::at(brightness)),
            frame: None,
        }
    }

    pub fn state(&self, channel: Channel) -> &AnimationState {
        self.states.get(channel)
    }

    /// Whether a frame is scheduled.
    pub fn is_running(&self) -> bool {
        self.frame.is_some()
    }

    /// Point a channel at a new target.
    ///
    /// `immediate` snaps `current` to the target without touching the frame
    /// loop; otherwise the loop is started if it is not already running.
    pub fn set_target(
        &mut self,
        channel: Channel,
        value: u16,
        immediate: bool,
        timers: &mut TimerQueue,
        now: Instant,
    ) {
        if immediate {
            self.snap(channel, value);
            return;
        }
        self.states.get_mut(channel).target = f64::from(value);
        if self.frame.is_none() {
            self.frame = Some(timers.schedule_once(now, self.frame_interval, Task::AnimationFrame));
        }
    }

    /// Put both `target` and `current` at `value`.
    pub fn snap(&mut self, channel: Channel, value: u16) {
        *self.states.get_mut(channel) = AnimationState::at(value);
    }

    /// Run one frame. Returns every channel whose rounded value was
    /// republished, and reschedules itself while anything is unsettled.
    pub fn tick(&mut self, timers: &mut TimerQueue, now: Instant) -> Vec<(Channel, u16)> {
        self.frame = None;

        let speed = self.speed;
        let moved: Vec<(Channel, u16)> = Channel::iter()
            .filter_map(|ch| self.states.get_mut(ch).step(speed).map(|v| (ch, v)))
            .collect();

        if Channel::iter().any(|ch| !self.states.get(ch).is_settled()) {
            self.frame = Some(timers.schedule_once(now, self.frame_interval, Task::AnimationFrame));
        }

        moved
    }

    /// Cancel the frame loop. Safe to call when nothing is running.
    pub fn stop(&mut self, timers: &mut TimerQueue) {
        if let Some(id) = self.frame.take() {
            timers.cancel(id);
        }
    }
}

fn round_to_u16(value: f64) -> u16 {
    let rounded = value.round().clamp(0.0, f64::from(u16::MAX));
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
    let out = rounded as u16;
    out
}
