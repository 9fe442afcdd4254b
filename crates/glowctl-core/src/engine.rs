// ── Engine ──
//
// The controller context: owns the control state, both animation states,
// both value channels, every timer and the outbox. It is a synchronous
// state machine; the async driver in `controller` feeds it inputs, timer
// deadlines and command results, and ships whatever lands in the outbox.
//
// Reconciliation (`apply_authoritative`, `on_command_result`) lives in
// `reconcile.rs` and connection health in `health.rs`, as further inherent
// impls on `Engine`.

use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::animation::Interpolator;
use crate::channel::{Flushed, ValueChannel};
use crate::command::{DeviceCommand, PendingCommand};
use crate::config::EngineConfig;
use crate::error::CoreError;
use crate::event::{EngineEvent, Notice, NoticeLevel};
use crate::health::HealthMonitor;
use crate::model::{Channel, ControlState, Direction, PerChannel, Preset};
use crate::scheduler::{Task, TimerQueue};

const EVENT_CHANNEL_SIZE: usize = 1024;

/// Counters for what the engine has done since start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Raw drag samples received.
    pub samples: u64,
    /// Commands placed in the outbox.
    pub commands: u64,
    /// Commands that came back failed.
    pub failures: u64,
}

#[derive(Debug)]
pub struct Engine {
    pub(crate) config: EngineConfig,
    pub(crate) state: ControlState,
    pub(crate) animation: Interpolator,
    pub(crate) channels: PerChannel<ValueChannel>,
    /// Channels whose control is being dragged; only these feed animation
    /// frames into their value channel.
    pub(crate) held: PerChannel<bool>,
    pub(crate) timers: TimerQueue,
    pub(crate) health: HealthMonitor,
    pub(crate) stats: EngineStats,
    pub(crate) last_error: Option<CoreError>,
    outbox: Vec<PendingCommand>,
    next_command_id: u64,
    events: broadcast::Sender<EngineEvent>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let state = config.initial;
        let animation = Interpolator::new(
            config.animation_speed,
            config.frame_interval,
            state.kelvin,
            state.brightness,
        );
        let channels = PerChannel::new(
            ValueChannel::new(
                Channel::Kelvin,
                config.channels.kelvin.threshold,
                config.flush_interval,
                state.kelvin,
            ),
            ValueChannel::new(
                Channel::Brightness,
                config.channels.brightness.threshold,
                config.flush_interval,
                state.brightness,
            ),
        );
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);

        Self {
            config,
            state,
            animation,
            channels,
            held: PerChannel::default(),
            timers: TimerQueue::new(),
            health: HealthMonitor::new(),
            stats: EngineStats::default(),
            last_error: None,
            outbox: Vec::new(),
            next_command_id: 0,
            events,
        }
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub fn animation(&self) -> &Interpolator {
        &self.animation
    }

    pub fn channel(&self, channel: Channel) -> &ValueChannel {
        self.channels.get(channel)
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// The most recent command failure, if any.
    pub fn last_error(&self) -> Option<&CoreError> {
        self.last_error.as_ref()
    }

    /// Subscribe to display and notice events.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// When the next timer comes due, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// No timers are scheduled and nothing waits in the outbox.
    pub fn is_idle(&self) -> bool {
        self.timers.is_empty() && self.outbox.is_empty()
    }

    /// Hand over every command queued since the last call.
    pub fn take_outbox(&mut self) -> Vec<PendingCommand> {
        std::mem::take(&mut self.outbox)
    }

    // ── User input ───────────────────────────────────────────────

    /// A raw sample from a control being dragged.
    pub fn drag(&mut self, channel: Channel, value: u16, now: Instant) {
        let value = self.config.spec(channel).clamp(value);
        self.stats.samples += 1;
        *self.held.get_mut(channel) = true;
        trace!(%channel, value, "drag sample");
        self.set_target(channel, value, false, now);
    }

    /// The control was let go at `value`. Commits it to the device at once.
    pub fn release(&mut self, channel: Channel, value: u16, now: Instant) {
        let value = self.config.spec(channel).clamp(value);
        *self.held.get_mut(channel) = false;
        self.set_target(channel, value, false, now);

        if self.state.power {
            let flushed = self.channels.get_mut(channel).force_flush(value, &mut self.timers);
            if let Some(flushed) = flushed {
                self.enqueue_set(channel, flushed);
            }
        }
    }

    /// Keyboard-style step. Ignored while the power is off.
    pub fn nudge(&mut self, channel: Channel, direction: Direction, now: Instant) {
        if !self.state.power {
            return;
        }
        let spec = *self.config.spec(channel);
        let base = self.state.get(channel);
        let value = match direction {
            Direction::Up => base.saturating_add(spec.step),
            Direction::Down => base.saturating_sub(spec.step),
        };
        let value = spec.clamp(value);

        self.set_target(channel, value, false, now);
        self.channels.get_mut(channel).offer(value, &mut self.timers, now);
    }

    /// Animate to a preset scene and queue both values.
    pub fn apply_preset(&mut self, preset: Preset, now: Instant) {
        let kelvin = self.config.spec(Channel::Kelvin).clamp(preset.kelvin());
        let brightness = self
            .config
            .spec(Channel::Brightness)
            .clamp(self.config.brightness_scale.from_percent(preset.brightness_percent()));

        for (channel, value) in [(Channel::Kelvin, kelvin), (Channel::Brightness, brightness)] {
            *self.held.get_mut(channel) = false;
            self.set_target(channel, value, false, now);
            if self.state.power {
                self.channels.get_mut(channel).replace(value, &mut self.timers, now);
            }
        }
        self.notify(NoticeLevel::Info, format!("Applying preset {preset}..."));
    }

    /// Switch the power optimistically and queue the command.
    pub fn set_power(&mut self, on: bool) {
        let previous = self.state.power;
        self.show_power(on);
        self.notify(
            NoticeLevel::Info,
            format!("Turning {}...", if on { "ON" } else { "OFF" }),
        );
        self.enqueue(DeviceCommand::Power { on, previous });
    }

    pub fn toggle_power(&mut self) {
        self.set_power(!self.state.power);
    }

    // ── Animation ────────────────────────────────────────────────

    /// Set a channel's animation target.
    ///
    /// `immediate` snaps the display to the target without animating.
    pub fn set_target(&mut self, channel: Channel, value: u16, immediate: bool, now: Instant) {
        self.animation
            .set_target(channel, value, immediate, &mut self.timers, now);
        if immediate {
            self.show_value(channel, value);
        }
    }

    pub fn stop_animation(&mut self) {
        self.animation.stop(&mut self.timers);
    }

    // ── Timers ───────────────────────────────────────────────────

    /// Run every timer task due at `now`.
    pub fn run_due(&mut self, now: Instant) {
        while let Some((_, task)) = self.timers.pop_due(now) {
            match task {
                Task::AnimationFrame => self.on_frame(now),
                Task::Flush(channel) => self.flush(channel),
            }
        }
    }

    /// One periodic flush of a channel.
    pub fn flush(&mut self, channel: Channel) {
        if let Some(flushed) = self.channels.get_mut(channel).flush(&mut self.timers) {
            self.enqueue_set(channel, flushed);
        }
    }

    fn on_frame(&mut self, now: Instant) {
        for (channel, value) in self.animation.tick(&mut self.timers, now) {
            self.show_value(channel, value);
            if *self.held.get(channel) && self.state.power {
                self.channels
                    .get_mut(channel)
                    .offer(value, &mut self.timers, now);
            }
        }
    }

    // ── Internals shared with reconcile / health ─────────────────

    /// Stop the animation and drop every queued value and flush timer.
    pub(crate) fn power_down(&mut self) {
        self.stop_animation();
        for channel in [Channel::Kelvin, Channel::Brightness] {
            self.channels.get_mut(channel).reset(&mut self.timers);
            *self.held.get_mut(channel) = false;
        }
    }

    pub(crate) fn show_power(&mut self, on: bool) {
        self.state.power = on;
        if !on {
            self.power_down();
        }
        self.emit(EngineEvent::Power(on));
    }

    pub(crate) fn show_value(&mut self, channel: Channel, value: u16) {
        self.state.set(channel, value);
        self.emit(match channel {
            Channel::Kelvin => EngineEvent::Kelvin(value),
            Channel::Brightness => EngineEvent::Brightness(value),
        });
    }

    pub(crate) fn notify(&self, level: NoticeLevel, message: String) {
        self.emit(EngineEvent::Notice(Notice { level, message }));
    }

    pub(crate) fn emit(&self, event: EngineEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn enqueue_set(&mut self, channel: Channel, flushed: Flushed) {
        self.enqueue(DeviceCommand::Set {
            channel,
            value: flushed.value,
            previous: flushed.previous,
        });
    }

    fn enqueue(&mut self, command: DeviceCommand) {
        self.next_command_id += 1;
        self.stats.commands += 1;
        debug!(id = self.next_command_id, ?command, "command queued");
        self.outbox.push(PendingCommand {
            id: self.next_command_id,
            command,
        });
    }
}
