// ── State reconciliation ──
//
// Two ways local state gets corrected: adopting the device's own state
// after a probe, and undoing an optimistic change whose command failed.
// Rollback restores the value captured when the command was queued, even if
// newer local changes landed since.

use chrono::Utc;
use glowctl_api::DeviceState;
use tracing::{debug, info, warn};

use crate::command::{DeviceCommand, PendingCommand};
use crate::engine::Engine;
use crate::error::CoreError;
use crate::event::NoticeLevel;
use crate::health::Health;
use crate::model::Channel;

impl Engine {
    /// Overwrite local state with the device's. Values snap without
    /// animating and each channel's `last_sent` is aligned, so the next
    /// flush has nothing to correct.
    pub fn apply_authoritative(&mut self, device: DeviceState) {
        info!(
            power = device.power,
            kelvin = device.kelvin,
            brightness = device.brightness,
            "adopting device state"
        );

        self.stop_animation();
        for (channel, value) in [
            (Channel::Kelvin, device.kelvin),
            (Channel::Brightness, device.brightness),
        ] {
            let value = self.config.spec(channel).clamp(value);
            *self.held.get_mut(channel) = false;
            let ch = self.channels.get_mut(channel);
            ch.reset(&mut self.timers);
            ch.sync(value);
            self.animation.snap(channel, value);
            self.show_value(channel, value);
        }
        self.show_power(device.power);

        self.state.synced_at = Some(Utc::now());
        self.mark(Health::Reachable);
    }

    /// Settle a command the driver finished sending.
    pub fn on_command_result(&mut self, pending: &PendingCommand, result: Result<Option<String>, CoreError>) {
        match result {
            Ok(message) => {
                debug!(id = pending.id, command = ?pending.command, "command acknowledged");
                self.mark(Health::Reachable);
                let message = message.unwrap_or_else(|| describe(pending.command));
                self.notify(NoticeLevel::Success, message);
            }
            Err(e) => {
                self.stats.failures += 1;
                let health = if matches!(e, CoreError::Timeout { .. }) {
                    Health::TimedOut
                } else {
                    Health::Unreachable
                };
                self.mark(health);

                if e.triggers_rollback() {
                    warn!(id = pending.id, command = ?pending.command, error = %e, "command failed, rolling back");
                    self.roll_back(pending.command);
                } else {
                    warn!(id = pending.id, command = ?pending.command, error = %e, "command failed");
                }
                self.notify(NoticeLevel::Error, format!("{} failed: {e}", label(pending.command)));
                self.last_error = Some(e);
            }
        }
    }

    fn roll_back(&mut self, command: DeviceCommand) {
        match command {
            DeviceCommand::Power { previous, .. } => self.show_power(previous),
            DeviceCommand::Set {
                channel, previous, ..
            } => {
                self.channels.get_mut(channel).sync(previous);
                self.animation.snap(channel, previous);
                self.show_value(channel, previous);
            }
        }
    }
}

fn label(command: DeviceCommand) -> &'static str {
    match command {
        DeviceCommand::Power { .. } => "Power control",
        DeviceCommand::Set {
            channel: Channel::Kelvin,
            ..
        } => "Temperature control",
        DeviceCommand::Set {
            channel: Channel::Brightness,
            ..
        } => "Brightness control",
    }
}

fn describe(command: DeviceCommand) -> String {
    match command {
        DeviceCommand::Power { on, .. } => format!("Power {}", if on { "ON" } else { "OFF" }),
        DeviceCommand::Set {
            channel: Channel::Kelvin,
            value,
            ..
        } => format!("Temperature set to {value}K"),
        DeviceCommand::Set {
            channel: Channel::Brightness,
            value,
            ..
        } => format!("Brightness set to {value}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use tokio::time::Instant;

    use super::*;
    use crate::config::EngineConfig;
    use crate::event::EngineEvent;

    fn rejected() -> CoreError {
        CoreError::DeviceRejected {
            message: "Bulb not connected".into(),
        }
    }

    #[test]
    fn authoritative_state_leaves_nothing_to_flush() {
        let mut engine = Engine::new(EngineConfig::default());
        let now = Instant::now();

        engine.nudge(Channel::Kelvin, crate::model::Direction::Up, now);
        engine.apply_authoritative(DeviceState {
            power: true,
            kelvin: 5000,
            brightness: 70,
        });
        engine.flush(Channel::Kelvin);
        engine.flush(Channel::Brightness);
        engine.run_due(now + Duration::from_secs(1));

        assert!(engine.take_outbox().is_empty());
        assert_eq!(engine.channel(Channel::Kelvin).last_sent(), 5000);
        assert_eq!(engine.channel(Channel::Brightness).last_sent(), 70);
        assert_eq!(engine.animation().state(Channel::Kelvin).current, 5000.0);
        assert!(engine.state().synced_at.is_some());
    }

    #[test]
    fn failed_brightness_rolls_back() {
        let mut engine = Engine::new(EngineConfig::default());
        let now = Instant::now();

        engine.release(Channel::Brightness, 80, now);
        let outbox = engine.take_outbox();
        let pending = outbox.first().unwrap();
        assert_eq!(
            pending.command,
            DeviceCommand::Set {
                channel: Channel::Brightness,
                value: 80,
                previous: 50
            }
        );

        let mut rx = engine.subscribe();
        engine.on_command_result(pending, Err(rejected()));

        assert_eq!(engine.state().brightness, 50);
        assert_eq!(engine.channel(Channel::Brightness).last_sent(), 50);
        assert_eq!(engine.health(), Health::Unreachable);
        assert_eq!(engine.stats().failures, 1);
        assert!(matches!(engine.last_error(), Some(CoreError::DeviceRejected { .. })));
        let events: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert!(events.contains(&EngineEvent::Brightness(50)));
        assert!(events.iter().any(|e| matches!(e, EngineEvent::Notice(n) if n.level == NoticeLevel::Error)));
    }

    #[test]
    fn every_command_error_is_counted() {
        let mut engine = Engine::new(EngineConfig::default());
        let now = Instant::now();

        engine.release(Channel::Kelvin, 6000, now);
        let pending = engine.take_outbox().remove(0);
        engine.on_command_result(
            &pending,
            Err(CoreError::StaleDataIgnored {
                reason: "late".into(),
            }),
        );

        assert_eq!(engine.stats().failures, 1);
        assert_eq!(engine.health(), Health::Unreachable);
        assert_eq!(engine.channel(Channel::Kelvin).last_sent(), 6000);
        assert!(matches!(engine.last_error(), Some(CoreError::StaleDataIgnored { .. })));
    }

    #[test]
    fn rollback_wins_over_newer_local_change() {
        let mut engine = Engine::new(EngineConfig::default());
        let now = Instant::now();

        engine.release(Channel::Kelvin, 3000, now);
        let first = engine.take_outbox().remove(0);
        engine.release(Channel::Kelvin, 6000, now);
        engine.take_outbox();

        engine.on_command_result(&first, Err(CoreError::Timeout { timeout_ms: 30_000 }));

        assert_eq!(engine.state().kelvin, 4500);
        assert_eq!(engine.health(), Health::TimedOut);
    }

    #[test]
    fn failed_power_on_reverts_to_off() {
        let mut engine = Engine::new(EngineConfig::default());
        engine.set_power(false);
        engine.take_outbox();

        engine.set_power(true);
        let pending = engine.take_outbox().remove(0);
        engine.on_command_result(
            &pending,
            Err(CoreError::Network {
                url: "http://bulb".into(),
                reason: "connection refused".into(),
            }),
        );

        assert!(!engine.state().power);
        assert!(engine.next_deadline().is_none());
    }

    #[test]
    fn success_marks_reachable_and_keeps_value() {
        let mut engine = Engine::new(EngineConfig::default());
        engine.mark(Health::Unreachable);
        engine.release(Channel::Kelvin, 3000, Instant::now());
        let pending = engine.take_outbox().remove(0);

        engine.on_command_result(&pending, Ok(Some("Temperature set".into())));

        assert_eq!(engine.health(), Health::Reachable);
        assert!(engine.state().connected);
        assert_eq!(engine.channel(Channel::Kelvin).last_sent(), 3000);
    }
}
