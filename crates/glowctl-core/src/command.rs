// ── Outbound commands ──
//
// Everything the engine wants sent to the device goes through the outbox
// as a `PendingCommand`. Each one remembers the value it replaces so a
// failure can be rolled back without consulting the queue again.

use glowctl_api::BulbClient;

use crate::error::CoreError;
use crate::model::Channel;

/// A single write to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCommand {
    Power { on: bool, previous: bool },
    Set { channel: Channel, value: u16, previous: u16 },
}

impl DeviceCommand {
    /// Perform the write. Returns the bridge's message, if any.
    pub async fn send(self, client: &BulbClient) -> Result<Option<String>, CoreError> {
        let result = match self {
            Self::Power { on, .. } => client.set_power(on).await,
            Self::Set {
                channel: Channel::Kelvin,
                value,
                ..
            } => client.set_kelvin(value).await,
            Self::Set {
                channel: Channel::Brightness,
                value,
                ..
            } => client.set_brightness(value).await,
        };
        result.map_err(CoreError::from)
    }
}

/// A command waiting in, or taken from, the engine's outbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingCommand {
    pub id: u64,
    pub command: DeviceCommand,
}
