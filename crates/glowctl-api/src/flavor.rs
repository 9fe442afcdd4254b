use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use strum::{Display, EnumString};

/// Route style spoken by the bridge.
///
/// Both styles expose the same three commands and a status check; they
/// differ in paths, field names, and whether status carries the full state.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ApiFlavor {
    /// `/api/status`, `/api/power {power}`, `/api/temperature {kelvin}`.
    #[default]
    Api,
    /// `/status`, `/get-state`, `/power {state}`, `/temperature {temperature}`.
    Bridge,
}

impl ApiFlavor {
    pub(crate) fn status_path(self) -> &'static str {
        match self {
            Self::Api => "api/status",
            Self::Bridge => "status",
        }
    }

    pub(crate) fn state_path(self) -> &'static str {
        match self {
            Self::Api => "api/status",
            Self::Bridge => "get-state",
        }
    }

    pub(crate) fn power_path(self) -> &'static str {
        match self {
            Self::Api => "api/power",
            Self::Bridge => "power",
        }
    }

    pub(crate) fn temperature_path(self) -> &'static str {
        match self {
            Self::Api => "api/temperature",
            Self::Bridge => "temperature",
        }
    }

    pub(crate) fn brightness_path(self) -> &'static str {
        match self {
            Self::Api => "api/brightness",
            Self::Bridge => "brightness",
        }
    }

    pub(crate) fn power_body(self, on: bool) -> Value {
        match self {
            Self::Api => json!({ "power": on }),
            Self::Bridge => json!({ "state": on }),
        }
    }

    pub(crate) fn temperature_body(self, kelvin: u16) -> Value {
        match self {
            Self::Api => json!({ "kelvin": kelvin }),
            Self::Bridge => json!({ "temperature": kelvin }),
        }
    }

    pub(crate) fn brightness_body(self, brightness: u16) -> Value {
        json!({ "brightness": brightness })
    }
}
