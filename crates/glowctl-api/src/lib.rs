// glowctl-api: Async Rust client for smart-bulb HTTP bridges (api + bridge route styles)

pub mod client;
pub mod error;
pub mod flavor;
pub mod models;
pub mod transport;

pub use client::BulbClient;
pub use error::Error;
pub use flavor::ApiFlavor;
pub use models::{DeviceState, MAX_KELVIN, MIN_KELVIN, StatusReport};
pub use transport::TransportConfig;
