// Bridge HTTP client
//
// Wraps `reqwest::Client` with route-style-aware URL construction and
// envelope unwrapping. Every method returns a plain value or an `Error`;
// the `{success:false, error}` envelope never reaches the caller.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::flavor::ApiFlavor;
use crate::models::{
    ApiStatusResponse, BridgeStateResponse, BridgeStatusResponse, CommandResponse, DeviceState,
    StatusReport,
};
use crate::transport::TransportConfig;

/// HTTP client for a single bulb bridge.
///
/// Cheap to clone: the underlying `reqwest::Client` is reference counted,
/// so in-flight command futures each own a handle.
#[derive(Debug, Clone)]
pub struct BulbClient {
    http: reqwest::Client,
    base_url: Url,
    flavor: ApiFlavor,
    /// Request timeout the `reqwest::Client` was built with.
    timeout: Duration,
}

impl BulbClient {
    /// Create a new client from a `TransportConfig`.
    pub fn new(base_url: Url, flavor: ApiFlavor, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, flavor).with_request_timeout(transport.timeout))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    ///
    /// Assumes the default transport timeout; use
    /// [`with_request_timeout`](Self::with_request_timeout) if `http` was
    /// built with another one.
    pub fn with_client(http: reqwest::Client, base_url: Url, flavor: ApiFlavor) -> Self {
        Self {
            http,
            base_url,
            flavor,
            timeout: TransportConfig::default().timeout,
        }
    }

    /// Record the timeout the underlying client enforces, for error reports.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Parse a base URL string and build a client with a bare `reqwest::Client`.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client, flavor: ApiFlavor) -> Result<Self, Error> {
        Ok(Self::with_client(http, Url::parse(base_url)?, flavor))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn flavor(&self) -> ApiFlavor {
        self.flavor
    }

    pub fn request_timeout(&self) -> Duration {
        self.timeout
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Check whether the bridge can reach the bulb.
    pub async fn status(&self) -> Result<StatusReport, Error> {
        let url = self.url(self.flavor.status_path())?;
        match self.flavor {
            ApiFlavor::Api => {
                let resp: ApiStatusResponse = self.get(url).await?;
                let state = api_state(resp)?;
                Ok(StatusReport {
                    connected: true,
                    state: Some(state),
                })
            }
            ApiFlavor::Bridge => {
                let resp: BridgeStatusResponse = self.get(url).await?;
                Ok(StatusReport {
                    connected: resp.connected,
                    state: None,
                })
            }
        }
    }

    /// Read the full device state.
    pub async fn fetch_state(&self) -> Result<DeviceState, Error> {
        let url = self.url(self.flavor.state_path())?;
        match self.flavor {
            ApiFlavor::Api => {
                let resp: ApiStatusResponse = self.get(url).await?;
                api_state(resp)
            }
            ApiFlavor::Bridge => {
                let resp: BridgeStateResponse = self.get(url).await?;
                if !resp.success {
                    return Err(Error::Rejected {
                        message: resp.error.unwrap_or_else(|| "state unavailable".into()),
                    });
                }
                resp.state.map(DeviceState::from).ok_or_else(|| Error::Deserialization {
                    message: "missing `state` object".into(),
                    body: String::new(),
                })
            }
        }
    }

    /// Switch the bulb on or off. Returns the bridge's message, if any.
    pub async fn set_power(&self, on: bool) -> Result<Option<String>, Error> {
        let url = self.url(self.flavor.power_path())?;
        self.command(url, &self.flavor.power_body(on)).await
    }

    /// Set colour temperature in kelvin.
    pub async fn set_kelvin(&self, kelvin: u16) -> Result<Option<String>, Error> {
        let url = self.url(self.flavor.temperature_path())?;
        self.command(url, &self.flavor.temperature_body(kelvin)).await
    }

    /// Set brightness in the bridge's native scale.
    pub async fn set_brightness(&self, brightness: u16) -> Result<Option<String>, Error> {
        let url = self.url(self.flavor.brightness_path())?;
        self.command(url, &self.flavor.brightness_body(brightness))
            .await
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.parse_body(resp).await
    }

    async fn command(&self, url: Url, body: &Value) -> Result<Option<String>, Error> {
        debug!(%body, "POST {}", url);
        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let envelope: CommandResponse = self.parse_body(resp).await?;
        match envelope.success {
            Some(false) => Err(Error::Rejected {
                message: envelope.error.unwrap_or_else(|| "unknown error".into()),
            }),
            _ => Ok(envelope.message),
        }
    }

    /// Reject non-2xx statuses, then decode the JSON body.
    ///
    /// Bridges put the reason in `error` even on 5xx, so that field is lifted
    /// into the error message when present.
    async fn parse_body<T: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;
        decode(status, body)
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            Error::Transport(err)
        }
    }
}

fn decode<T: DeserializeOwned>(status: reqwest::StatusCode, body: String) -> Result<T, Error> {
    if !status.is_success() {
        let message = serde_json::from_str::<CommandResponse>(&body)
            .ok()
            .and_then(|e| e.error)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());
        return Err(Error::Http {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}

fn api_state(resp: ApiStatusResponse) -> Result<DeviceState, Error> {
    if !resp.success {
        return Err(Error::Rejected {
            message: resp.error.unwrap_or_else(|| "status unavailable".into()),
        });
    }
    match (resp.power, resp.kelvin, resp.brightness) {
        (Some(power), Some(kelvin), Some(brightness)) => Ok(DeviceState {
            power,
            kelvin,
            brightness,
        }),
        _ => Err(Error::Deserialization {
            message: "status is missing power, kelvin or brightness".into(),
            body: String::new(),
        }),
    }
}
