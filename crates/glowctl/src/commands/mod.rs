//! Command dispatch: bridges CLI args -> controller inputs -> output formatting.

pub mod config_cmd;
pub mod glide;
pub mod power;
pub mod preset;
pub mod set;
pub mod status;

use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::debug;

use glowctl_core::{
    ControlState, Controller, ControllerConfig, ControllerHandle, Engine, EngineEvent, Health,
};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a bridge-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    config: ControllerConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(config, global).await,
        Command::Power(args) => power::handle(config, args, global).await,
        Command::Kelvin(args) => set::kelvin(config, args, global).await,
        Command::Brightness(args) => set::brightness(config, args, global).await,
        Command::Preset(args) => preset::handle(config, args, global).await,
        Command::Glide(args) => glide::handle(config, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}

// ── Session ──────────────────────────────────────────────────────────

/// A controller running on a background task for one CLI invocation.
pub struct Session {
    task: JoinHandle<Engine>,
    pub handle: ControllerHandle,
    pub health: Health,
    /// Bulb state as of the start-up probe.
    pub state: ControlState,
    pub url: String,
    probe_timeout: Duration,
}

impl Session {
    /// Spawn the controller and wait for its start-up probe.
    pub async fn start(config: ControllerConfig) -> Result<Self, CliError> {
        let url = config.url.to_string();
        let probe_timeout = config.engine.probe_timeout;
        let wait = probe_timeout + config.engine.state_fetch_timeout + Duration::from_secs(1);
        let mut state = config.engine.initial;

        let (controller, handle) = Controller::new(config)?;
        let mut events = controller.subscribe();
        let task = tokio::spawn(controller.run());

        let health = tokio::time::timeout(wait, async {
            loop {
                match events.recv().await {
                    Ok(EngineEvent::Health(health)) => return Ok(health),
                    Ok(_) | Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => return Err(CliError::ControllerStopped),
                }
            }
        })
        .await
        .map_err(|_| CliError::ControllerStopped)??;

        // The probe's state lands in the same engine step as its health.
        while let Ok(event) = events.try_recv() {
            match event {
                EngineEvent::Kelvin(kelvin) => state.kelvin = kelvin,
                EngineEvent::Brightness(brightness) => state.brightness = brightness,
                EngineEvent::Power(power) => state.power = power,
                EngineEvent::Health(_) | EngineEvent::Notice(_) => {}
            }
        }
        state.connected = health.is_reachable();
        debug!(%health, ?state, "start-up probe finished");

        Ok(Self {
            task,
            handle,
            health,
            state,
            url,
            probe_timeout,
        })
    }

    /// Fail unless the start-up probe reached the bulb.
    pub fn require_reachable(&self) -> Result<(), CliError> {
        match self.health {
            Health::Reachable => Ok(()),
            Health::TimedOut => Err(CliError::Timeout {
                timeout_ms: u64::try_from(self.probe_timeout.as_millis()).unwrap_or(u64::MAX),
            }),
            Health::Unreachable | Health::Unknown => Err(CliError::Offline {
                url: self.url.clone(),
            }),
        }
    }

    /// Close the input side and wait for every queued command to settle.
    pub async fn finish(self) -> Result<Engine, CliError> {
        drop(self.handle);
        self.task.await.map_err(|_| CliError::ControllerStopped)
    }
}

/// Turn the last command failure, if any, into the invocation's error.
pub fn check_failures(engine: &Engine) -> Result<(), CliError> {
    match engine.last_error() {
        Some(err) => Err(err.clone().into()),
        None => Ok(()),
    }
}
