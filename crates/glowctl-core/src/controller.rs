// ── Controller ──
//
// Async driver around the engine. One task owns the `Engine` and the
// `BulbClient`; user input arrives over an mpsc channel, timers are slept
// on directly, and commands and probes run as futures polled from the same
// loop. Commands are not serialized per channel: whatever is in the outbox
// goes out at once.

use futures_util::StreamExt;
use futures_util::future::BoxFuture;
use futures_util::stream::FuturesUnordered;
use glowctl_api::{BulbClient, TransportConfig};
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::command::PendingCommand;
use crate::config::{ControllerConfig, EngineConfig};
use crate::engine::Engine;
use crate::error::CoreError;
use crate::event::EngineEvent;
use crate::health::{ProbeReport, probe};
use crate::model::{Channel, Direction, Preset};

const INPUT_CHANNEL_SIZE: usize = 256;

type CommandFuture = BoxFuture<'static, (PendingCommand, Result<Option<String>, CoreError>)>;
type ProbeFuture = BoxFuture<'static, ProbeReport>;

// ── Input ────────────────────────────────────────────────────────

/// Everything a user interface can ask of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Drag { channel: Channel, value: u16 },
    Release { channel: Channel, value: u16 },
    Nudge { channel: Channel, direction: Direction },
    Preset(Preset),
    SetPower(bool),
    TogglePower,
    /// Re-check connectivity. Ignored while a probe is running.
    Probe,
}

// ── ControllerHandle ─────────────────────────────────────────────

/// Cloneable input side of a running [`Controller`].
///
/// The controller drains and exits once every handle is dropped.
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    tx: mpsc::Sender<Input>,
    cancel: CancellationToken,
}

impl ControllerHandle {
    pub async fn send(&self, input: Input) -> Result<(), CoreError> {
        self.tx
            .send(input)
            .await
            .map_err(|_| CoreError::ControllerStopped)
    }

    pub async fn drag(&self, channel: Channel, value: u16) -> Result<(), CoreError> {
        self.send(Input::Drag { channel, value }).await
    }

    pub async fn release(&self, channel: Channel, value: u16) -> Result<(), CoreError> {
        self.send(Input::Release { channel, value }).await
    }

    pub async fn nudge(&self, channel: Channel, direction: Direction) -> Result<(), CoreError> {
        self.send(Input::Nudge { channel, direction }).await
    }

    pub async fn preset(&self, preset: Preset) -> Result<(), CoreError> {
        self.send(Input::Preset(preset)).await
    }

    pub async fn set_power(&self, on: bool) -> Result<(), CoreError> {
        self.send(Input::SetPower(on)).await
    }

    pub async fn toggle_power(&self) -> Result<(), CoreError> {
        self.send(Input::TogglePower).await
    }

    pub async fn probe(&self) -> Result<(), CoreError> {
        self.send(Input::Probe).await
    }

    /// Stop the controller without draining.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Controller ───────────────────────────────────────────────────

pub struct Controller {
    engine: Engine,
    client: BulbClient,
    inputs: mpsc::Receiver<Input>,
    cancel: CancellationToken,
}

impl Controller {
    /// Build the HTTP client from `config` and wire up a fresh engine.
    pub fn new(config: ControllerConfig) -> Result<(Self, ControllerHandle), CoreError> {
        config.engine.validate()?;
        let transport = TransportConfig::default().with_timeout(config.timeout);
        let client = BulbClient::new(config.url, config.flavor, &transport)?;
        Ok(Self::with_client(client, config.engine))
    }

    /// Drive an engine with an existing client.
    pub fn with_client(client: BulbClient, config: EngineConfig) -> (Self, ControllerHandle) {
        let (tx, inputs) = mpsc::channel(INPUT_CHANNEL_SIZE);
        let cancel = CancellationToken::new();
        let handle = ControllerHandle {
            tx,
            cancel: cancel.clone(),
        };
        let controller = Self {
            engine: Engine::new(config),
            client,
            inputs,
            cancel,
        };
        (controller, handle)
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.engine.subscribe()
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run until cancelled, or until every handle is gone and nothing is
    /// left to animate, flush or send. Returns the engine for inspection.
    pub async fn run(mut self) -> Engine {
        let mut commands: FuturesUnordered<CommandFuture> = FuturesUnordered::new();
        let mut probes: FuturesUnordered<ProbeFuture> = FuturesUnordered::new();
        let mut inputs_open = true;

        self.start_probe(&mut probes);
        info!(url = %self.client.base_url(), flavor = %self.client.flavor(), "controller started");

        loop {
            self.dispatch(&mut commands);

            if !inputs_open && commands.is_empty() && probes.is_empty() && self.engine.is_idle() {
                debug!("controller drained");
                break;
            }

            let wake = self.engine.next_deadline();

            tokio::select! {
                biased;

                () = self.cancel.cancelled() => {
                    debug!(in_flight = commands.len(), "controller cancelled");
                    break;
                }
                Some((pending, result)) = commands.next(), if !commands.is_empty() => {
                    self.engine.on_command_result(&pending, result);
                }
                Some(report) = probes.next(), if !probes.is_empty() => {
                    self.engine.apply_probe(report);
                }
                () = tokio::time::sleep_until(wake.unwrap_or_else(Instant::now)), if wake.is_some() => {
                    self.engine.run_due(Instant::now());
                }
                input = self.inputs.recv(), if inputs_open => match input {
                    Some(input) => self.handle(input, &mut probes),
                    None => inputs_open = false,
                },
            }
        }

        self.engine
    }

    fn handle(&mut self, input: Input, probes: &mut FuturesUnordered<ProbeFuture>) {
        let now = Instant::now();
        match input {
            Input::Drag { channel, value } => self.engine.drag(channel, value, now),
            Input::Release { channel, value } => self.engine.release(channel, value, now),
            Input::Nudge { channel, direction } => self.engine.nudge(channel, direction, now),
            Input::Preset(preset) => self.engine.apply_preset(preset, now),
            Input::SetPower(on) => self.engine.set_power(on),
            Input::TogglePower => self.engine.toggle_power(),
            Input::Probe => self.start_probe(probes),
        }
    }

    fn start_probe(&mut self, probes: &mut FuturesUnordered<ProbeFuture>) {
        if !self.engine.begin_probe() {
            debug!("probe already running, request ignored");
            return;
        }
        let client = self.client.clone();
        let probe_timeout = self.engine.config().probe_timeout;
        let fetch_timeout = self.engine.config().state_fetch_timeout;
        probes.push(Box::pin(async move {
            probe(&client, probe_timeout, fetch_timeout).await
        }));
    }

    fn dispatch(&mut self, commands: &mut FuturesUnordered<CommandFuture>) {
        for pending in self.engine.take_outbox() {
            debug!(id = pending.id, command = ?pending.command, "sending");
            let client = self.client.clone();
            commands.push(Box::pin(async move {
                let result = pending.command.send(&client).await;
                (pending, result)
            }));
        }
    }
}
