//! `glide`: sweep toward a value with a simulated drag.
//!
//! Feeds evenly spaced samples to the controller as a slider drag would,
//! releases at the target, and reports how many device commands the drag
//! collapsed into.

use std::time::{Duration, Instant};

use serde::Serialize;

use glowctl_core::{Channel, ControllerConfig};

use crate::cli::{GlideArgs, GlobalOpts};
use crate::commands::{Session, check_failures};
use crate::error::CliError;
use crate::output::{self, DetailRow};

#[derive(Debug, Serialize)]
struct GlideReport {
    samples: u64,
    commands: u64,
    failures: u64,
    elapsed_ms: u128,
    kelvin: u16,
    brightness: u16,
}

impl GlideReport {
    fn rows(&self) -> Vec<DetailRow> {
        vec![
            DetailRow {
                field: "Samples",
                value: self.samples.to_string(),
            },
            DetailRow {
                field: "Commands sent",
                value: self.commands.to_string(),
            },
            DetailRow {
                field: "Failures",
                value: self.failures.to_string(),
            },
            DetailRow {
                field: "Elapsed",
                value: format!("{}ms", self.elapsed_ms),
            },
            DetailRow {
                field: "Temperature",
                value: format!("{}K", self.kelvin),
            },
            DetailRow {
                field: "Brightness",
                value: self.brightness.to_string(),
            },
        ]
    }
}

pub async fn handle(config: ControllerConfig, args: GlideArgs, global: &GlobalOpts) -> Result<(), CliError> {
    if args.kelvin.is_none() && args.brightness.is_none() {
        return Err(CliError::Validation {
            field: "glide".into(),
            reason: "give --kelvin, --brightness, or both".into(),
        });
    }
    if let Some(value) = args.brightness {
        let spec = config.engine.channels.brightness;
        if !(spec.min..=spec.max).contains(&value) {
            return Err(CliError::Validation {
                field: "brightness".into(),
                reason: format!("{value} is outside {}..={}", spec.min, spec.max),
            });
        }
    }

    let session = Session::start(config).await?;
    session.require_reachable()?;

    let targets: Vec<(Channel, u16, u16)> = [
        (Channel::Kelvin, session.state.kelvin, args.kelvin),
        (Channel::Brightness, session.state.brightness, args.brightness),
    ]
    .into_iter()
    .filter_map(|(channel, from, to)| to.map(|to| (channel, from, to)))
    .collect();

    let steps = args.steps;
    let pause = Duration::from(args.duration) / steps;
    let started = Instant::now();

    for step in 1..=steps {
        for &(channel, from, to) in &targets {
            session.handle.drag(channel, sample(from, to, step, steps)).await?;
        }
        tokio::time::sleep(pause).await;
    }
    for &(channel, _, to) in &targets {
        session.handle.release(channel, to).await?;
    }

    let engine = session.finish().await?;
    let stats = engine.stats();
    let report = GlideReport {
        samples: stats.samples,
        commands: stats.commands,
        failures: stats.failures,
        elapsed_ms: started.elapsed().as_millis(),
        kelvin: engine.state().kelvin,
        brightness: engine.state().brightness,
    };

    let out = output::render_single(&global.output, &report, GlideReport::rows, |r| {
        format!("{}\n{}", r.samples, r.commands)
    })?;
    output::print_output(&out, global.quiet);
    check_failures(&engine)
}

/// The `step`-th of `steps` evenly spaced points from `from` to `to`.
fn sample(from: u16, to: u16, step: u32, steps: u32) -> u16 {
    let from = i64::from(from);
    let span = i64::from(to) - from;
    let value = from + span * i64::from(step) / i64::from(steps.max(1));
    u16::try_from(value).unwrap_or(to)
}
