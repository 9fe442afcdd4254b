//! `kelvin` and `brightness`: commit a single value.

use glowctl_core::{Channel, ControllerConfig};

use crate::cli::{BrightnessArgs, GlobalOpts, KelvinArgs};
use crate::commands::{Session, check_failures, status};
use crate::error::CliError;

pub async fn kelvin(config: ControllerConfig, args: KelvinArgs, global: &GlobalOpts) -> Result<(), CliError> {
    commit(config, Channel::Kelvin, args.value, global).await
}

pub async fn brightness(
    config: ControllerConfig,
    args: BrightnessArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let spec = config.engine.channels.brightness;
    if !(spec.min..=spec.max).contains(&args.value) {
        return Err(CliError::Validation {
            field: "brightness".into(),
            reason: format!(
                "{} is outside {}..={} for a {} bridge",
                args.value, spec.min, spec.max, config.engine.brightness_scale
            ),
        });
    }
    commit(config, Channel::Brightness, args.value, global).await
}

/// Release the control at `value`, as a slider would on mouse-up.
async fn commit(
    config: ControllerConfig,
    channel: Channel,
    value: u16,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let flavor = config.flavor;
    let session = Session::start(config).await?;
    session.require_reachable()?;
    let url = session.url.clone();

    session.handle.release(channel, value).await?;
    let engine = session.finish().await?;
    check_failures(&engine)?;

    if engine.stats().commands == 0 && !global.quiet {
        if engine.state().power {
            eprintln!("{channel} already at {value}, nothing sent");
        } else {
            eprintln!("Bulb is off, {channel} not sent");
        }
    }
    status::print_view(&status::BulbView::new(&url, flavor, &engine), global)
}
