//! `preset`: apply a built-in scene.

use glowctl_core::{ControllerConfig, Preset};
use tracing::info;

use crate::cli::{GlobalOpts, PresetArgs};
use crate::commands::{Session, check_failures, status};
use crate::error::CliError;

pub async fn handle(config: ControllerConfig, args: PresetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let preset = Preset::from(args.name);
    let flavor = config.flavor;
    let session = Session::start(config).await?;
    session.require_reachable()?;
    let url = session.url.clone();

    info!(%preset, kelvin = preset.kelvin(), percent = preset.brightness_percent(), "applying preset");
    session.handle.preset(preset).await?;

    let engine = session.finish().await?;
    check_failures(&engine)?;
    status::print_view(&status::BulbView::new(&url, flavor, &engine), global)
}
