//! `power`: switch the bulb on, off, or over.

use glowctl_core::ControllerConfig;

use crate::cli::{GlobalOpts, PowerArgs, PowerState};
use crate::commands::{Session, check_failures, status};
use crate::error::CliError;

pub async fn handle(config: ControllerConfig, args: PowerArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let flavor = config.flavor;
    let session = Session::start(config).await?;
    session.require_reachable()?;
    let url = session.url.clone();

    match args.state {
        PowerState::On => session.handle.set_power(true).await?,
        PowerState::Off => session.handle.set_power(false).await?,
        PowerState::Toggle => session.handle.toggle_power().await?,
    }

    let engine = session.finish().await?;
    check_failures(&engine)?;
    status::print_view(&status::BulbView::new(&url, flavor, &engine), global)
}
