//! `status`: probe the bridge and show what the bulb reports.

use chrono::{DateTime, Utc};
use serde::Serialize;

use glowctl_core::{ApiFlavor, BrightnessScale, ControllerConfig, Engine, Health, kelvin_to_rgb, scale_rgb};

use crate::cli::GlobalOpts;
use crate::commands::Session;
use crate::error::CliError;
use crate::output::{self, DetailRow};

/// Serializable snapshot of the bulb for output.
#[derive(Debug, Serialize)]
pub struct BulbView {
    pub url: String,
    pub flavor: ApiFlavor,
    pub health: Health,
    pub power: bool,
    pub kelvin: u16,
    pub brightness: u16,
    pub brightness_percent: u16,
    pub scale: BrightnessScale,
    pub color: String,
    pub synced_at: Option<DateTime<Utc>>,
}

impl BulbView {
    pub fn new(url: &str, flavor: ApiFlavor, engine: &Engine) -> Self {
        let state = engine.state();
        let scale = engine.config().brightness_scale;
        let percent = scale.to_percent(state.brightness);
        let rgb = scale_rgb(kelvin_to_rgb(state.kelvin), if state.power { percent } else { 0 });
        Self {
            url: url.to_owned(),
            flavor,
            health: engine.health(),
            power: state.power,
            kelvin: state.kelvin,
            brightness: state.brightness,
            brightness_percent: percent,
            scale,
            color: rgb.to_hex(),
            synced_at: state.synced_at,
        }
    }

    pub fn rows(&self, color: bool) -> Vec<DetailRow> {
        let rgb = kelvin_to_rgb(self.kelvin);
        vec![
            DetailRow {
                field: "Bridge",
                value: format!("{} ({})", self.url, self.flavor),
            },
            DetailRow {
                field: "Health",
                value: self.health.to_string(),
            },
            DetailRow {
                field: "Power",
                value: output::power_label(self.power, color),
            },
            DetailRow {
                field: "Temperature",
                value: format!("{}K", self.kelvin),
            },
            DetailRow {
                field: "Brightness",
                value: match self.scale {
                    BrightnessScale::Percent => format!("{}%", self.brightness),
                    BrightnessScale::Permille => {
                        format!("{} ({}%)", self.brightness, self.brightness_percent)
                    }
                },
            },
            DetailRow {
                field: "Colour",
                value: output::swatch(&self.color, (rgb.r, rgb.g, rgb.b), color),
            },
            DetailRow {
                field: "Synced",
                value: self
                    .synced_at
                    .map_or_else(|| "never (local defaults)".into(), |t| t.to_rfc3339()),
            },
        ]
    }

    pub fn plain(&self) -> String {
        format!(
            "{}\n{}\n{}\n{}",
            self.health,
            if self.power { "on" } else { "off" },
            self.kelvin,
            self.brightness
        )
    }
}

/// Render a bulb snapshot in the selected format.
pub fn print_view(view: &BulbView, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let out = output::render_single(&global.output, view, |v| v.rows(color), BulbView::plain)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle(config: ControllerConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let flavor = config.flavor;
    let session = Session::start(config).await?;
    let url = session.url.clone();
    let reachable = session.require_reachable();
    let engine = session.finish().await?;

    print_view(&BulbView::new(&url, flavor, &engine), global)?;
    reachable
}
