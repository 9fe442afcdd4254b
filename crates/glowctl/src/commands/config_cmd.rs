//! Config subcommand handlers.

use serde::Serialize;

use glowctl_config::Profile;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct ResolvedProfile<'a> {
    name: &'a str,
    #[serde(flatten)]
    profile: &'a Profile,
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        // ── Show: the whole file, defaults filled in ────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = match global.output {
                OutputFormat::Json => output::render_json_pretty(&cfg)?,
                OutputFormat::JsonCompact => output::render_json_compact(&cfg)?,
                OutputFormat::Table | OutputFormat::Plain => {
                    let mut lines = vec![format!(
                        "default_profile = {}",
                        cfg.default_profile.as_deref().unwrap_or("(none)")
                    )];
                    for (name, profile) in &cfg.profiles {
                        let resolved = ResolvedProfile { name, profile };
                        lines.push(output::render_json_compact(&resolved)?);
                    }
                    lines.join("\n")
                }
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Init: write or update a profile ─────────────────────────
        ConfigCommand::Init {
            url,
            name,
            set_default,
        } => {
            url.parse::<url::Url>().map_err(|e| CliError::Validation {
                field: "url".into(),
                reason: format!("{url}: {e}"),
            })?;

            let mut cfg = config::load_config_or_default();
            let profile = Profile::new(url, global.flavor.unwrap_or_default());
            cfg.profiles.insert(name.clone(), profile);
            if set_default || cfg.profiles.len() == 1 {
                cfg.default_profile = Some(name.clone());
            }
            config::save_config(&cfg)?;

            if !global.quiet {
                eprintln!(
                    "Saved profile '{name}' to {}",
                    config::config_path().display()
                );
            }
            Ok(())
        }
    }
}
