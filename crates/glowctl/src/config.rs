//! CLI glue over `glowctl-config`: applies global flag overrides to the
//! selected profile and builds a `glowctl_core::ControllerConfig`.

use glowctl_config::{Config, ConfigError, Profile, profile_to_controller_config};
use glowctl_core::ControllerConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use glowctl_config::{config_path, load_config_or_default, save_config};

/// Resolve the profile for this invocation, or build one from `--url`.
pub fn resolve_profile(global: &GlobalOpts, cfg: &Config) -> Result<Profile, CliError> {
    let mut profile = match cfg.profile(global.profile.as_deref()) {
        Ok((_, profile)) => profile.clone(),
        // An explicitly named profile must exist.
        Err(ConfigError::UnknownProfile { profile: name }) if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name,
                available: available_profiles(cfg),
            });
        }
        Err(_) => {
            let url = global.url.as_deref().ok_or_else(|| CliError::NoConfig {
                path: config_path().display().to_string(),
            })?;
            Profile::new(url, global.flavor.unwrap_or_default())
        }
    };

    if let Some(ref url) = global.url {
        profile.url.clone_from(url);
    }
    if let Some(flavor) = global.flavor {
        profile.flavor = flavor;
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
    Ok(profile)
}

/// Build a `ControllerConfig` from the config file, profile, and CLI overrides.
pub fn build_controller_config(global: &GlobalOpts) -> Result<ControllerConfig, CliError> {
    let cfg = load_config_or_default();
    let profile = resolve_profile(global, &cfg)?;
    Ok(profile_to_controller_config(&profile, &cfg.defaults)?)
}

fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}
