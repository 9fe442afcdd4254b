//! Clap derive structures for the `glowctl` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use clap::{Args, Parser, Subcommand, ValueEnum};

use glowctl_core::{ApiFlavor, MAX_KELVIN, MIN_KELVIN, Preset};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// glowctl -- drive a smart bulb through its HTTP bridge
#[derive(Debug, Parser)]
#[command(
    name = "glowctl",
    version,
    about = "Control a smart bulb's colour temperature and brightness",
    long_about = "Control a smart bulb through its HTTP bridge.\n\n\
        Speaks both the `/api/*` and the bare `/status` route styles, and\n\
        coalesces rapid changes into as few device commands as possible.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Bridge profile to use
    #[arg(long, short = 'p', env = "GLOWCTL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Bridge URL (overrides profile)
    #[arg(long, short = 'u', env = "GLOWCTL_URL", global = true)]
    pub url: Option<String>,

    /// Route style of the bridge
    #[arg(long, env = "GLOWCTL_FLAVOR", value_parser = parse_flavor, global = true)]
    pub flavor: Option<ApiFlavor>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "GLOWCTL_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Command timeout in seconds
    #[arg(long, env = "GLOWCTL_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

fn parse_flavor(value: &str) -> Result<ApiFlavor, String> {
    value
        .parse()
        .map_err(|_| format!("expected 'api' or 'bridge', got '{value}'"))
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Probe the bridge and show the bulb's state
    #[command(alias = "st")]
    Status,

    /// Switch the bulb on or off
    Power(PowerArgs),

    /// Set colour temperature in kelvin
    #[command(alias = "temp", alias = "k")]
    Kelvin(KelvinArgs),

    /// Set brightness in the bridge's native scale
    #[command(alias = "b")]
    Brightness(BrightnessArgs),

    /// Apply a built-in scene
    Preset(PresetArgs),

    /// Sweep to a value with a simulated drag and report how many
    /// commands it took
    Glide(GlideArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Power ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PowerArgs {
    #[arg(value_enum)]
    pub state: PowerState,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PowerState {
    On,
    Off,
    Toggle,
}

// ── Values ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct KelvinArgs {
    /// Colour temperature (2700-6500)
    #[arg(value_parser = clap::value_parser!(u16).range(i64::from(MIN_KELVIN)..=i64::from(MAX_KELVIN)))]
    pub value: u16,
}

#[derive(Debug, Args)]
pub struct BrightnessArgs {
    /// Brightness (1-100 percent, or 0-1000 on permille bridges)
    pub value: u16,
}

#[derive(Debug, Args)]
pub struct PresetArgs {
    #[arg(value_enum)]
    pub name: PresetName,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PresetName {
    /// 2700 K, 40 %
    Warm,
    /// 4000 K, 70 %
    Neutral,
    /// 5000 K, 85 %
    Cool,
    /// 6500 K, 100 %
    Daylight,
    /// 4500 K, 100 %
    Reading,
}

impl From<PresetName> for Preset {
    fn from(name: PresetName) -> Self {
        match name {
            PresetName::Warm => Self::Warm,
            PresetName::Neutral => Self::Neutral,
            PresetName::Cool => Self::Cool,
            PresetName::Daylight => Self::Daylight,
            PresetName::Reading => Self::Reading,
        }
    }
}

#[derive(Debug, Args)]
pub struct GlideArgs {
    /// Target colour temperature
    #[arg(long, short = 'k', value_parser = clap::value_parser!(u16).range(i64::from(MIN_KELVIN)..=i64::from(MAX_KELVIN)))]
    pub kelvin: Option<u16>,

    /// Target brightness
    #[arg(long, short = 'b')]
    pub brightness: Option<u16>,

    /// How long the drag lasts
    #[arg(long, short = 'd', default_value = "2s")]
    pub duration: humantime::Duration,

    /// Number of drag samples
    #[arg(long, short = 's', default_value = "60", value_parser = clap::value_parser!(u32).range(1..=10_000))]
    pub steps: u32,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Display current resolved configuration
    Show,

    /// Create or update a profile
    Init {
        /// Bridge base URL
        #[arg(long)]
        url: String,

        /// Profile name
        #[arg(long, default_value = "default")]
        name: String,

        /// Make this the default profile
        #[arg(long)]
        set_default: bool,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
