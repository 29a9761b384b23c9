//! Clap derive structures for the `sitewatch` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// sitewatch -- route to and monitor a fleet of remote sites
#[derive(Debug, Parser)]
#[command(
    name = "sitewatch",
    version,
    about = "Route to and monitor a fleet of remote video-management sites",
    long_about = "Polls every reachable site's device inventory, diffs it against the\n\
        last persisted snapshot, and announces devices that come back online.\n\n\
        Sites are reached through the global directory, a direct address,\n\
        or a relay host, with the matching credential for each path.",
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
    /// Profile to use
    #[arg(long, short = 'p', env = "SITEWATCH_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "SITEWATCH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Global directory URL (overrides profile)
    #[arg(long, env = "SITEWATCH_DIRECTORY_URL", global = true)]
    pub directory_url: Option<String>,

    /// Directory bearer token (overrides env, keyring, and profile)
    #[arg(long, env = "SITEWATCH_DIRECTORY_TOKEN", global = true, hide_env = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SITEWATCH_OUTPUT",
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

    /// Log line format
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "SITEWATCH_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "SITEWATCH_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
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
    /// YAML
    Yaml,
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

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the monitor loop until interrupted
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Run a single monitor cycle and print its report
    Poll(PollArgs),

    /// List sites known to the directory
    #[command(alias = "s")]
    Sites,

    /// List the devices of one site
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Show how a site identifier is routed and authenticated
    Route(RouteArgs),

    /// Inspect CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Monitor ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Poll interval, e.g. "10s" (overrides profile)
    #[arg(long, value_parser = humantime::parse_duration)]
    pub interval: Option<std::time::Duration>,
}

#[derive(Debug, Args)]
pub struct PollArgs {
    /// Also list per-site results
    #[arg(long)]
    pub sites: bool,
}

// ── Sites & devices ──────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    /// Site id, address, or relay identifier
    pub site: String,
}

#[derive(Debug, Args)]
pub struct RouteArgs {
    /// Site id, address, or relay identifier
    pub site: String,

    /// Endpoint path to route
    #[arg(long, default_value = "/rest/v3/devices")]
    pub path: String,
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
    /// Show the effective config (secrets redacted)
    Show,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
