//! Clap derive structures for the `netprobe` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// netprobe -- SD-WAN Manager inventory and one-shot device commands
#[derive(Debug, Parser)]
#[command(
    name = "netprobe",
    version,
    about = "Query SD-WAN Manager device inventories and run commands on network devices",
    long_about = "Logs in to an SD-WAN Manager (vManage), lists its devices, and runs\n\
        single commands on network devices over SSH.",
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

#[derive(Debug, Clone, Args)]
pub struct GlobalOpts {
    /// Manager profile to use
    #[arg(long, short = 'p', env = "NETPROBE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Manager URL (overrides profile)
    #[arg(long, short = 'm', env = "NETPROBE_MANAGER", global = true)]
    pub manager: Option<String>,

    /// Manager login username (overrides profile)
    #[arg(long, short = 'u', env = "NETPROBE_USERNAME", global = true)]
    pub username: Option<String>,

    /// Manager login password (prefer NETPROBE_PASSWORD or the keyring)
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Output format [default: config `defaults.output`, then plain]
    #[arg(long, short = 'o', env = "NETPROBE_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: config `defaults.color`, then auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "NETPROBE_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (default: profile, then 30)
    #[arg(long, env = "NETPROBE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

impl GlobalOpts {
    /// Output format; `plain` when neither flag nor config picked one.
    pub fn output_format(&self) -> OutputFormat {
        self.output.clone().unwrap_or(OutputFormat::Plain)
    }

    /// Color mode; `auto` when neither flag nor config picked one.
    pub fn color_mode(&self) -> ColorMode {
        self.color.clone().unwrap_or(ColorMode::Auto)
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// One line per record (default, scripting)
    Plain,
    /// Pretty table
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
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
    /// Query the manager's device inventory
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Run one command on a device over SSH
    #[command(alias = "x")]
    Exec(ExecArgs),

    /// Manage configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DEVICES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List all devices known to the manager
    #[command(alias = "ls")]
    List {
        /// Append each device's reachability to plain output
        #[arg(long, short = 'r')]
        reachability: bool,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  EXEC
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ExecArgs {
    /// Command to run on the device
    #[arg(default_value = "show version")]
    pub command: String,

    /// Named device from the config file
    #[arg(long, short = 't', conflicts_with = "host")]
    pub target: Option<String>,

    /// Device hostname or IP (ad-hoc target)
    #[arg(long, short = 'H')]
    pub host: Option<String>,

    /// SSH port
    #[arg(long)]
    pub port: Option<u16>,

    /// Device type profile (cisco_xr, cisco_ios, cisco_nxos, arista_eos, juniper_junos, linux)
    #[arg(long, short = 'd')]
    pub device_type: Option<String>,

    /// SSH username
    #[arg(long, env = "NETPROBE_SSH_USERNAME")]
    pub ssh_username: Option<String>,

    /// SSH password (prefer NETPROBE_SSH_PASSWORD or the keyring)
    #[arg(long)]
    pub ssh_password: Option<String>,

    /// Host key checking: strict, accept-new, disabled
    #[arg(long)]
    pub host_key: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration (secrets redacted)
    Show,

    /// Print the config file path
    Path,

    /// List configured manager profiles and devices
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store the active profile's password (or a device's) in the system keyring
    SetPassword {
        /// Device name instead of the manager profile
        #[arg(long)]
        device: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
