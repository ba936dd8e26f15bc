//! Clap derive structures for the `transitplan` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// transitplan -- compile hub-and-spoke transit routing plans
#[derive(Debug, Parser)]
#[command(
    name = "transitplan",
    version,
    about = "Compile hub-and-spoke transit routing topologies into route-table plans",
    long_about = "Compiles a declarative hub-and-spoke topology into an ordered plan of\n\
        route-table associations, propagations and static routes.\n\n\
        Every plan is checked first: inspected spokes can only reach the rest of\n\
        the network through the firewall segment, or no plan is emitted.",
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
    /// Config profile supplying the hub for descriptors without [hub]
    #[arg(long, short = 'p', env = "TRANSITPLAN_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Output format [default: table, or `defaults.output` from config]
    #[arg(long, short = 'o', env = "TRANSITPLAN_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: auto, or `defaults.color` from config]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one line per item (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
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
    /// Compile a topology descriptor and print the plan
    #[command(alias = "compile")]
    Plan(PlanArgs),

    /// Derive routing facts and report every consistency violation
    #[command(alias = "lint")]
    Check(DescriptorArgs),

    /// Print the routing facts derived from a descriptor
    Facts(DescriptorArgs),

    /// Print the traffic-class rule table
    Rules,

    /// Inspect the configuration
    #[command(alias = "cfg")]
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Descriptor commands ──────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DescriptorArgs {
    /// Topology descriptor (.toml, .json, .yaml or .yml)
    pub file: PathBuf,
}

#[derive(Debug, Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub descriptor: DescriptorArgs,

    /// Emit the full compilation (normalized descriptor, plan, advisories)
    /// instead of the plan alone; ignored for table and plain output
    #[arg(long)]
    pub full: bool,
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

    /// Display the effective configuration
    Show,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
