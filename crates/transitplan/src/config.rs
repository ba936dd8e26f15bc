//! CLI configuration -- thin wrapper around `transitplan_config`.
//!
//! Re-exports the shared types and adds resolution that respects
//! `GlobalOpts` flag overrides (--profile, --output, --color).

use std::path::Path;

use clap::ValueEnum;
use tracing::debug;

use transitplan_core::TopologyDescriptor;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use transitplan_config::{Config, ConfigError, config_path, load_config};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Effective settings for one invocation: flags first, then config defaults.
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub output: OutputFormat,
    pub color: bool,
    pub quiet: bool,
}

impl Settings {
    pub fn resolve(global: &GlobalOpts, config: &Config) -> Result<Self, CliError> {
        let output = match global.output {
            Some(format) => format,
            None => parse_setting::<OutputFormat>("defaults.output", &config.defaults.output)?,
        };
        let color = match global.color {
            Some(mode) => mode,
            None => parse_setting::<ColorMode>("defaults.color", &config.defaults.color)?,
        };
        Ok(Self {
            output,
            color: crate::output::should_color(color),
            quiet: global.quiet,
        })
    }
}

fn parse_setting<T: ValueEnum>(field: &str, raw: &str) -> Result<T, CliError> {
    T::from_str(raw, true).map_err(|reason| CliError::Validation {
        field: field.into(),
        reason,
    })
}

/// Load a descriptor file and fill in its hub from the selected profile.
pub fn load_descriptor(
    path: &Path,
    global: &GlobalOpts,
    config: &Config,
) -> Result<TopologyDescriptor, CliError> {
    debug!(path = %path.display(), profile = ?global.profile, "loading descriptor");
    transitplan_config::load_descriptor(path, config, global.profile.as_deref()).map_err(|err| {
        match err {
            ConfigError::ProfileNotFound { profile } => CliError::ProfileNotFound {
                name: profile,
                available: available_profiles(config),
                path: config_path().display().to_string(),
            },
            other => other.into(),
        }
    })
}

/// Sorted, comma-separated profile names, or `(none)`.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort_unstable();
    names.join(", ")
}
