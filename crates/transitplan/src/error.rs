//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use transitplan_config::ConfigError;
use transitplan_core::CoreError;
use transitplan_core::SpokeId;

/// Process exit codes. Success is `0`.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const INVALID_TOPOLOGY: i32 = 3;
    pub const VIOLATIONS: i32 = 4;
    pub const CONFIG: i32 = 5;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Topology ─────────────────────────────────────────────────────
    #[error("Inspected spokes have no inspection spoke: {inspected}")]
    #[diagnostic(
        code(transitplan::missing_inspection),
        help(
            "Declare exactly one spoke with traffic_class = \"inspection\" (the firewall segment),\n\
             or change the listed spokes to traffic_class = \"standard\"."
        )
    )]
    MissingInspection { inspected: String },

    #[error("{message}")]
    #[diagnostic(
        code(transitplan::address_conflict),
        help("Spoke CIDRs must be disjoint from each other and from the hub's internal_cidrs.")
    )]
    AddressConflict { message: String },

    #[error("{message}")]
    #[diagnostic(code(transitplan::invalid_topology))]
    InvalidTopology { message: String },

    #[error("Topology rejected with {summary}")]
    #[diagnostic(
        code(transitplan::violations),
        help("Run: transitplan check <FILE> to list every violation")
    )]
    Violations { summary: String },

    #[error("Failed to read descriptor {path}")]
    #[diagnostic(
        code(transitplan::descriptor),
        help("Each [[spokes]] entry needs id, cidr and traffic_class.\nDetails: {reason}")
    )]
    Descriptor { path: String, reason: String },

    #[error("Descriptor not found: {path}")]
    #[diagnostic(code(transitplan::descriptor_not_found))]
    DescriptorNotFound { path: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(transitplan::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(transitplan::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Add one under [profiles.<name>] in: {path}"
        )
    )]
    ProfileNotFound {
        name: String,
        available: String,
        path: String,
    },

    #[error("Descriptor {path} has no [hub] section")]
    #[diagnostic(
        code(transitplan::no_hub),
        help(
            "Add a [hub] section to the descriptor, or select a profile with --profile.\n\
             Profiles live in: {config}"
        )
    )]
    NoHub { path: String, config: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(transitplan::config))]
    Config { message: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(transitplan::io))]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(transitplan::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingInspection { .. }
            | Self::AddressConflict { .. }
            | Self::InvalidTopology { .. }
            | Self::Descriptor { .. } => exit_code::INVALID_TOPOLOGY,
            Self::Violations { .. } => exit_code::VIOLATIONS,
            Self::Validation { .. } | Self::DescriptorNotFound { .. } => exit_code::USAGE,
            Self::ProfileNotFound { .. } | Self::NoHub { .. } | Self::Config { .. } => {
                exit_code::CONFIG
            }
            Self::Io(_) | Self::Render(_) => exit_code::GENERAL,
        }
    }
}

fn join(ids: &[SpokeId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::MissingInspectionSpoke { ref inspected } => CliError::MissingInspection {
                inspected: join(inspected),
            },

            CoreError::DuplicateCidr { .. } => CliError::AddressConflict {
                message: err.to_string(),
            },

            CoreError::Rejected(report) => CliError::Violations {
                summary: report.to_string(),
            },

            CoreError::InvalidCidr { .. }
            | CoreError::DuplicateInspectionSpoke { .. }
            | CoreError::DuplicateSpoke { .. }
            | CoreError::DuplicateAttachment { .. }
            | CoreError::InspectionOnlyField { .. }
            | CoreError::DuplicateRouteTable { .. } => CliError::InvalidTopology {
                message: err.to_string(),
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        let config = transitplan_config::config_path().display().to_string();
        match err {
            ConfigError::NoHub { path } => CliError::NoHub {
                path: path.display().to_string(),
                config,
            },

            ConfigError::ProfileNotFound { profile } => CliError::ProfileNotFound {
                name: profile,
                available: "(see: transitplan config profiles)".into(),
                path: config,
            },

            ConfigError::DescriptorNotFound { path } => CliError::DescriptorNotFound {
                path: path.display().to_string(),
            },

            ConfigError::UnsupportedFormat { ref path } => CliError::Validation {
                field: "file".into(),
                reason: format!(
                    "{}: unsupported extension (expected .toml, .json, .yaml or .yml)",
                    path.display()
                ),
            },

            ConfigError::Descriptor { path, source } => CliError::Descriptor {
                path: path.display().to_string(),
                reason: source.to_string(),
            },

            ConfigError::Io(e) => CliError::Io(e),

            ConfigError::Serialization(_) | ConfigError::Figment(_) => CliError::Config {
                message: err.to_string(),
            },
        }
    }
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        ConfigError::from(err).into()
    }
}

#[cfg(test)]
mod tests {
    use transitplan_core::{ViolationReport, check::Violation};

    use super::*;

    #[test]
    fn topology_errors_exit_with_three() {
        let err = CliError::from(CoreError::MissingInspectionSpoke {
            inspected: vec!["a".into(), "b".into()],
        });
        assert_eq!(err.exit_code(), exit_code::INVALID_TOPOLOGY);
        assert_eq!(
            err.to_string(),
            "Inspected spokes have no inspection spoke: a, b"
        );
    }

    #[test]
    fn rejected_topology_exits_with_four() {
        let report = ViolationReport::new(vec![Violation::IdleInspection { spoke: "fw".into() }]);
        let err = CliError::from(CoreError::Rejected(report));
        assert_eq!(err.exit_code(), exit_code::VIOLATIONS);
    }

    #[test]
    fn missing_profile_exits_with_five() {
        let err = CliError::from(ConfigError::ProfileNotFound {
            profile: "staging".into(),
        });
        assert_eq!(err.exit_code(), exit_code::CONFIG);
    }
}
