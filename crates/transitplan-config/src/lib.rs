//! Configuration for the transitplan CLI.
//!
//! TOML profiles that name a hub and its route tables, plus loading of
//! topology descriptor files (TOML, JSON or YAML). A descriptor without a
//! `[hub]` section takes its hub from the active profile.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use transitplan_core::{HubDescriptor, SpokeDescriptor, TopologyDescriptor};

/// Overrides the config file location.
pub const CONFIG_ENV: &str = "TRANSITPLAN_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("descriptor {} has no [hub] section and no profile is selected", path.display())]
    NoHub { path: PathBuf },

    #[error("profile '{profile}' not found in config")]
    ProfileNotFound { profile: String },

    #[error("descriptor not found: {}", path.display())]
    DescriptorNotFound { path: PathBuf },

    #[error("unsupported descriptor format: {} (expected .toml, .json, .yaml or .yml)", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("failed to read descriptor {}: {source}", path.display())]
    Descriptor {
        path: PathBuf,
        source: Box<figment::Error>,
    },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named hub profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Resolve a profile by explicit name, falling back to `default_profile`.
    ///
    /// `Ok(None)` means no name was given and the default profile does not
    /// exist; an explicitly named profile must exist.
    pub fn profile(&self, name: Option<&str>) -> Result<Option<(&str, &Profile)>, ConfigError> {
        if let Some(name) = name {
            return self
                .profiles
                .get_key_value(name)
                .map(|(k, p)| Some((k.as_str(), p)))
                .ok_or_else(|| ConfigError::ProfileNotFound {
                    profile: name.into(),
                });
        }

        Ok(self
            .default_profile
            .as_deref()
            .and_then(|name| self.profiles.get_key_value(name))
            .map(|(k, p)| (k.as_str(), p)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

/// A named hub: the route tables descriptors without `[hub]` are compiled against.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Transit gateway handle.
    #[serde(default = "default_hub_id")]
    pub hub_id: String,

    pub firewall_table: String,
    pub standard_table: String,
    pub inspection_table: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub internal_cidrs: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_supernet: Option<String>,
}

fn default_hub_id() -> String {
    "hub".into()
}

impl Profile {
    pub fn hub_descriptor(&self) -> HubDescriptor {
        HubDescriptor {
            id: self.hub_id.clone(),
            firewall_table: self.firewall_table.clone(),
            standard_table: self.standard_table.clone(),
            inspection_table: self.inspection_table.clone(),
            internal_cidrs: self.internal_cidrs.clone(),
            internal_supernet: self.internal_supernet.clone(),
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `$TRANSITPLAN_CONFIG`, else platform conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("com", "transitplan", "transitplan").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("transitplan");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from an explicit path; a missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("TRANSITPLAN_").split("__"));

    let config: Config = figment.extract()?;
    debug!(path = %path.display(), profiles = config.profiles.len(), "config loaded");
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist or is invalid.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(&config_path(), cfg)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Descriptor files ────────────────────────────────────────────────

/// A descriptor as written on disk: the hub section is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DescriptorFile {
    #[serde(default)]
    pub hub: Option<HubDescriptor>,
    #[serde(default)]
    pub spokes: Vec<SpokeDescriptor>,
}

impl DescriptorFile {
    /// Fill in the hub from a profile when the file doesn't declare one.
    pub fn resolve(
        self,
        config: &Config,
        profile: Option<&str>,
        path: &Path,
    ) -> Result<TopologyDescriptor, ConfigError> {
        let hub = match self.hub {
            Some(hub) => hub,
            None => {
                let (name, profile) =
                    config
                        .profile(profile)?
                        .ok_or_else(|| ConfigError::NoHub {
                            path: path.to_path_buf(),
                        })?;
                debug!(profile = name, "hub taken from profile");
                profile.hub_descriptor()
            }
        };
        Ok(TopologyDescriptor {
            hub,
            spokes: self.spokes,
        })
    }
}

/// Read a descriptor file, choosing the format from its extension.
pub fn load_descriptor_file(path: &Path) -> Result<DescriptorFile, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::DescriptorNotFound {
            path: path.to_path_buf(),
        });
    }

    let extension = path
        .extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase);
    let figment = match extension.as_deref() {
        Some("toml") => Figment::from(Toml::file_exact(path)),
        Some("json") => Figment::from(Json::file_exact(path)),
        Some("yaml" | "yml") => Figment::from(Yaml::file_exact(path)),
        _ => {
            return Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
    };

    let file: DescriptorFile = figment.extract().map_err(|e| ConfigError::Descriptor {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;
    debug!(path = %path.display(), spokes = file.spokes.len(), "descriptor loaded");
    Ok(file)
}

/// Load a descriptor and resolve its hub against `config`.
pub fn load_descriptor(
    path: &Path,
    config: &Config,
    profile: Option<&str>,
) -> Result<TopologyDescriptor, ConfigError> {
    load_descriptor_file(path)?.resolve(config, profile, path)
}
