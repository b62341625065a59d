use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use mailprobe_common::{
    config::{Target, apply_password_overrides_with, validate_targets},
    error::ConfigError,
};
use mailprobe_health::HealthConfig;
use mailprobe_metrics::MetricsConfig;
use serde::Deserialize;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "MAILPROBE_CONFIG";

/// Locations tried, in order, when [`CONFIG_ENV`] is not set.
pub const DEFAULT_CONFIG_PATHS: [&str; 2] = [
    "./mailprobe.config.ron",
    "/etc/mailprobe/mailprobe.config.ron",
];

const fn default_shutdown_timeout_secs() -> u64 {
    30
}

/// Everything read from the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    pub targets: Vec<Target>,

    #[serde(default)]
    pub health: HealthConfig,

    #[serde(default)]
    pub metrics: MetricsSettings,

    /// Upper bound on the whole shutdown sequence
    ///
    /// Default: 30 seconds
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MetricsSettings {
    #[serde(default)]
    pub otlp: MetricsConfig,
}

impl Config {
    /// Read, apply password overrides from the environment and validate.
    ///
    /// # Errors
    ///
    /// The file cannot be read or parsed, or a target is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// [`Config::load`] with an explicit secret lookup.
    ///
    /// # Errors
    ///
    /// The file cannot be read or parsed, or a target is invalid.
    pub fn load_with<F>(path: &Path, secrets: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content, path, secrets)
    }

    /// [`Config::load`] for already read content and an explicit secret
    /// lookup.
    ///
    /// # Errors
    ///
    /// The content is not valid RON for this structure, or a target is
    /// invalid.
    pub fn parse<F>(content: &str, path: &Path, secrets: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: Self = ron::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        apply_password_overrides_with(&mut config.targets, secrets);
        validate_targets(&config.targets)?;

        Ok(config)
    }

    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// Find the configuration file using the following precedence:
/// 1. `MAILPROBE_CONFIG` environment variable
/// 2. ./mailprobe.config.ron (current working directory)
/// 3. /etc/mailprobe/mailprobe.config.ron (system-wide config)
///
/// # Errors
///
/// `MAILPROBE_CONFIG` names a missing file, or none of the defaults exist.
pub fn find_config_file() -> anyhow::Result<PathBuf> {
    let defaults: Vec<PathBuf> = DEFAULT_CONFIG_PATHS.iter().map(PathBuf::from).collect();
    find_config_file_in(std::env::var_os(CONFIG_ENV).map(PathBuf::from), &defaults)
}

/// [`find_config_file`] with the environment value and default locations
/// supplied by the caller.
///
/// # Errors
///
/// See [`find_config_file`].
pub fn find_config_file_in(
    from_env: Option<PathBuf>,
    defaults: &[PathBuf],
) -> anyhow::Result<PathBuf> {
    if let Some(path) = from_env {
        if path.exists() {
            return Ok(path);
        }
        anyhow::bail!("{CONFIG_ENV} points to non-existent file: {}", path.display());
    }

    if let Some(path) = defaults.iter().find(|path| path.exists()) {
        return Ok(path.clone());
    }

    let paths_tried = defaults
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    anyhow::bail!(
        "No configuration file found. Tried:\n  - {CONFIG_ENV} environment variable\n{paths_tried}"
    )
}
