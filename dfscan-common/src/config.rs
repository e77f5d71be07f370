//! Configuration file resolution and loading
//!
//! Config file lookup follows a fixed priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. Per-user config file (`<config_dir>/<app>/config.toml`)
//! 4. Compiled defaults (fallback)
//!
//! A missing per-user file is never fatal. A file named explicitly on the
//! command line or through the environment must exist and parse.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// `--config <path>`
    CommandLine(PathBuf),
    /// Path taken from the resolver's environment variable
    Environment(PathBuf),
    /// Per-user config file that exists on disk
    UserFile(PathBuf),
    /// No file found; built-in defaults apply
    CompiledDefaults,
}

impl ConfigSource {
    /// Path of the config file, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::CommandLine(p)
            | ConfigSource::Environment(p)
            | ConfigSource::UserFile(p) => Some(p),
            ConfigSource::CompiledDefaults => None,
        }
    }

    /// True when the user asked for this file by name
    pub fn is_explicit(&self) -> bool {
        matches!(
            self,
            ConfigSource::CommandLine(_) | ConfigSource::Environment(_)
        )
    }
}

/// Resolves which config file to load for an application
#[derive(Debug, Clone)]
pub struct ConfigFileResolver {
    app_name: String,
    env_var_name: String,
}

impl ConfigFileResolver {
    /// Create a resolver for `app_name`, reading `env_var_name` for overrides
    pub fn new(app_name: impl Into<String>, env_var_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            env_var_name: env_var_name.into(),
        }
    }

    /// Resolve the config source, highest priority first
    pub fn resolve(&self, cli_arg: Option<&Path>) -> ConfigSource {
        // Priority 1: Command-line argument
        if let Some(path) = cli_arg {
            return ConfigSource::CommandLine(path.to_path_buf());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(&self.env_var_name) {
            if !path.trim().is_empty() {
                return ConfigSource::Environment(PathBuf::from(path));
            }
        }

        // Priority 3: Per-user config file
        if let Some(path) = self.user_config_path() {
            if path.exists() {
                return ConfigSource::UserFile(path);
            }
        }

        // Priority 4: Compiled defaults
        ConfigSource::CompiledDefaults
    }

    /// Platform config path for this application (may not exist)
    pub fn user_config_path(&self) -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(&self.app_name).join("config.toml"))
    }
}

/// Load a TOML config of type `T` from the resolved source
///
/// Sections omitted from the file take their `Default` values, so `T`
/// should use `#[serde(default)]` on its fields.
pub fn load_toml_config<T>(source: &ConfigSource) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = source.path() else {
        info!("No config file found, using compiled defaults");
        return Ok(T::default());
    };

    if !path.exists() {
        if source.is_explicit() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        warn!(
            "Config file {} disappeared, using compiled defaults",
            path.display()
        );
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config = parse_toml_config(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Configuration loaded from {}", path.display());
    Ok(config)
}

/// Parse a TOML document into `T`
pub fn parse_toml_config<T: DeserializeOwned>(content: &str) -> Result<T> {
    Ok(toml::from_str(content)?)
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
