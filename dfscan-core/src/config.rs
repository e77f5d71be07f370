//! Configuration for dfscan-core
//!
//! Layered as: config file (see [`dfscan_common::config`]) → environment
//! overrides → command-line overrides applied by the binary. Every section
//! is optional; omitted values take the built-in defaults below.

use crate::analyzers::HeuristicSettings;
use crate::fusion::FusionConfig;
use dfscan_common::config::{load_toml_config, ConfigFileResolver, ConfigSource, LoggingConfig};
use dfscan_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "DFSCAN_CONFIG";
/// Environment override for the classifier endpoint
pub const CLASSIFIER_ENDPOINT_ENV_VAR: &str = "DFSCAN_CLASSIFIER_ENDPOINT";
/// Environment override for the log level
pub const LOG_LEVEL_ENV_VAR: &str = "DFSCAN_LOG_LEVEL";

/// Complete dfscan configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DfscanConfig {
    pub logging: LoggingConfig,
    pub analysis: AnalysisSettings,
    pub classifier: ClassifierSettings,
    pub fusion: FusionConfig,
    pub heuristics: HeuristicSettings,
}

impl DfscanConfig {
    /// Resolve, load, apply environment overrides, and validate
    pub fn load(cli_config: Option<&Path>) -> Result<Self> {
        let resolver = ConfigFileResolver::new("dfscan", CONFIG_ENV_VAR);
        let source = resolver.resolve(cli_config);
        Self::load_from(&source)
    }

    /// Load from an already-resolved source
    pub fn load_from(source: &ConfigSource) -> Result<Self> {
        let mut config: DfscanConfig = load_toml_config(source)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `DFSCAN_*` environment overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(endpoint) = std::env::var(CLASSIFIER_ENDPOINT_ENV_VAR) {
            if !endpoint.trim().is_empty() {
                info!("Classifier endpoint loaded from environment variable");
                self.classifier.endpoint = Some(endpoint.trim().to_string());
            }
        }
        if let Ok(level) = std::env::var(LOG_LEVEL_ENV_VAR) {
            if !level.trim().is_empty() {
                self.logging.level = level.trim().to_string();
            }
        }
    }

    /// Reject values that would make the pipeline misbehave
    pub fn validate(&self) -> Result<()> {
        if self.analysis.analyzer_timeout_ms == 0 {
            return Err(Error::Config(
                "analysis.analyzer_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.analysis.max_image_bytes == 0 {
            return Err(Error::Config(
                "analysis.max_image_bytes must be greater than zero".to_string(),
            ));
        }
        if self.analysis.allowed_extensions.is_empty() {
            return Err(Error::Config(
                "analysis.allowed_extensions must not be empty".to_string(),
            ));
        }
        if self.classifier.timeout_ms == 0 {
            return Err(Error::Config(
                "classifier.timeout_ms must be greater than zero".to_string(),
            ));
        }
        self.fusion.validate()
    }
}

/// Image intake and per-analyzer execution limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Wall-clock budget for one analyzer on one image
    pub analyzer_timeout_ms: u64,
    /// Largest accepted file size
    pub max_image_bytes: u64,
    /// Accepted file extensions (case-insensitive, without the dot)
    pub allowed_extensions: Vec<String>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            analyzer_timeout_ms: 30_000,
            max_image_bytes: 16 * 1024 * 1024,
            allowed_extensions: vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()],
        }
    }
}

impl AnalysisSettings {
    pub fn analyzer_timeout(&self) -> Duration {
        Duration::from_millis(self.analyzer_timeout_ms)
    }
}

/// Remote classifier connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    /// Inference endpoint URL; no endpoint means no classifier
    pub endpoint: Option<String>,
    /// Request timeout
    pub timeout_ms: u64,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_ms: 60_000,
        }
    }
}

impl ClassifierSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
