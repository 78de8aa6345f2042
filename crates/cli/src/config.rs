//! Configuration loading from envoyauth.toml.

use envoyauth::ResultConfig;
use serde::Deserialize;
use std::path::Path;
use tracing::Level;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Settings applied to every decoded decision.
    #[serde(default)]
    pub decision: ResultConfig,

    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Maximum level: error, warn, info, debug or trace.
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.decision.validate()?;
        Ok(config)
    }

    /// The configured log level.
    pub fn log_level(&self) -> Result<Level, ConfigError> {
        self.log
            .level
            .parse()
            .map_err(|_| ConfigError::InvalidLevel(self.log.level.clone()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid log level '{0}': expected error, warn, info, debug or trace")]
    InvalidLevel(String),

    #[error(transparent)]
    Decision(#[from] envoyauth::Error),
}
