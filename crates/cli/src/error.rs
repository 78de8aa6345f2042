//! CLI error types.

use std::path::PathBuf;
use thiserror::Error;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The decision file does not exist.
    #[error("decision file not found at {path}")]
    DecisionNotFound { path: PathBuf },

    /// The decision input is not valid JSON.
    #[error("invalid decision JSON: {0}")]
    InvalidDecision(serde_json::Error),

    /// Configuration is invalid or missing required fields.
    #[error("config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// The decision could not be decoded into directives.
    #[error(transparent)]
    Decode(#[from] envoyauth::Error),

    /// The response could not be written.
    #[error("failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
