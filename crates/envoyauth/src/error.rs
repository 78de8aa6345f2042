//! Decision decoding error types.

use thiserror::Error;

/// Decoding and construction errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum Error {
    /// The decision root is neither a boolean nor a mapping, or is a
    /// boolean where a mapping is required.
    #[error("illegal value for policy evaluation result: {found}")]
    Shape { found: &'static str },

    /// A mapping decision without the `allowed` key.
    #[error("unable to determine evaluation result due to missing \"allowed\" key")]
    MissingAllowed,

    /// A key's value has the wrong top-level type.
    #[error("type assertion error, expected {key} value to be of type '{expected}' but got '{found}'")]
    KeyType {
        key: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    /// An element inside a list or map value has the wrong type.
    #[error("type assertion error, expected {key} element to be of type '{expected}' but got '{found}'")]
    ElementType {
        key: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    /// A numeric value outside the recognized range.
    #[error("invalid {key}: {value}")]
    Range { key: &'static str, value: String },

    /// Metadata that cannot be converted into a structured document.
    #[error("invalid dynamic metadata at {path}: {reason}")]
    Structure { path: String, reason: String },

    /// A configuration field failed validation.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Both a single revision and a revision map were supplied.
    #[error("ambiguous revision: set either revision OR revisions, not both")]
    AmbiguousRevision,

    /// Failed to parse a configuration file.
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// An I/O error occurred while reading configuration.
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
