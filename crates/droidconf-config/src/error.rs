//! Descriptor resolution errors.

use std::fmt;
use thiserror::Error;

/// A 1-based position in descriptor text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed descriptor at {location}: {message}")]
    Malformed { location: Location, message: String },

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid identifier for {field}: {message}")]
    InvalidIdentifier { field: String, message: String },

    #[error("build type '{build_type}' references unknown signing config '{name}'")]
    UnresolvedSigningConfig { build_type: String, name: String },

    #[error("plugin order violation: {0}")]
    PluginOrder(String),

    #[error("SDK info provider unavailable for '{property}': {source}")]
    ProviderUnavailable {
        property: String,
        #[source]
        source: droidconf_core::Error,
    },

    #[error("{field} is {found}, expected {expected} to match targetCompatibility")]
    CompatibilityMismatch {
        field: String,
        expected: String,
        found: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub(crate) fn malformed(location: Location, message: impl Into<String>) -> Self {
        ConfigError::Malformed {
            location,
            message: message.into(),
        }
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
