//! Error types for droidconf capabilities.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("missing property: {0}")]
    MissingProperty(String),

    #[error("invalid value for {property}: {value}")]
    InvalidProperty { property: String, value: String },

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("unknown java version: {0}")]
    UnknownJavaVersion(String),
}

pub type Result<T> = std::result::Result<T, Error>;
