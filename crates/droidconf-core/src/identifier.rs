//! Package identifiers.

use derive_more::Display;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::{Error, Result};

static SEGMENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").unwrap());

const RESERVED_WORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "false", "final", "finally",
    "float", "for", "goto", "if", "implements", "import", "instanceof", "int", "interface", "long",
    "native", "new", "null", "package", "private", "protected", "public", "return", "short",
    "static", "strictfp", "super", "switch", "synchronized", "this", "throw", "throws",
    "transient", "true", "try", "void", "volatile", "while",
];

/// A reverse-domain package name such as `com.example.app`.
///
/// Used for both the module namespace and the application id. A valid name
/// has at least two segments, every segment starts with a letter, and no
/// segment is a Java keyword.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[serde(try_from = "String", into = "String")]
#[display("{_0}")]
pub struct PackageName(String);

impl PackageName {
    /// Validate and wrap a package name.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let segments: Vec<&str> = name.split('.').collect();

        if segments.len() < 2 {
            return Err(Error::InvalidIdentifier(format!(
                "'{}' needs at least two dot-separated segments",
                name
            )));
        }

        for segment in &segments {
            if !SEGMENT_REGEX.is_match(segment) {
                return Err(Error::InvalidIdentifier(format!(
                    "'{}' has an invalid segment '{}'",
                    name, segment
                )));
            }
            if RESERVED_WORDS.contains(segment) {
                return Err(Error::InvalidIdentifier(format!(
                    "'{}' uses the reserved word '{}'",
                    name, segment
                )));
            }
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PackageName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<PackageName> for String {
    fn from(name: PackageName) -> Self {
        name.0
    }
}

impl std::str::FromStr for PackageName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}
