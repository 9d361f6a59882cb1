//! Java language levels.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Result};

/// A Java language level, stored as its major version (`1.8` is `8`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JavaVersion(u8);

impl JavaVersion {
    pub const VERSION_1_8: JavaVersion = JavaVersion(8);
    pub const VERSION_11: JavaVersion = JavaVersion(11);
    pub const VERSION_17: JavaVersion = JavaVersion(17);

    pub fn new(major: u8) -> Result<Self> {
        if major == 0 {
            return Err(Error::UnknownJavaVersion(major.to_string()));
        }
        Ok(Self(major))
    }

    pub fn major(&self) -> u8 {
        self.0
    }

    /// Parse a `JavaVersion` constant name such as `VERSION_11` or `VERSION_1_8`.
    pub fn from_constant(name: &str) -> Result<Self> {
        let digits = name
            .strip_prefix("VERSION_")
            .ok_or_else(|| Error::UnknownJavaVersion(name.to_string()))?;
        let major = match digits.strip_prefix("1_") {
            Some(rest) => rest,
            None => digits,
        };
        major
            .parse::<u8>()
            .map_err(|_| Error::UnknownJavaVersion(name.to_string()))
            .and_then(Self::new)
    }

    /// Parse the textual form used by `jvmTarget` and friends: `"1.8"`, `"11"`.
    pub fn parse_version(text: &str) -> Result<Self> {
        let major = match text.strip_prefix("1.") {
            Some(rest) => rest,
            None => text,
        };
        major
            .parse::<u8>()
            .map_err(|_| Error::UnknownJavaVersion(text.to_string()))
            .and_then(Self::new)
    }

    /// The Gradle `JavaVersion` constant for this level.
    pub fn constant_name(&self) -> String {
        if self.0 <= 10 {
            format!("VERSION_1_{}", self.0)
        } else {
            format!("VERSION_{}", self.0)
        }
    }
}

impl Default for JavaVersion {
    fn default() -> Self {
        Self::VERSION_1_8
    }
}

impl fmt::Display for JavaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 <= 8 {
            write!(f, "1.{}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl std::str::FromStr for JavaVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_version(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(JavaVersion::from_constant("VERSION_11").unwrap(), JavaVersion::VERSION_11);
        assert_eq!(JavaVersion::from_constant("VERSION_1_8").unwrap(), JavaVersion::VERSION_1_8);
        assert_eq!(JavaVersion::from_constant("VERSION_1_10").unwrap().major(), 10);
        assert!(JavaVersion::from_constant("VERSION_X").is_err());
        assert!(JavaVersion::from_constant("11").is_err());
    }

    #[test]
    fn test_version_text() {
        assert_eq!("1.8".parse::<JavaVersion>().unwrap().major(), 8);
        assert_eq!("17".parse::<JavaVersion>().unwrap(), JavaVersion::VERSION_17);
        assert!("eleven".parse::<JavaVersion>().is_err());
        assert!("0".parse::<JavaVersion>().is_err());
    }

    #[test]
    fn test_display_and_constant_name() {
        assert_eq!(JavaVersion::VERSION_1_8.to_string(), "1.8");
        assert_eq!(JavaVersion::VERSION_11.to_string(), "11");
        assert_eq!(JavaVersion::VERSION_1_8.constant_name(), "VERSION_1_8");
        assert_eq!(JavaVersion::new(9).unwrap().constant_name(), "VERSION_1_9");
        assert_eq!(JavaVersion::VERSION_17.constant_name(), "VERSION_17");
    }
}
