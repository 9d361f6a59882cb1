//! SDK information capability.
//!
//! Descriptors may bind SDK levels and version metadata indirectly, e.g.
//! `compileSdk = flutter.compileSdkVersion`. Those references are answered by
//! an [`SdkInfoProvider`] handed to the resolver, never by ambient state.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Result};

/// A property an [`SdkInfoProvider`] can supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SdkProperty {
    CompileSdkVersion,
    MinSdkVersion,
    TargetSdkVersion,
    VersionCode,
    VersionName,
    NdkVersion,
}

/// Whether a property yields a number or text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Text,
}

impl SdkProperty {
    pub const ALL: [SdkProperty; 6] = [
        SdkProperty::CompileSdkVersion,
        SdkProperty::MinSdkVersion,
        SdkProperty::TargetSdkVersion,
        SdkProperty::VersionCode,
        SdkProperty::VersionName,
        SdkProperty::NdkVersion,
    ];

    /// Property name as it appears after the provider prefix.
    pub fn key(&self) -> &'static str {
        match self {
            SdkProperty::CompileSdkVersion => "compileSdkVersion",
            SdkProperty::MinSdkVersion => "minSdkVersion",
            SdkProperty::TargetSdkVersion => "targetSdkVersion",
            SdkProperty::VersionCode => "versionCode",
            SdkProperty::VersionName => "versionName",
            SdkProperty::NdkVersion => "ndkVersion",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key() == key)
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            SdkProperty::VersionName | SdkProperty::NdkVersion => ValueKind::Text,
            _ => ValueKind::Int,
        }
    }
}

impl fmt::Display for SdkProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A value returned by [`SdkInfoProvider::get`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdkValue {
    Int(u32),
    Text(String),
}

/// Supplies SDK levels and version metadata, typically derived from the
/// enclosing framework's own configuration.
pub trait SdkInfoProvider: Send + Sync {
    fn compile_sdk_version(&self) -> Result<u32>;

    fn min_sdk_version(&self) -> Result<u32>;

    fn target_sdk_version(&self) -> Result<u32>;

    fn version_code(&self) -> Result<u32>;

    fn version_name(&self) -> Result<String>;

    /// NDK version. Providers that know nothing about the NDK may keep the default.
    fn ndk_version(&self) -> Result<String> {
        Err(Error::MissingProperty(SdkProperty::NdkVersion.key().to_string()))
    }

    /// Look up a property by name.
    fn get(&self, property: SdkProperty) -> Result<SdkValue> {
        match property {
            SdkProperty::CompileSdkVersion => self.compile_sdk_version().map(SdkValue::Int),
            SdkProperty::MinSdkVersion => self.min_sdk_version().map(SdkValue::Int),
            SdkProperty::TargetSdkVersion => self.target_sdk_version().map(SdkValue::Int),
            SdkProperty::VersionCode => self.version_code().map(SdkValue::Int),
            SdkProperty::VersionName => self.version_name().map(SdkValue::Text),
            SdkProperty::NdkVersion => self.ndk_version().map(SdkValue::Text),
        }
    }
}

/// In-memory provider with explicitly set values.
///
/// Deserializes from JSON such as `{"compileSdkVersion": 35, "versionName": "1.2.0"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StaticSdkInfo {
    pub compile_sdk_version: Option<u32>,
    pub min_sdk_version: Option<u32>,
    pub target_sdk_version: Option<u32>,
    pub version_code: Option<u32>,
    pub version_name: Option<String>,
    pub ndk_version: Option<String>,
}

impl StaticSdkInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compile_sdk_version(mut self, level: u32) -> Self {
        self.compile_sdk_version = Some(level);
        self
    }

    pub fn with_min_sdk_version(mut self, level: u32) -> Self {
        self.min_sdk_version = Some(level);
        self
    }

    pub fn with_target_sdk_version(mut self, level: u32) -> Self {
        self.target_sdk_version = Some(level);
        self
    }

    pub fn with_version_code(mut self, code: u32) -> Self {
        self.version_code = Some(code);
        self
    }

    pub fn with_version_name(mut self, name: impl Into<String>) -> Self {
        self.version_name = Some(name.into());
        self
    }

    pub fn with_ndk_version(mut self, version: impl Into<String>) -> Self {
        self.ndk_version = Some(version.into());
        self
    }
}

fn missing(property: SdkProperty) -> Error {
    Error::MissingProperty(property.key().to_string())
}

impl SdkInfoProvider for StaticSdkInfo {
    fn compile_sdk_version(&self) -> Result<u32> {
        self.compile_sdk_version
            .ok_or_else(|| missing(SdkProperty::CompileSdkVersion))
    }

    fn min_sdk_version(&self) -> Result<u32> {
        self.min_sdk_version
            .ok_or_else(|| missing(SdkProperty::MinSdkVersion))
    }

    fn target_sdk_version(&self) -> Result<u32> {
        self.target_sdk_version
            .ok_or_else(|| missing(SdkProperty::TargetSdkVersion))
    }

    fn version_code(&self) -> Result<u32> {
        self.version_code
            .ok_or_else(|| missing(SdkProperty::VersionCode))
    }

    fn version_name(&self) -> Result<String> {
        self.version_name
            .clone()
            .ok_or_else(|| missing(SdkProperty::VersionName))
    }

    fn ndk_version(&self) -> Result<String> {
        self.ndk_version
            .clone()
            .ok_or_else(|| missing(SdkProperty::NdkVersion))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_keys_round_trip() {
        for property in SdkProperty::ALL {
            assert_eq!(SdkProperty::from_key(property.key()), Some(property));
        }
        assert_eq!(SdkProperty::from_key("buildToolsVersion"), None);
        assert_eq!(SdkProperty::VersionName.kind(), ValueKind::Text);
        assert_eq!(SdkProperty::MinSdkVersion.kind(), ValueKind::Int);
    }

    #[test]
    fn test_static_provider_dispatch() {
        let info = StaticSdkInfo::new()
            .with_compile_sdk_version(35)
            .with_version_name("2.1.0");

        assert_eq!(info.get(SdkProperty::CompileSdkVersion).unwrap(), SdkValue::Int(35));
        assert_eq!(
            info.get(SdkProperty::VersionName).unwrap(),
            SdkValue::Text("2.1.0".to_string())
        );
        assert!(matches!(
            info.get(SdkProperty::MinSdkVersion),
            Err(Error::MissingProperty(p)) if p == "minSdkVersion"
        ));
    }

    #[test]
    fn test_static_provider_from_json() {
        let info: StaticSdkInfo =
            serde_json::from_str(r#"{"minSdkVersion": 21, "ndkVersion": "26.3.11579264"}"#)
                .unwrap();
        assert_eq!(info.min_sdk_version().unwrap(), 21);
        assert_eq!(info.ndk_version().unwrap(), "26.3.11579264");
        assert!(info.version_code().is_err());
    }
}
