//! SDK info backed by a Flutter `local.properties` file.
//!
//! The Flutter tool writes `flutter.versionCode`, `flutter.versionName` and
//! friends into `android/local.properties`. Keys missing from the file fall
//! back to the framework defaults below.

use droidconf_core::{Error, Result, SdkInfoProvider, SdkProperty};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, warn};

pub const DEFAULT_COMPILE_SDK_VERSION: u32 = 35;
pub const DEFAULT_MIN_SDK_VERSION: u32 = 21;
pub const DEFAULT_TARGET_SDK_VERSION: u32 = 35;
pub const DEFAULT_VERSION_CODE: u32 = 1;
pub const DEFAULT_VERSION_NAME: &str = "1.0";
pub const DEFAULT_NDK_VERSION: &str = "26.3.11579264";

// `key=value`, `key: value` or `key value`; keys may contain escaped separators.
static PROPERTY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?:\\.|[^=:\s\\])+)\s*[=:]?\s*(.*?)\s*$").unwrap()
});

/// [`SdkInfoProvider`] reading `flutter.*` keys from `local.properties`.
#[derive(Debug, Clone, Default)]
pub struct LocalPropertiesProvider {
    properties: HashMap<String, String>,
    /// Why the file could not be read; every lookup fails when set.
    unavailable: Option<String>,
}

impl LocalPropertiesProvider {
    /// Parse properties text. Keys and values are unescaped and lines ending
    /// in `\` continue on the next line; anything else unrecognized is ignored.
    pub fn parse(text: &str) -> Self {
        let mut properties = HashMap::new();
        for line in logical_lines(text) {
            match PROPERTY_REGEX.captures(&line) {
                Some(caps) => {
                    properties.insert(unescape(&caps[1]), unescape(&caps[2]));
                }
                None => debug!(line = %line, "Skipping unrecognized properties line"),
            }
        }
        Self {
            properties,
            unavailable: None,
        }
    }

    /// Read a properties file. An unreadable file produces an unavailable
    /// provider rather than an error, so descriptors without `flutter.*`
    /// references still resolve.
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => {
                debug!(path = %path.display(), "Loaded local.properties");
                Self::parse(&text)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot read local.properties");
                Self::unavailable(format!("{}: {}", path.display(), e))
            }
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            properties: HashMap::new(),
            unavailable: Some(reason.into()),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn is_available(&self) -> bool {
        self.unavailable.is_none()
    }

    /// Unescaped value of a key, e.g. `flutter.sdk`.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    fn lookup(&self, property: SdkProperty) -> Result<Option<&str>> {
        if let Some(reason) = &self.unavailable {
            return Err(Error::Unavailable(reason.clone()));
        }
        Ok(self.property(&file_key(property)))
    }

    fn int(&self, property: SdkProperty, default: u32) -> Result<u32> {
        match self.lookup(property)? {
            Some(raw) => raw.parse().map_err(|_| Error::InvalidProperty {
                property: file_key(property),
                value: raw.to_string(),
            }),
            None => Ok(default),
        }
    }

    fn text(&self, property: SdkProperty, default: &str) -> Result<String> {
        Ok(self.lookup(property)?.unwrap_or(default).to_string())
    }
}

/// Non-blank, non-comment lines with continuations joined. A comment never
/// continues onto the next line.
fn logical_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut pending: Option<String> = None;
    for raw in text.lines() {
        let trimmed = raw.trim_start();
        let mut line = match pending.take() {
            Some(mut line) => {
                line.push_str(trimmed);
                line
            }
            None if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') => {
                continue;
            }
            None => trimmed.to_string(),
        };
        if continues(&line) {
            line.pop();
            pending = Some(line);
        } else if !line.is_empty() {
            lines.push(line);
        }
    }
    lines.extend(pending.filter(|line| !line.is_empty()));
    lines
}

/// An odd run of trailing backslashes ends in an unescaped one.
fn continues(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Resolve `\t`, `\n`, `\r`, `\f`, `\uXXXX`, and `\x` for any other `x`.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

fn file_key(property: SdkProperty) -> String {
    format!("flutter.{}", property.key())
}

impl SdkInfoProvider for LocalPropertiesProvider {
    fn compile_sdk_version(&self) -> Result<u32> {
        self.int(SdkProperty::CompileSdkVersion, DEFAULT_COMPILE_SDK_VERSION)
    }

    fn min_sdk_version(&self) -> Result<u32> {
        self.int(SdkProperty::MinSdkVersion, DEFAULT_MIN_SDK_VERSION)
    }

    fn target_sdk_version(&self) -> Result<u32> {
        self.int(SdkProperty::TargetSdkVersion, DEFAULT_TARGET_SDK_VERSION)
    }

    fn version_code(&self) -> Result<u32> {
        self.int(SdkProperty::VersionCode, DEFAULT_VERSION_CODE)
    }

    fn version_name(&self) -> Result<String> {
        self.text(SdkProperty::VersionName, DEFAULT_VERSION_NAME)
    }

    fn ndk_version(&self) -> Result<String> {
        self.text(SdkProperty::NdkVersion, DEFAULT_NDK_VERSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConfigError, resolve};
    use droidconf_core::StaticSigningConfigStore;
    use std::io::Write;

    const PROPERTIES: &str = "\
## This file must *NOT* be checked into Version Control Systems
sdk.dir=/opt/android-sdk
flutter.sdk=/opt/flutter
! legacy comment
flutter.versionName = 2.3.0
flutter.versionCode: 42
flutter.minSdkVersion=24
";

    #[test]
    fn test_parse_properties() {
        let provider = LocalPropertiesProvider::parse(PROPERTIES);
        assert_eq!(provider.property("sdk.dir"), Some("/opt/android-sdk"));
        assert_eq!(provider.version_name().unwrap(), "2.3.0");
        assert_eq!(provider.version_code().unwrap(), 42);
        assert_eq!(provider.min_sdk_version().unwrap(), 24);
    }

    #[test]
    fn test_escapes_and_continuations() {
        let text = r"sdk.dir=C\:\\Users\\me\\Android\\sdk
flutter.versionName=1.\
    2.3
# a comment does not continue \
flutter.versionCode=5
my\ key\=x = caf\u00e9\tbar
";
        let provider = LocalPropertiesProvider::parse(text);
        assert_eq!(provider.property("sdk.dir"), Some(r"C:\Users\me\Android\sdk"));
        assert_eq!(provider.version_name().unwrap(), "1.2.3");
        assert_eq!(provider.version_code().unwrap(), 5);
        assert_eq!(provider.property("my key=x"), Some("caf\u{e9}\tbar"));
    }

    #[test]
    fn test_defaults() {
        let provider = LocalPropertiesProvider::parse("");
        assert_eq!(provider.compile_sdk_version().unwrap(), DEFAULT_COMPILE_SDK_VERSION);
        assert_eq!(provider.target_sdk_version().unwrap(), DEFAULT_TARGET_SDK_VERSION);
        assert_eq!(provider.version_name().unwrap(), DEFAULT_VERSION_NAME);
        assert_eq!(provider.ndk_version().unwrap(), DEFAULT_NDK_VERSION);
    }

    #[test]
    fn test_invalid_number() {
        let provider = LocalPropertiesProvider::default().with_property("flutter.versionCode", "one");
        assert!(matches!(
            provider.version_code(),
            Err(Error::InvalidProperty { ref property, .. }) if property == "flutter.versionCode"
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PROPERTIES.as_bytes()).unwrap();

        let provider = LocalPropertiesProvider::from_file(file.path());
        assert!(provider.is_available());
        assert_eq!(provider.version_code().unwrap(), 42);
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let provider = LocalPropertiesProvider::from_file(dir.path().join("local.properties"));
        assert!(!provider.is_available());
        assert!(matches!(provider.compile_sdk_version(), Err(Error::Unavailable(_))));
    }

    #[test]
    fn test_unavailable_only_fails_when_referenced() {
        let provider = LocalPropertiesProvider::unavailable("no file");
        let store = StaticSigningConfigStore::new();

        let literal = r#"
android {
    namespace = "com.example.app"
    defaultConfig {
        applicationId = "com.example.app"
        minSdk = 21
    }
}
"#;
        assert!(resolve(literal, &provider, &store).is_ok());

        let referenced = literal.replace("minSdk = 21", "minSdk = flutter.minSdkVersion");
        assert!(matches!(
            resolve(&referenced, &provider, &store).unwrap_err(),
            ConfigError::ProviderUnavailable { ref property, .. } if property == "flutter.minSdkVersion"
        ));
    }
}
