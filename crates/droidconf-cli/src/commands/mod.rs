//! CLI command implementations.

pub mod fmt;
pub mod resolve;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use droidconf_config::{
    CompatibilityPolicy, ConfigError, LocalPropertiesProvider, ResolveOptions, Resolver,
};
use droidconf_core::descriptor::BuildDescriptor;
use droidconf_core::{SdkInfoProvider, SigningConfigStore, StaticSdkInfo, StaticSigningConfigStore};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Exit status when the descriptor cannot be read.
const EXIT_IO: u8 = 74;

/// Inputs to resolution shared by every subcommand.
#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// JSON file with SDK values, used instead of local.properties
    #[arg(long, global = true, env = "DROIDCONF_SDK_INFO")]
    pub sdk_info: Option<PathBuf>,

    /// Flutter local.properties file [default: <descriptor dir>/../local.properties]
    #[arg(long, global = true, env = "DROIDCONF_LOCAL_PROPERTIES")]
    pub local_properties: Option<PathBuf>,

    /// Signing config known outside the descriptor (repeatable; debug is always known)
    #[arg(
        long = "signing-config",
        global = true,
        env = "DROIDCONF_SIGNING_CONFIGS",
        value_delimiter = ','
    )]
    pub signing_configs: Vec<String>,

    /// What to do when Java compatibility levels disagree
    #[arg(long, global = true, env = "DROIDCONF_COMPAT_POLICY", default_value_t = CompatibilityPolicy::Warn)]
    pub compat_policy: CompatibilityPolicy,

    /// Skip the built-in plugin ordering rules
    #[arg(long, global = true, env = "DROIDCONF_NO_BUILTIN_PLUGIN_RULES")]
    pub no_builtin_plugin_rules: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

impl ResolveArgs {
    fn options(&self) -> ResolveOptions {
        ResolveOptions {
            compatibility: self.compat_policy,
            builtin_plugin_rules: !self.no_builtin_plugin_rules,
        }
    }

    fn signing_store(&self) -> StaticSigningConfigStore {
        let mut store = StaticSigningConfigStore::new();
        for name in &self.signing_configs {
            store.insert(name.trim());
        }
        store
    }

    fn sdk_provider(&self, descriptor: &Path) -> Result<Box<dyn SdkInfoProvider>> {
        if let Some(path) = &self.sdk_info {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read SDK info: {}", path.display()))?;
            let sdk: StaticSdkInfo = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse SDK info: {}", path.display()))?;
            debug!(path = %path.display(), "Using SDK info file");
            return Ok(Box::new(sdk));
        }

        let path = self
            .local_properties
            .clone()
            .unwrap_or_else(|| default_local_properties(descriptor));
        Ok(Box::new(LocalPropertiesProvider::from_file(path)))
    }

    /// Resolve the descriptor at `path` with these settings.
    pub fn resolve(&self, path: &Path) -> Result<BuildDescriptor> {
        let sdk = self.sdk_provider(path)?;
        let store = self.signing_store();
        debug!(signing_configs = ?store.names(), "Known signing configs");
        let descriptor = Resolver::new(sdk.as_ref(), &store)
            .with_options(self.options())
            .resolve_file(path)
            .with_context(|| format!("Failed to resolve {}", path.display()))?;
        Ok(descriptor)
    }
}

/// Flutter keeps `local.properties` in the Android project root, one level
/// above the app module.
fn default_local_properties(descriptor: &Path) -> PathBuf {
    let dir = descriptor
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    dir.join("..").join("local.properties")
}

pub fn validate(args: &ResolveArgs, path: &Path) -> Result<()> {
    let descriptor = args.resolve(path)?;
    info!(
        path = %path.display(),
        namespace = %descriptor.namespace,
        "Descriptor is valid"
    );
    println!(
        "{}: ok ({}, {} plugins, {} build types)",
        path.display(),
        descriptor.namespace,
        descriptor.plugins.len(),
        descriptor.build_types.len()
    );
    Ok(())
}

/// Map an error to the process exit status.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    if let Some(e) = err.downcast_ref::<ConfigError>() {
        return match e {
            ConfigError::Malformed { .. } => 2,
            ConfigError::MissingField(_) => 3,
            ConfigError::InvalidIdentifier { .. } => 4,
            ConfigError::UnresolvedSigningConfig { .. } => 5,
            ConfigError::PluginOrder(_) => 6,
            ConfigError::ProviderUnavailable { .. } => 7,
            ConfigError::CompatibilityMismatch { .. } => 8,
            ConfigError::Io(_) => EXIT_IO,
        };
    }
    if err.downcast_ref::<std::io::Error>().is_some() {
        return EXIT_IO;
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) const DESCRIPTOR: &str = r#"
plugins {
    id("com.android.application")
    id("dev.flutter.flutter-gradle-plugin")
}

android {
    namespace = "com.example.app"
    compileSdk = flutter.compileSdkVersion

    defaultConfig {
        applicationId = "com.example.app"
        versionCode = flutter.versionCode
    }

    buildTypes {
        release {
            signingConfig = signingConfigs.getByName("upload")
        }
    }
}

flutter {
    source = "../.."
}
"#;

    pub(crate) fn args() -> ResolveArgs {
        ResolveArgs {
            sdk_info: None,
            local_properties: None,
            signing_configs: vec!["upload".to_string()],
            compat_policy: CompatibilityPolicy::Warn,
            no_builtin_plugin_rules: false,
        }
    }

    /// `android/app/build.gradle.kts` next to `android/local.properties`.
    pub(crate) fn project(properties: Option<&str>) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("app");
        std::fs::create_dir(&app).unwrap();
        let descriptor = app.join("build.gradle.kts");
        std::fs::write(&descriptor, DESCRIPTOR).unwrap();
        if let Some(properties) = properties {
            std::fs::write(dir.path().join("local.properties"), properties).unwrap();
        }
        (dir, descriptor)
    }

    #[test]
    fn test_resolve_with_default_local_properties() {
        let (_dir, descriptor) = project(Some("flutter.versionCode=12\n"));
        let d = args().resolve(&descriptor).unwrap();
        assert_eq!(d.default_config.sdk.version_code.unwrap().value, 12);
        assert_eq!(d.sdk.compile_sdk.unwrap().value, 35);
    }

    #[test]
    fn test_missing_local_properties_exit_code() {
        let (_dir, descriptor) = project(None);
        let err = args().resolve(&descriptor).unwrap_err();
        assert_eq!(exit_code(&err), 7);
    }

    #[test]
    fn test_sdk_info_file() {
        let (dir, descriptor) = project(None);
        let sdk_info = dir.path().join("sdk.json");
        std::fs::write(&sdk_info, r#"{"compileSdkVersion": 34, "versionCode": 5}"#).unwrap();

        let args = ResolveArgs {
            sdk_info: Some(sdk_info),
            ..args()
        };
        let d = args.resolve(&descriptor).unwrap();
        assert_eq!(d.sdk.compile_sdk.unwrap().value, 34);
    }

    #[test]
    fn test_unknown_signing_config_exit_code() {
        let (_dir, descriptor) = project(Some(""));
        let args = ResolveArgs {
            signing_configs: Vec::new(),
            ..args()
        };
        let err = args.resolve(&descriptor).unwrap_err();
        assert_eq!(exit_code(&err), 5);
    }

    #[test]
    fn test_missing_descriptor_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let err = args().resolve(&dir.path().join("nope.kts")).unwrap_err();
        assert_eq!(exit_code(&err), EXIT_IO);
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let errors = [
            ConfigError::Malformed {
                location: Default::default(),
                message: String::new(),
            },
            ConfigError::MissingField(String::new()),
            ConfigError::InvalidIdentifier {
                field: String::new(),
                message: String::new(),
            },
            ConfigError::UnresolvedSigningConfig {
                build_type: String::new(),
                name: String::new(),
            },
            ConfigError::PluginOrder(String::new()),
            ConfigError::ProviderUnavailable {
                property: String::new(),
                source: droidconf_core::Error::Unavailable(String::new()),
            },
            ConfigError::CompatibilityMismatch {
                field: String::new(),
                expected: String::new(),
                found: String::new(),
            },
        ];
        let mut codes: Vec<u8> = errors
            .into_iter()
            .map(|e| exit_code(&anyhow::Error::new(e)))
            .collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes, vec![2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_default_local_properties_path() {
        assert_eq!(
            default_local_properties(Path::new("build.gradle.kts")),
            Path::new("./../local.properties")
        );
        assert_eq!(
            default_local_properties(Path::new("android/app/build.gradle.kts")),
            Path::new("android/app/../local.properties")
        );
    }
}
