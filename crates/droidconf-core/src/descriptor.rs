//! Build descriptor definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::PackageName;
use crate::java::JavaVersion;
use crate::sdk::SdkProperty;

/// A resolved Android application module descriptor.
///
/// Produced once per build invocation and handed to the build executor as an
/// immutable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildDescriptor {
    /// Applied plugins, in declaration order.
    pub plugins: Vec<PluginRef>,
    /// Module namespace (R class package).
    pub namespace: PackageName,
    /// Module-level bindings (`compileSdk`, `ndkVersion`).
    pub sdk: SdkBindings,
    /// Java source/target levels from `compileOptions`.
    pub compatibility: Compatibility,
    /// Kotlin compiler options.
    pub kotlin: KotlinOptions,
    /// `defaultConfig` block.
    pub default_config: DefaultConfig,
    /// Build types keyed by name (e.g. "release").
    pub build_types: BTreeMap<String, BuildType>,
    /// Signing configs declared in the descriptor itself.
    pub signing_configs: BTreeMap<String, SigningConfigDecl>,
    /// Framework project root, relative to the module (`flutter { source }`).
    pub source_root: Option<String>,
}

impl BuildDescriptor {
    /// Find a plugin by id.
    pub fn plugin(&self, id: &str) -> Option<&PluginRef> {
        self.plugins.iter().find(|p| p.id == id)
    }

    /// Every `(build type, signing config)` reference, in build type order.
    pub fn signing_config_refs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.build_types.iter().filter_map(|(name, build_type)| {
            build_type
                .signing_config
                .as_deref()
                .map(|config| (name.as_str(), config))
        })
    }
}

/// A plugin application inside the `plugins` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginRef {
    /// Plugin id (e.g. "com.android.application").
    pub id: String,
    /// Requested version (`version "8.7.0"`).
    pub version: Option<String>,
    /// Whether the plugin is applied to this module (`apply false` clears it).
    pub apply: bool,
    /// Plugins that must be applied before this one.
    pub after: Vec<String>,
}

impl PluginRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: None,
            apply: true,
            after: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn applied(mut self, apply: bool) -> Self {
        self.apply = apply;
        self
    }

    pub fn after(mut self, id: impl Into<String>) -> Self {
        self.after.push(id.into());
        self
    }
}

/// Where a binding's value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingSource {
    /// Written directly in the descriptor.
    Literal,
    /// Supplied by the SDK info provider.
    Provider(SdkProperty),
}

/// A resolved value together with its origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding<T> {
    pub source: BindingSource,
    pub value: T,
}

impl<T> Binding<T> {
    pub fn literal(value: T) -> Self {
        Self {
            source: BindingSource::Literal,
            value,
        }
    }

    pub fn provided(property: SdkProperty, value: T) -> Self {
        Self {
            source: BindingSource::Provider(property),
            value,
        }
    }
}

/// SDK levels and version metadata for one scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkBindings {
    pub compile_sdk: Option<Binding<u32>>,
    pub min_sdk: Option<Binding<u32>>,
    pub target_sdk: Option<Binding<u32>>,
    pub version_code: Option<Binding<u32>>,
    pub version_name: Option<Binding<String>>,
    pub ndk_version: Option<Binding<String>>,
}

impl SdkBindings {
    pub fn is_empty(&self) -> bool {
        self.compile_sdk.is_none()
            && self.min_sdk.is_none()
            && self.target_sdk.is_none()
            && self.version_code.is_none()
            && self.version_name.is_none()
            && self.ndk_version.is_none()
    }
}

/// Java language levels from `compileOptions`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compatibility {
    pub source: JavaVersion,
    pub target: JavaVersion,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KotlinOptions {
    pub jvm_target: Option<JavaVersion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultConfig {
    pub application_id: PackageName,
    pub sdk: SdkBindings,
}

/// Per-build-type overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildType {
    /// Name of the signing config (`signingConfigs.getByName("debug")`).
    pub signing_config: Option<String>,
    pub minify_enabled: Option<bool>,
    pub shrink_resources: Option<bool>,
    pub debuggable: Option<bool>,
}

/// A signing config declared inside the descriptor.
///
/// Passwords are deliberately not kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningConfigDecl {
    pub store_file: Option<String>,
    pub key_alias: Option<String>,
}
