//! Semantic resolution of a parsed descriptor into a [`BuildDescriptor`].
//!
//! Resolution is a single fail-fast pass: the first error ends it and no
//! partial descriptor is returned. Structural checks run before any call to
//! the SDK info provider.

use crate::ast::{Document, Expr, ExprKind, Statement};
use crate::error::Location;
use crate::parser::parse_document;
use crate::plugins::{self, FLUTTER_GRADLE_PLUGIN};
use crate::{ConfigError, ConfigResult};
use droidconf_core::descriptor::{
    Binding, BuildDescriptor, BuildType, Compatibility, DefaultConfig, KotlinOptions, PluginRef,
    SdkBindings, SigningConfigDecl,
};
use droidconf_core::sdk::{SdkValue, ValueKind};
use droidconf_core::{JavaVersion, PackageName, SdkInfoProvider, SdkProperty, SigningConfigStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

/// Object name that prefixes provider references (`flutter.minSdkVersion`).
pub const PROVIDER_PREFIX: &str = "flutter";

/// What to do when Java levels disagree.
///
/// Covers `sourceCompatibility` vs `targetCompatibility` and
/// `kotlinOptions.jvmTarget` vs `targetCompatibility`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompatibilityPolicy {
    Ignore,
    #[default]
    Warn,
    Deny,
}

impl std::str::FromStr for CompatibilityPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ignore" => Ok(CompatibilityPolicy::Ignore),
            "warn" => Ok(CompatibilityPolicy::Warn),
            "deny" => Ok(CompatibilityPolicy::Deny),
            other => Err(format!(
                "unknown compatibility policy '{}' (expected ignore, warn or deny)",
                other
            )),
        }
    }
}

impl fmt::Display for CompatibilityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompatibilityPolicy::Ignore => "ignore",
            CompatibilityPolicy::Warn => "warn",
            CompatibilityPolicy::Deny => "deny",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveOptions {
    pub compatibility: CompatibilityPolicy,
    /// Enforce the built-in plugin ordering rules (Flutter after Android/Kotlin).
    pub builtin_plugin_rules: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            compatibility: CompatibilityPolicy::default(),
            builtin_plugin_rules: true,
        }
    }
}

/// Resolve descriptor text with default options.
pub fn resolve(
    text: &str,
    sdk: &dyn SdkInfoProvider,
    signing: &dyn SigningConfigStore,
) -> ConfigResult<BuildDescriptor> {
    Resolver::new(sdk, signing).resolve(text)
}

/// Turns descriptor text into a validated [`BuildDescriptor`].
pub struct Resolver<'a> {
    sdk: &'a dyn SdkInfoProvider,
    signing: &'a dyn SigningConfigStore,
    options: ResolveOptions,
}

impl<'a> Resolver<'a> {
    pub fn new(sdk: &'a dyn SdkInfoProvider, signing: &'a dyn SigningConfigStore) -> Self {
        Self {
            sdk,
            signing,
            options: ResolveOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    pub fn resolve(&self, text: &str) -> ConfigResult<BuildDescriptor> {
        let document = parse_document(text)?;
        self.resolve_document(&document)
    }

    pub fn resolve_file(&self, path: impl AsRef<Path>) -> ConfigResult<BuildDescriptor> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Reading descriptor");
        let text = std::fs::read_to_string(path)?;
        self.resolve(&text)
    }

    pub fn resolve_document(&self, document: &Document) -> ConfigResult<BuildDescriptor> {
        let mut draft = Draft::default();

        for stmt in &document.statements {
            match stmt {
                Statement::Block { name, args, body, .. } if args.is_empty() => {
                    match name.as_str() {
                        "plugins" => draft.plugins(body)?,
                        "android" => draft.android(body)?,
                        "flutter" => draft.flutter(body)?,
                        _ => skip(stmt, "top level"),
                    }
                }
                _ => skip(stmt, "top level"),
            }
        }

        self.finish(draft)
    }

    fn finish(&self, draft: Draft) -> ConfigResult<BuildDescriptor> {
        let namespace = draft
            .namespace
            .ok_or_else(|| ConfigError::MissingField("android.namespace".to_string()))?;
        let application_id = draft.application_id.ok_or_else(|| {
            ConfigError::MissingField("android.defaultConfig.applicationId".to_string())
        })?;

        if draft.sdk.is_empty() && draft.default_sdk.is_empty() {
            return Err(ConfigError::MissingField(
                "SDK binding (compileSdk, minSdk, targetSdk, versionCode, versionName or ndkVersion)"
                    .to_string(),
            ));
        }

        let namespace = package_name("namespace", namespace)?;
        let application_id = package_name("applicationId", application_id)?;

        for (build_type, config) in &draft.build_types {
            if let Some(name) = &config.signing_config {
                if !draft.signing_configs.contains_key(name) && !self.signing.contains(name) {
                    return Err(ConfigError::UnresolvedSigningConfig {
                        build_type: build_type.clone(),
                        name: name.clone(),
                    });
                }
            }
        }

        let flutter_applied = draft
            .plugins
            .iter()
            .any(|p| p.apply && p.id == FLUTTER_GRADLE_PLUGIN);
        let source_root = match draft.source_root {
            Some((source, location)) => {
                if source.is_empty() {
                    return Err(ConfigError::malformed(location, "flutter.source must not be empty"));
                }
                if is_absolute(&source) {
                    return Err(ConfigError::malformed(
                        location,
                        format!("flutter.source must be a relative path, found '{}'", source),
                    ));
                }
                Some(source)
            }
            None if flutter_applied => {
                return Err(ConfigError::MissingField("flutter.source".to_string()));
            }
            None => None,
        };

        plugins::check_plugin_order(&draft.plugins, self.options.builtin_plugin_rules)?;

        let compatibility = Compatibility {
            source: draft.source_compatibility.unwrap_or_default(),
            target: draft.target_compatibility.unwrap_or_default(),
        };
        self.check_compatibility(&compatibility, draft.jvm_target)?;

        let sdk = self.bindings(&draft.sdk)?;
        let default_sdk = self.bindings(&draft.default_sdk)?;

        let descriptor = BuildDescriptor {
            plugins: draft.plugins,
            namespace,
            sdk,
            compatibility,
            kotlin: KotlinOptions {
                jvm_target: draft.jvm_target,
            },
            default_config: DefaultConfig {
                application_id,
                sdk: default_sdk,
            },
            build_types: draft.build_types,
            signing_configs: draft.signing_configs,
            source_root,
        };

        debug!(
            namespace = %descriptor.namespace,
            plugins = descriptor.plugins.len(),
            build_types = descriptor.build_types.len(),
            "Descriptor resolved"
        );
        Ok(descriptor)
    }

    fn check_compatibility(
        &self,
        compatibility: &Compatibility,
        jvm_target: Option<JavaVersion>,
    ) -> ConfigResult<()> {
        let mut mismatches = Vec::new();
        if compatibility.source != compatibility.target {
            mismatches.push(("sourceCompatibility", compatibility.source));
        }
        if let Some(jvm_target) = jvm_target {
            if jvm_target != compatibility.target {
                mismatches.push(("kotlinOptions.jvmTarget", jvm_target));
            }
        }

        for (field, found) in mismatches {
            match self.options.compatibility {
                CompatibilityPolicy::Ignore => {}
                CompatibilityPolicy::Warn => {
                    warn!(
                        field,
                        found = %found,
                        expected = %compatibility.target,
                        "Java compatibility mismatch"
                    );
                }
                CompatibilityPolicy::Deny => {
                    return Err(ConfigError::CompatibilityMismatch {
                        field: field.to_string(),
                        expected: compatibility.target.to_string(),
                        found: found.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn bindings(&self, pending: &PendingBindings) -> ConfigResult<SdkBindings> {
        Ok(SdkBindings {
            compile_sdk: self.int_binding("compileSdk", pending.compile_sdk.as_ref())?,
            min_sdk: self.int_binding("minSdk", pending.min_sdk.as_ref())?,
            target_sdk: self.int_binding("targetSdk", pending.target_sdk.as_ref())?,
            version_code: self.int_binding("versionCode", pending.version_code.as_ref())?,
            version_name: self.text_binding("versionName", pending.version_name.as_ref())?,
            ndk_version: self.text_binding("ndkVersion", pending.ndk_version.as_ref())?,
        })
    }

    fn int_binding(&self, field: &str, expr: Option<&Expr>) -> ConfigResult<Option<Binding<u32>>> {
        let Some(expr) = expr else {
            return Ok(None);
        };

        let binding = match &expr.kind {
            ExprKind::Int(n) => {
                let value = u32::try_from(*n).map_err(|_| {
                    ConfigError::malformed(
                        expr.location,
                        format!("{} must be a non-negative integer, found {}", field, n),
                    )
                })?;
                Binding::literal(value)
            }
            ExprKind::Path(segments) => {
                let property = provider_property(field, segments, ValueKind::Int, expr.location)?;
                match self.fetch(property)? {
                    SdkValue::Int(value) => Binding::provided(property, value),
                    SdkValue::Text(value) => return Err(unexpected_value(property, value)),
                }
            }
            _ => {
                return Err(ConfigError::malformed(
                    expr.location,
                    format!(
                        "{} expects an integer or a {}.* reference, found {}",
                        field,
                        PROVIDER_PREFIX,
                        expr.describe()
                    ),
                ));
            }
        };
        Ok(Some(binding))
    }

    fn text_binding(
        &self,
        field: &str,
        expr: Option<&Expr>,
    ) -> ConfigResult<Option<Binding<String>>> {
        let Some(expr) = expr else {
            return Ok(None);
        };

        let binding = match &expr.kind {
            ExprKind::Str(value) => Binding::literal(value.clone()),
            ExprKind::Path(segments) => {
                let property = provider_property(field, segments, ValueKind::Text, expr.location)?;
                match self.fetch(property)? {
                    SdkValue::Text(value) => Binding::provided(property, value),
                    SdkValue::Int(value) => {
                        return Err(unexpected_value(property, value.to_string()));
                    }
                }
            }
            _ => {
                return Err(ConfigError::malformed(
                    expr.location,
                    format!(
                        "{} expects a string or a {}.* reference, found {}",
                        field,
                        PROVIDER_PREFIX,
                        expr.describe()
                    ),
                ));
            }
        };
        Ok(Some(binding))
    }

    fn fetch(&self, property: SdkProperty) -> ConfigResult<SdkValue> {
        debug!(property = %property, "Querying SDK info provider");
        self.sdk
            .get(property)
            .map_err(|source| ConfigError::ProviderUnavailable {
                property: provider_reference(property),
                source,
            })
    }
}

fn provider_reference(property: SdkProperty) -> String {
    format!("{}.{}", PROVIDER_PREFIX, property.key())
}

fn unexpected_value(property: SdkProperty, value: String) -> ConfigError {
    ConfigError::ProviderUnavailable {
        property: provider_reference(property),
        source: droidconf_core::Error::InvalidProperty {
            property: property.key().to_string(),
            value,
        },
    }
}

fn provider_property(
    field: &str,
    segments: &[String],
    kind: ValueKind,
    location: Location,
) -> ConfigResult<SdkProperty> {
    let [prefix, key] = segments else {
        return Err(unsupported_reference(field, segments, location));
    };
    if prefix != PROVIDER_PREFIX {
        return Err(unsupported_reference(field, segments, location));
    }

    let property = SdkProperty::from_key(key).ok_or_else(|| {
        ConfigError::malformed(
            location,
            format!("unknown provider property '{}.{}'", PROVIDER_PREFIX, key),
        )
    })?;
    if property.kind() != kind {
        return Err(ConfigError::malformed(
            location,
            format!(
                "{} cannot be bound to '{}', which has the wrong type",
                field,
                provider_reference(property)
            ),
        ));
    }
    Ok(property)
}

fn unsupported_reference(field: &str, segments: &[String], location: Location) -> ConfigError {
    ConfigError::malformed(
        location,
        format!(
            "{} references '{}'; only {}.* properties can be resolved",
            field,
            segments.join("."),
            PROVIDER_PREFIX
        ),
    )
}

fn package_name(field: &str, value: String) -> ConfigResult<PackageName> {
    PackageName::new(value).map_err(|e| ConfigError::InvalidIdentifier {
        field: field.to_string(),
        message: e.to_string(),
    })
}

fn is_absolute(path: &str) -> bool {
    path.starts_with('/') || path.starts_with('\\') || Path::new(path).is_absolute()
}

/// Binding expressions collected during the walk, resolved at the end.
#[derive(Debug, Default)]
struct PendingBindings {
    compile_sdk: Option<Expr>,
    min_sdk: Option<Expr>,
    target_sdk: Option<Expr>,
    version_code: Option<Expr>,
    version_name: Option<Expr>,
    ndk_version: Option<Expr>,
}

impl PendingBindings {
    /// Slot for a binding key, including the legacy `*Version` spellings.
    fn slot(&mut self, key: &str) -> Option<&mut Option<Expr>> {
        match key {
            "compileSdk" | "compileSdkVersion" => Some(&mut self.compile_sdk),
            "minSdk" | "minSdkVersion" => Some(&mut self.min_sdk),
            "targetSdk" | "targetSdkVersion" => Some(&mut self.target_sdk),
            "versionCode" => Some(&mut self.version_code),
            "versionName" => Some(&mut self.version_name),
            "ndkVersion" => Some(&mut self.ndk_version),
            _ => None,
        }
    }

    fn is_empty(&self) -> bool {
        self.compile_sdk.is_none()
            && self.min_sdk.is_none()
            && self.target_sdk.is_none()
            && self.version_code.is_none()
            && self.version_name.is_none()
            && self.ndk_version.is_none()
    }
}

/// Everything gathered from the syntax tree before validation.
#[derive(Debug, Default)]
struct Draft {
    plugins: Vec<PluginRef>,
    namespace: Option<String>,
    sdk: PendingBindings,
    source_compatibility: Option<JavaVersion>,
    target_compatibility: Option<JavaVersion>,
    jvm_target: Option<JavaVersion>,
    application_id: Option<String>,
    default_sdk: PendingBindings,
    build_types: BTreeMap<String, BuildType>,
    signing_configs: BTreeMap<String, SigningConfigDecl>,
    source_root: Option<(String, Location)>,
}

impl Draft {
    fn plugins(&mut self, body: &[Statement]) -> ConfigResult<()> {
        for stmt in body {
            let Statement::Expr(expr) = stmt else {
                return Err(ConfigError::malformed(
                    stmt.location(),
                    "expected a plugin declaration such as id(\"...\")",
                ));
            };
            let plugin = plugin_from_expr(expr)?;
            if self.plugins.iter().any(|p| p.id == plugin.id) {
                return Err(ConfigError::malformed(
                    expr.location,
                    format!("plugin '{}' is declared more than once", plugin.id),
                ));
            }
            self.plugins.push(plugin);
        }
        Ok(())
    }

    fn android(&mut self, body: &[Statement]) -> ConfigResult<()> {
        for stmt in body {
            if let Some(setting) = Setting::from_statement(stmt) {
                if setting.name == "namespace" {
                    self.namespace = Some(setting.string()?);
                } else if let Some(slot) = self.sdk.slot(setting.name) {
                    *slot = Some(setting.value.clone());
                } else {
                    skip(stmt, "android");
                }
                continue;
            }

            match stmt {
                Statement::Block { name, args, body, .. } if args.is_empty() => {
                    match name.as_str() {
                        "compileOptions" => self.compile_options(body)?,
                        "kotlinOptions" => self.kotlin_options(body)?,
                        "defaultConfig" => self.default_config(body)?,
                        "buildTypes" => self.build_types(body)?,
                        "signingConfigs" => self.signing_configs(body)?,
                        _ => skip(stmt, "android"),
                    }
                }
                _ => skip(stmt, "android"),
            }
        }
        Ok(())
    }

    fn compile_options(&mut self, body: &[Statement]) -> ConfigResult<()> {
        for stmt in body {
            match Setting::from_statement(stmt) {
                Some(s) if s.name == "sourceCompatibility" => {
                    self.source_compatibility = Some(java_version(s.name, s.value)?);
                }
                Some(s) if s.name == "targetCompatibility" => {
                    self.target_compatibility = Some(java_version(s.name, s.value)?);
                }
                _ => skip(stmt, "compileOptions"),
            }
        }
        Ok(())
    }

    fn kotlin_options(&mut self, body: &[Statement]) -> ConfigResult<()> {
        for stmt in body {
            match Setting::from_statement(stmt) {
                Some(s) if s.name == "jvmTarget" => {
                    self.jvm_target = Some(java_version(s.name, s.value)?);
                }
                _ => skip(stmt, "kotlinOptions"),
            }
        }
        Ok(())
    }

    fn default_config(&mut self, body: &[Statement]) -> ConfigResult<()> {
        for stmt in body {
            let Some(setting) = Setting::from_statement(stmt) else {
                skip(stmt, "defaultConfig");
                continue;
            };
            if setting.name == "applicationId" {
                self.application_id = Some(setting.string()?);
            } else if let Some(slot) = self.default_sdk.slot(setting.name) {
                *slot = Some(setting.value.clone());
            } else {
                skip(stmt, "defaultConfig");
            }
        }
        Ok(())
    }

    fn build_types(&mut self, body: &[Statement]) -> ConfigResult<()> {
        for stmt in body {
            let Statement::Block {
                name,
                args,
                body,
                location,
            } = stmt
            else {
                skip(stmt, "buildTypes");
                continue;
            };

            let type_name = named_block(name, args, *location)?;
            let build_type = self.build_types.entry(type_name).or_default();

            for inner in body {
                match Setting::from_statement(inner) {
                    Some(s) if s.name == "signingConfig" => {
                        build_type.signing_config = Some(signing_reference(s.value)?);
                    }
                    Some(s) if matches!(s.name, "isMinifyEnabled" | "minifyEnabled") => {
                        build_type.minify_enabled = Some(s.boolean()?);
                    }
                    Some(s) if matches!(s.name, "isShrinkResources" | "shrinkResources") => {
                        build_type.shrink_resources = Some(s.boolean()?);
                    }
                    Some(s) if matches!(s.name, "isDebuggable" | "debuggable") => {
                        build_type.debuggable = Some(s.boolean()?);
                    }
                    _ => skip(inner, "buildTypes"),
                }
            }
        }
        Ok(())
    }

    fn signing_configs(&mut self, body: &[Statement]) -> ConfigResult<()> {
        for stmt in body {
            let Statement::Block {
                name,
                args,
                body,
                location,
            } = stmt
            else {
                skip(stmt, "signingConfigs");
                continue;
            };

            let config_name = named_block(name, args, *location)?;
            let config = self.signing_configs.entry(config_name).or_default();

            for inner in body {
                match Setting::from_statement(inner) {
                    Some(s) if s.name == "storeFile" => {
                        config.store_file = store_file(s.value)?;
                    }
                    Some(s) if s.name == "keyAlias" => {
                        config.key_alias = s.build_time_string()?;
                    }
                    Some(s) if matches!(s.name, "storePassword" | "keyPassword") => {
                        debug!(field = s.name, "Dropping signing credential");
                    }
                    _ => skip(inner, "signingConfigs"),
                }
            }
        }
        Ok(())
    }

    fn flutter(&mut self, body: &[Statement]) -> ConfigResult<()> {
        for stmt in body {
            match Setting::from_statement(stmt) {
                Some(s) if s.name == "source" => {
                    self.source_root = Some((s.string()?, s.location));
                }
                _ => skip(stmt, "flutter"),
            }
        }
        Ok(())
    }
}

/// A `key = value` or `key(value)` statement.
struct Setting<'d> {
    name: &'d str,
    value: &'d Expr,
    location: Location,
}

impl<'d> Setting<'d> {
    fn from_statement(stmt: &'d Statement) -> Option<Self> {
        match stmt {
            Statement::Assign {
                target,
                value,
                location,
            } if target.len() == 1 => Some(Setting {
                name: &target[0],
                value,
                location: *location,
            }),
            Statement::Expr(Expr {
                kind:
                    ExprKind::Call {
                        receiver: None,
                        name,
                        args,
                    },
                location,
            }) if args.len() == 1 => Some(Setting {
                name,
                value: &args[0],
                location: *location,
            }),
            _ => None,
        }
    }

    fn string(&self) -> ConfigResult<String> {
        self.value.as_str().map(str::to_string).ok_or_else(|| {
            ConfigError::malformed(
                self.value.location,
                format!(
                    "{} expects a string literal, found {}",
                    self.name,
                    self.value.describe()
                ),
            )
        })
    }

    /// A string literal, or `None` when the value is computed by the build
    /// script itself (`props["keyAlias"] as String`).
    fn build_time_string(&self) -> ConfigResult<Option<String>> {
        match &self.value.kind {
            ExprKind::Str(value) => Ok(Some(value.clone())),
            ExprKind::Int(_) | ExprKind::Bool(_) => self.string().map(Some),
            _ => {
                debug!(
                    field = self.name,
                    value = %self.value.describe(),
                    "Value is computed at build time"
                );
                Ok(None)
            }
        }
    }

    fn boolean(&self) -> ConfigResult<bool> {
        match self.value.kind {
            ExprKind::Bool(b) => Ok(b),
            _ => Err(ConfigError::malformed(
                self.value.location,
                format!(
                    "{} expects true or false, found {}",
                    self.name,
                    self.value.describe()
                ),
            )),
        }
    }
}

fn skip(stmt: &Statement, scope: &str) {
    let statement = match stmt {
        Statement::Block { name, .. } => name.clone(),
        Statement::Assign { target, .. } => target.join("."),
        Statement::Expr(expr) => expr.describe(),
        Statement::Import { path, .. } => format!("import {}", path.join(".")),
        Statement::Local { name, .. } => format!("val {}", name),
    };
    debug!(
        scope,
        statement = %statement,
        line = stmt.location().line,
        "Ignoring unsupported statement"
    );
}

/// Name of a container element: `release { }`, `create("staging") { }`, ...
fn named_block(name: &str, args: &[Expr], location: Location) -> ConfigResult<String> {
    match (name, args) {
        ("create" | "getByName" | "maybeCreate" | "register" | "named", [arg]) => arg
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                ConfigError::malformed(arg.location, format!("{}(...) expects a name string", name))
            }),
        (_, []) => Ok(name.to_string()),
        _ => Err(ConfigError::malformed(
            location,
            format!("unsupported block '{}(...)'", name),
        )),
    }
}

fn is_path(expr: &Expr, expected: &[&str]) -> bool {
    expr.as_path()
        .is_some_and(|segments| segments.iter().map(String::as_str).eq(expected.iter().copied()))
}

/// `signingConfigs.getByName("debug")` or `signingConfigs.debug`.
fn signing_reference(expr: &Expr) -> ConfigResult<String> {
    match &expr.kind {
        ExprKind::Call {
            receiver: Some(receiver),
            name,
            args,
        } if is_path(receiver, &["signingConfigs"])
            && matches!(name.as_str(), "getByName" | "named") =>
        {
            if let [arg] = args.as_slice() {
                if let Some(config) = arg.as_str() {
                    return Ok(config.to_string());
                }
            }
            Err(ConfigError::malformed(
                expr.location,
                format!("signingConfigs.{}(...) expects a name string", name),
            ))
        }
        ExprKind::Path(segments) if segments.len() == 2 && segments[0] == "signingConfigs" => {
            Ok(segments[1].clone())
        }
        _ => Err(ConfigError::malformed(
            expr.location,
            format!(
                "signingConfig expects signingConfigs.getByName(\"...\"), found {}",
                expr.describe()
            ),
        )),
    }
}

/// `file("upload.jks")` or a plain string; `None` when the path is computed
/// by the build script (`props["storeFile"]?.let { file(it) }`).
fn store_file(expr: &Expr) -> ConfigResult<Option<String>> {
    match &expr.kind {
        ExprKind::Str(path) => Ok(Some(path.clone())),
        ExprKind::Call {
            receiver: None,
            name,
            args,
        } if name == "file" => match args.as_slice() {
            [arg] => match &arg.kind {
                ExprKind::Str(path) => Ok(Some(path.clone())),
                ExprKind::Int(_) | ExprKind::Bool(_) => Err(ConfigError::malformed(
                    arg.location,
                    "file(...) expects a path string",
                )),
                _ => Ok(computed_store_file(expr)),
            },
            _ => Err(ConfigError::malformed(
                expr.location,
                "file(...) expects exactly one argument",
            )),
        },
        ExprKind::Int(_) | ExprKind::Bool(_) => Err(ConfigError::malformed(
            expr.location,
            format!("storeFile expects file(\"...\"), found {}", expr.describe()),
        )),
        _ => Ok(computed_store_file(expr)),
    }
}

fn computed_store_file(expr: &Expr) -> Option<String> {
    debug!(value = %expr.describe(), "storeFile is computed at build time");
    None
}

fn java_version(field: &str, value: &Expr) -> ConfigResult<JavaVersion> {
    let parsed = match &value.kind {
        ExprKind::Path(segments) => match segments.as_slice() {
            [class, constant] if class == "JavaVersion" => JavaVersion::from_constant(constant),
            _ => {
                return Err(ConfigError::malformed(
                    value.location,
                    format!("{} expects a JavaVersion constant, found {}", field, value.describe()),
                ));
            }
        },
        ExprKind::Call {
            receiver: Some(receiver),
            name,
            args,
        } if name == "toString" && args.is_empty() => return java_version(field, receiver),
        ExprKind::Int(n) => u8::try_from(*n)
            .map_err(|_| droidconf_core::Error::UnknownJavaVersion(n.to_string()))
            .and_then(JavaVersion::new),
        ExprKind::Str(text) => JavaVersion::parse_version(text),
        _ => {
            return Err(ConfigError::malformed(
                value.location,
                format!("{} expects a Java version, found {}", field, value.describe()),
            ));
        }
    };
    parsed.map_err(|e| ConfigError::malformed(value.location, format!("{}: {}", field, e)))
}

fn validate_plugin_id(id: &str) -> ConfigResult<()> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier {
            field: "plugins".to_string(),
            message: format!("'{}' is not a valid plugin id", id),
        })
    }
}

fn plugin_from_expr(expr: &Expr) -> ConfigResult<PluginRef> {
    match &expr.kind {
        ExprKind::Infix { lhs, op, rhs } => {
            let mut plugin = plugin_from_expr(lhs)?;
            match (op.as_str(), &rhs.kind) {
                ("version", ExprKind::Str(version)) => plugin.version = Some(version.clone()),
                ("apply", ExprKind::Bool(apply)) => plugin.apply = *apply,
                ("after", ExprKind::Str(dep)) => {
                    validate_plugin_id(dep)?;
                    plugin.after.push(dep.clone());
                }
                _ => {
                    return Err(ConfigError::malformed(
                        rhs.location,
                        format!("unsupported plugin modifier '{} {}'", op, rhs.describe()),
                    ));
                }
            }
            Ok(plugin)
        }
        ExprKind::Call {
            receiver: None,
            name,
            args,
        } if matches!(name.as_str(), "id" | "kotlin") => {
            let [arg] = args.as_slice() else {
                return Err(ConfigError::malformed(
                    expr.location,
                    format!("{}(...) expects exactly one argument", name),
                ));
            };
            let Some(value) = arg.as_str() else {
                return Err(ConfigError::malformed(
                    arg.location,
                    format!("{}(...) expects a string", name),
                ));
            };
            let id = if name == "kotlin" {
                plugins::kotlin_plugin_id(value)
            } else {
                value.to_string()
            };
            validate_plugin_id(&id)?;
            Ok(PluginRef::new(id))
        }
        ExprKind::Path(segments) if segments.len() == 1 => {
            validate_plugin_id(&segments[0])?;
            Ok(PluginRef::new(segments[0].clone()))
        }
        _ => Err(ConfigError::malformed(
            expr.location,
            format!("unsupported plugin declaration '{}'", expr.describe()),
        )),
    }
}
