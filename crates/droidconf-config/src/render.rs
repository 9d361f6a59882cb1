//! Canonical text output for a [`BuildDescriptor`].
//!
//! Rendering is deterministic: maps are already ordered and every section is
//! written in a fixed order. Bindings that came from the SDK info provider are
//! written back as `flutter.*` references, so resolving the output with the
//! same provider yields the same descriptor.

use crate::resolver::PROVIDER_PREFIX;
use droidconf_core::descriptor::{
    Binding, BindingSource, BuildDescriptor, BuildType, PluginRef, SdkBindings, SigningConfigDecl,
};
use std::fmt::{self, Write};

const INDENT: &str = "    ";

/// Build types and signing configs the Android plugin creates on its own.
const PREDEFINED: &[&str] = &["debug", "release"];

/// Render a descriptor as descriptor text.
pub fn render(descriptor: &BuildDescriptor) -> String {
    let mut out = Writer::default();
    out.descriptor(descriptor);
    out.buf
}

#[derive(Default)]
struct Writer {
    buf: String,
    depth: usize,
}

impl Writer {
    fn line(&mut self, text: impl fmt::Display) {
        for _ in 0..self.depth {
            self.buf.push_str(INDENT);
        }
        // Writing into a String cannot fail.
        let _ = writeln!(self.buf, "{}", text);
    }

    fn blank(&mut self) {
        self.buf.push('\n');
    }

    fn open(&mut self, header: impl fmt::Display) {
        self.line(format_args!("{} {{", header));
        self.depth += 1;
    }

    fn close(&mut self) {
        self.depth -= 1;
        self.line("}");
    }

    fn descriptor(&mut self, d: &BuildDescriptor) {
        self.open("plugins");
        for plugin in &d.plugins {
            self.line(plugin_line(plugin));
        }
        self.close();
        self.blank();

        self.open("android");
        self.line(format_args!("namespace = {}", quote(d.namespace.as_str())));
        self.bindings(&d.sdk);

        self.blank();
        self.open("compileOptions");
        self.line(format_args!(
            "sourceCompatibility = JavaVersion.{}",
            d.compatibility.source.constant_name()
        ));
        self.line(format_args!(
            "targetCompatibility = JavaVersion.{}",
            d.compatibility.target.constant_name()
        ));
        self.close();

        if let Some(jvm_target) = d.kotlin.jvm_target {
            self.blank();
            self.open("kotlinOptions");
            self.line(format_args!(
                "jvmTarget = JavaVersion.{}.toString()",
                jvm_target.constant_name()
            ));
            self.close();
        }

        if !d.signing_configs.is_empty() {
            self.blank();
            self.open("signingConfigs");
            for (name, config) in &d.signing_configs {
                self.signing_config(name, config);
            }
            self.close();
        }

        self.blank();
        self.open("defaultConfig");
        self.line(format_args!(
            "applicationId = {}",
            quote(d.default_config.application_id.as_str())
        ));
        self.bindings(&d.default_config.sdk);
        self.close();

        if !d.build_types.is_empty() {
            self.blank();
            self.open("buildTypes");
            for (name, build_type) in &d.build_types {
                self.build_type(name, build_type);
            }
            self.close();
        }
        self.close();

        if let Some(source) = &d.source_root {
            self.blank();
            self.open("flutter");
            self.line(format_args!("source = {}", quote(source)));
            self.close();
        }
    }

    fn bindings(&mut self, sdk: &SdkBindings) {
        let ints = [
            ("compileSdk", &sdk.compile_sdk),
            ("minSdk", &sdk.min_sdk),
            ("targetSdk", &sdk.target_sdk),
            ("versionCode", &sdk.version_code),
        ];
        for (key, binding) in ints {
            if let Some(binding) = binding {
                self.line(format_args!("{} = {}", key, binding_value(binding, |v| v.to_string())));
            }
        }

        let texts = [("versionName", &sdk.version_name), ("ndkVersion", &sdk.ndk_version)];
        for (key, binding) in texts {
            if let Some(binding) = binding {
                self.line(format_args!("{} = {}", key, binding_value(binding, |v| quote(v))));
            }
        }
    }

    fn signing_config(&mut self, name: &str, config: &SigningConfigDecl) {
        self.open(element_header(name));
        if let Some(store_file) = &config.store_file {
            self.line(format_args!("storeFile = file({})", quote(store_file)));
        }
        if let Some(key_alias) = &config.key_alias {
            self.line(format_args!("keyAlias = {}", quote(key_alias)));
        }
        self.close();
    }

    fn build_type(&mut self, name: &str, build_type: &BuildType) {
        self.open(element_header(name));
        if let Some(signing) = &build_type.signing_config {
            self.line(format_args!(
                "signingConfig = signingConfigs.getByName({})",
                quote(signing)
            ));
        }
        let flags = [
            ("isMinifyEnabled", build_type.minify_enabled),
            ("isShrinkResources", build_type.shrink_resources),
            ("isDebuggable", build_type.debuggable),
        ];
        for (key, value) in flags {
            if let Some(value) = value {
                self.line(format_args!("{} = {}", key, value));
            }
        }
        self.close();
    }
}

fn plugin_line(plugin: &PluginRef) -> String {
    let mut line = format!("id({})", quote(&plugin.id));
    if let Some(version) = &plugin.version {
        line.push_str(" version ");
        line.push_str(&quote(version));
    }
    if !plugin.apply {
        line.push_str(" apply false");
    }
    for dep in &plugin.after {
        line.push_str(" after ");
        line.push_str(&quote(dep));
    }
    line
}

/// `release {` for predefined elements, `create("name") {` otherwise.
fn element_header(name: &str) -> String {
    if PREDEFINED.contains(&name) {
        name.to_string()
    } else {
        format!("create({})", quote(name))
    }
}

fn binding_value<T>(binding: &Binding<T>, literal: impl Fn(&T) -> String) -> String {
    match binding.source {
        BindingSource::Literal => literal(&binding.value),
        BindingSource::Provider(property) => format!("{}.{}", PROVIDER_PREFIX, property.key()),
    }
}

/// Quote a string as a Kotlin literal.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '$' => out.push_str("\\$"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{resolve, Resolver};
    use droidconf_core::descriptor::{Compatibility, DefaultConfig, KotlinOptions};
    use droidconf_core::sdk::SdkValue;
    use droidconf_core::{
        JavaVersion, PackageName, SdkInfoProvider, SdkProperty, StaticSdkInfo,
        StaticSigningConfigStore,
    };
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn sdk() -> StaticSdkInfo {
        StaticSdkInfo::new()
            .with_compile_sdk_version(35)
            .with_min_sdk_version(21)
            .with_target_sdk_version(34)
            .with_version_code(3)
            .with_version_name("2.0.1")
            .with_ndk_version("26.3.11579264")
    }

    fn descriptor() -> BuildDescriptor {
        let mut build_types = BTreeMap::new();
        build_types.insert(
            "release".to_string(),
            BuildType {
                signing_config: Some("upload".to_string()),
                minify_enabled: Some(true),
                ..Default::default()
            },
        );
        build_types.insert("staging qa".to_string(), BuildType::default());

        let mut signing_configs = BTreeMap::new();
        signing_configs.insert(
            "upload".to_string(),
            SigningConfigDecl {
                store_file: Some("keys/upload \"prod\".jks".to_string()),
                key_alias: Some("upload".to_string()),
            },
        );

        BuildDescriptor {
            plugins: vec![
                PluginRef::new("com.android.application"),
                PluginRef::new("org.jetbrains.kotlin.android")
                    .with_version("2.0.0")
                    .after("com.android.application"),
                PluginRef::new("com.google.gms.google-services").applied(false),
                PluginRef::new("dev.flutter.flutter-gradle-plugin"),
            ],
            namespace: PackageName::new("com.example.app").unwrap(),
            sdk: SdkBindings {
                compile_sdk: Some(Binding::provided(SdkProperty::CompileSdkVersion, 35)),
                ndk_version: Some(Binding::literal("27.0.1".to_string())),
                ..Default::default()
            },
            compatibility: Compatibility {
                source: JavaVersion::VERSION_17,
                target: JavaVersion::VERSION_17,
            },
            kotlin: KotlinOptions {
                jvm_target: Some(JavaVersion::VERSION_17),
            },
            default_config: DefaultConfig {
                application_id: PackageName::new("com.example.app.dev").unwrap(),
                sdk: SdkBindings {
                    min_sdk: Some(Binding::literal(23)),
                    target_sdk: Some(Binding::provided(SdkProperty::TargetSdkVersion, 34)),
                    version_name: Some(Binding::provided(SdkProperty::VersionName, "2.0.1".to_string())),
                    ..Default::default()
                },
            },
            build_types,
            signing_configs,
            source_root: Some("../..".to_string()),
        }
    }

    #[test]
    fn test_render_shape() {
        let text = render(&descriptor());
        assert!(text.starts_with("plugins {\n    id(\"com.android.application\")\n"));
        assert!(text.contains(
            "id(\"org.jetbrains.kotlin.android\") version \"2.0.0\" after \"com.android.application\""
        ));
        assert!(text.contains("id(\"com.google.gms.google-services\") apply false"));
        assert!(text.contains("    compileSdk = flutter.compileSdkVersion\n"));
        assert!(text.contains("    ndkVersion = \"27.0.1\"\n"));
        assert!(text.contains("sourceCompatibility = JavaVersion.VERSION_17"));
        assert!(text.contains("jvmTarget = JavaVersion.VERSION_17.toString()"));
        assert!(text.contains("create(\"upload\") {"));
        assert!(text.contains("storeFile = file(\"keys/upload \\\"prod\\\".jks\")"));
        assert!(text.contains("        release {\n"));
        assert!(text.contains("create(\"staging qa\") {"));
        assert!(text.contains("signingConfig = signingConfigs.getByName(\"upload\")"));
        assert!(text.ends_with("flutter {\n    source = \"../..\"\n}\n"));
    }

    #[test]
    fn test_render_is_deterministic() {
        assert_eq!(render(&descriptor()), render(&descriptor()));
    }

    #[test]
    fn test_round_trip_from_descriptor() {
        let original = descriptor();
        let sdk = sdk();
        let store = StaticSigningConfigStore::new();
        let resolved = resolve(&render(&original), &sdk, &store).unwrap();
        assert_eq!(resolved, original);
    }

    #[test]
    fn test_round_trip_from_text() {
        let text = r#"
plugins {
    id("com.android.application")
    kotlin("android")
}

android {
    namespace = "com.example.shop"
    compileSdkVersion(34)
    defaultConfig {
        applicationId = "com.example.shop"
        minSdkVersion(flutter.minSdkVersion)
        versionCode = flutter.versionCode
        versionName = "3.1.4"
    }
    buildTypes {
        getByName("release") {
            signingConfig = signingConfigs.getByName("debug")
            isShrinkResources = false
        }
    }
}
"#;
        let sdk = sdk();
        let store = StaticSigningConfigStore::new();
        let resolver = Resolver::new(&sdk, &store);

        let first = resolver.resolve(text).unwrap();
        let rendered = render(&first);
        let second = resolver.resolve(&rendered).unwrap();
        assert_eq!(first, second);
        assert_eq!(render(&second), rendered);
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("a\"b\\c$d\n"), "\"a\\\"b\\\\c\\$d\\n\"");
    }

    #[test]
    fn test_legacy_java_levels_render_as_constants() {
        let mut d = descriptor();
        d.compatibility = Compatibility::default();
        d.kotlin.jvm_target = None;
        let text = render(&d);
        assert!(text.contains("targetCompatibility = JavaVersion.VERSION_1_8"));
        assert!(!text.contains("kotlinOptions"));
    }

    /// Text covering every escape the renderer emits.
    fn arb_text() -> impl Strategy<Value = String> {
        prop::string::string_regex(r#"[a-zA-Z0-9 ._/"\\$\n\t\ré-]{0,12}"#).unwrap()
    }

    fn arb_plugin_id() -> impl Strategy<Value = String> {
        prop::string::string_regex(r"[a-z][a-z0-9]{0,5}(\.[a-z][a-z0-9_-]{0,5}){1,2}").unwrap()
    }

    /// Unique plugins; `after` only names earlier applied plugins.
    fn arb_plugins() -> impl Strategy<Value = Vec<PluginRef>> {
        prop::collection::btree_set(arb_plugin_id(), 0..5)
            .prop_flat_map(|ids| {
                let n = ids.len();
                (
                    Just(ids.into_iter().collect::<Vec<_>>()).prop_shuffle(),
                    prop::collection::vec(
                        (
                            any::<bool>(),
                            prop::option::of(arb_text()),
                            prop::collection::vec(any::<bool>(), n),
                        ),
                        n,
                    ),
                )
            })
            .prop_map(|(ids, settings)| {
                let mut plugins: Vec<PluginRef> = Vec::new();
                for (id, (apply, version, after)) in ids.into_iter().zip(settings) {
                    let mut plugin = PluginRef::new(id).applied(apply);
                    plugin.version = version;
                    for (earlier, include) in plugins.iter().zip(after) {
                        if include && earlier.apply {
                            plugin.after.push(earlier.id.clone());
                        }
                    }
                    plugins.push(plugin);
                }
                plugins
            })
    }

    fn arb_package() -> impl Strategy<Value = PackageName> {
        prop::string::string_regex(r"[a-z][a-z0-9_]{0,6}(\.[a-z][a-z0-9_]{0,6}){1,3}")
            .unwrap()
            .prop_filter_map("reserved word", |name| PackageName::new(name).ok())
    }

    fn arb_java() -> impl Strategy<Value = JavaVersion> {
        (1u8..=255).prop_map(|major| JavaVersion::new(major).unwrap())
    }

    fn int_binding(property: SdkProperty) -> impl Strategy<Value = Option<Binding<u32>>> {
        let Ok(SdkValue::Int(provided)) = sdk().get(property) else {
            panic!("{} has no int value", property);
        };
        prop_oneof![
            Just(None),
            any::<u32>().prop_map(|value| Some(Binding::literal(value))),
            Just(Some(Binding::provided(property, provided))),
        ]
    }

    fn text_binding(property: SdkProperty) -> impl Strategy<Value = Option<Binding<String>>> {
        let Ok(SdkValue::Text(provided)) = sdk().get(property) else {
            panic!("{} has no text value", property);
        };
        prop_oneof![
            Just(None),
            arb_text().prop_map(|value| Some(Binding::literal(value))),
            Just(Some(Binding::provided(property, provided))),
        ]
    }

    fn arb_bindings() -> impl Strategy<Value = SdkBindings> {
        (
            int_binding(SdkProperty::CompileSdkVersion),
            int_binding(SdkProperty::MinSdkVersion),
            int_binding(SdkProperty::TargetSdkVersion),
            int_binding(SdkProperty::VersionCode),
            text_binding(SdkProperty::VersionName),
            text_binding(SdkProperty::NdkVersion),
        )
            .prop_map(
                |(compile_sdk, min_sdk, target_sdk, version_code, version_name, ndk_version)| {
                    SdkBindings {
                        compile_sdk,
                        min_sdk,
                        target_sdk,
                        version_code,
                        version_name,
                        ndk_version,
                    }
                },
            )
    }

    /// Predefined names render as `debug {`, anything else as `create("...") {`.
    fn arb_element_name() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("debug".to_string()),
            Just("release".to_string()),
            arb_text(),
        ]
    }

    /// Signing configs, and build types that only reference known configs.
    fn arb_signing_and_build_types(
    ) -> impl Strategy<Value = (BTreeMap<String, SigningConfigDecl>, BTreeMap<String, BuildType>)>
    {
        let signing_config = (prop::option::of(arb_text()), prop::option::of(arb_text()))
            .prop_map(|(store_file, key_alias)| SigningConfigDecl {
                store_file,
                key_alias,
            });
        prop::collection::btree_map(arb_element_name(), signing_config, 0..3).prop_flat_map(
            |signing_configs| {
                let mut known: Vec<String> = signing_configs.keys().cloned().collect();
                known.push("debug".to_string());
                let build_type = (
                    prop::option::of(prop::sample::select(known)),
                    prop::option::of(any::<bool>()),
                    prop::option::of(any::<bool>()),
                    prop::option::of(any::<bool>()),
                )
                    .prop_map(
                        |(signing_config, minify_enabled, shrink_resources, debuggable)| {
                            BuildType {
                                signing_config,
                                minify_enabled,
                                shrink_resources,
                                debuggable,
                            }
                        },
                    );
                (
                    Just(signing_configs),
                    prop::collection::btree_map(arb_element_name(), build_type, 0..4),
                )
            },
        )
    }

    fn arb_source_root() -> impl Strategy<Value = String> {
        prop::string::string_regex(r#"[a-z.][a-z0-9 ./"\\$-]{0,10}"#).unwrap()
    }

    fn arb_descriptor() -> impl Strategy<Value = BuildDescriptor> {
        (
            arb_plugins(),
            arb_package(),
            arb_package(),
            arb_bindings(),
            arb_bindings(),
            (arb_java(), arb_java()),
            prop::option::of(arb_java()),
            arb_signing_and_build_types(),
            prop::option::of(arb_source_root()),
        )
            .prop_map(
                |(
                    plugins,
                    namespace,
                    application_id,
                    sdk,
                    default_sdk,
                    (source, target),
                    jvm_target,
                    (signing_configs, build_types),
                    source_root,
                )| BuildDescriptor {
                    plugins,
                    namespace,
                    sdk,
                    compatibility: Compatibility { source, target },
                    kotlin: KotlinOptions { jvm_target },
                    default_config: DefaultConfig {
                        application_id,
                        sdk: default_sdk,
                    },
                    build_types,
                    signing_configs,
                    source_root,
                },
            )
            .prop_filter("needs an SDK binding", |d| {
                !d.sdk.is_empty() || !d.default_config.sdk.is_empty()
            })
    }

    proptest! {
        /// Resolving rendered text gives back the descriptor it came from.
        #[test]
        fn prop_render_then_resolve(d in arb_descriptor()) {
            let text = render(&d);
            let store = StaticSigningConfigStore::new();
            let resolved = resolve(&text, &sdk(), &store).map_err(|e| e.to_string());
            prop_assert_eq!(resolved, Ok(d));
        }

        /// Rendering is stable across a resolve.
        #[test]
        fn prop_render_is_canonical(d in arb_descriptor()) {
            let text = render(&d);
            let store = StaticSigningConfigStore::new();
            let resolved = resolve(&text, &sdk(), &store).map_err(|e| e.to_string());
            prop_assert_eq!(resolved.map(|r| render(&r)), Ok(text));
        }
    }
}
