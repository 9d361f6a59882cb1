//! Resolved descriptor output.

use super::{OutputFormat, ResolveArgs};
use anyhow::Result;
use droidconf_core::descriptor::{Binding, BindingSource, BuildDescriptor, SdkBindings};
use std::fmt::{Display, Write};
use std::path::Path;

pub fn run(args: &ResolveArgs, path: &Path, format: OutputFormat) -> Result<()> {
    let descriptor = args.resolve(path)?;
    let output = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&descriptor)?,
        OutputFormat::Text => summary(&descriptor)?,
    };
    println!("{}", output);
    Ok(())
}

/// Human-readable listing with provider values filled in.
fn summary(d: &BuildDescriptor) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    write_summary(&mut out, d)?;
    Ok(out)
}

fn write_summary(out: &mut String, d: &BuildDescriptor) -> std::fmt::Result {
    writeln!(out, "namespace:       {}", d.namespace)?;
    writeln!(out, "applicationId:   {}", d.default_config.application_id)?;
    write_bindings(out, &d.sdk)?;
    write_bindings(out, &d.default_config.sdk)?;
    writeln!(
        out,
        "java:            source {}, target {}",
        d.compatibility.source, d.compatibility.target
    )?;
    if let Some(jvm_target) = d.kotlin.jvm_target {
        writeln!(out, "jvmTarget:       {}", jvm_target)?;
    }
    if let Some(source) = &d.source_root {
        writeln!(out, "flutter source:  {}", source)?;
    }

    writeln!(out, "plugins:")?;
    for plugin in &d.plugins {
        write!(out, "  {}", plugin.id)?;
        if let Some(version) = &plugin.version {
            write!(out, " {}", version)?;
        }
        if !plugin.apply {
            write!(out, " (not applied)")?;
        }
        writeln!(out)?;
    }

    writeln!(out, "build types:")?;
    for (name, build_type) in &d.build_types {
        let signing = build_type.signing_config.as_deref().unwrap_or("-");
        writeln!(out, "  {:<14} signing: {}", name, signing)?;
    }
    Ok(())
}

fn write_bindings(out: &mut String, sdk: &SdkBindings) -> std::fmt::Result {
    write_binding(out, "compileSdk", sdk.compile_sdk.as_ref())?;
    write_binding(out, "minSdk", sdk.min_sdk.as_ref())?;
    write_binding(out, "targetSdk", sdk.target_sdk.as_ref())?;
    write_binding(out, "versionCode", sdk.version_code.as_ref())?;
    write_binding(out, "versionName", sdk.version_name.as_ref())?;
    write_binding(out, "ndkVersion", sdk.ndk_version.as_ref())
}

fn write_binding<T: Display>(
    out: &mut String,
    key: &str,
    binding: Option<&Binding<T>>,
) -> std::fmt::Result {
    let Some(binding) = binding else {
        return Ok(());
    };
    match binding.source {
        BindingSource::Literal => writeln!(out, "{:<16} {}", format!("{}:", key), binding.value),
        BindingSource::Provider(property) => writeln!(
            out,
            "{:<16} {} (flutter.{})",
            format!("{}:", key),
            binding.value,
            property
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::{args, project};

    #[test]
    fn test_summary_marks_provider_values() {
        let (_dir, descriptor) = project(Some("flutter.versionCode=9\n"));
        let d = args().resolve(&descriptor).unwrap();
        let text = summary(&d).unwrap();

        assert!(text.contains("namespace:       com.example.app\n"));
        assert!(text.contains("versionCode:     9 (flutter.versionCode)\n"));
        assert!(text.contains("java:            source 1.8, target 1.8\n"));
        assert!(text.contains("  release        signing: upload\n"));
    }

    #[test]
    fn test_json_output_round_trips() {
        let (_dir, descriptor) = project(Some(""));
        let d = args().resolve(&descriptor).unwrap();
        let json = serde_json::to_string_pretty(&d).unwrap();
        let back: BuildDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}
