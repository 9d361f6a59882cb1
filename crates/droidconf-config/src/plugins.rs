//! Plugin application order checks.
//!
//! A plugin may declare that it must be applied after others
//! (`id("b") after "a"`). The declared order is checked, never rearranged:
//! every constraint must name an applied plugin declared earlier, and the
//! constraints must not form a cycle. Plugins marked `apply false` are not
//! applied to the module and take no part in ordering.

use crate::{ConfigError, ConfigResult};
use droidconf_core::descriptor::PluginRef;
use std::collections::HashMap;
use tracing::debug;

pub const ANDROID_APPLICATION: &str = "com.android.application";
pub const ANDROID_LIBRARY: &str = "com.android.library";
pub const KOTLIN_ANDROID: &str = "org.jetbrains.kotlin.android";
pub const KOTLIN_ANDROID_LEGACY: &str = "kotlin-android";
pub const FLUTTER_GRADLE_PLUGIN: &str = "dev.flutter.flutter-gradle-plugin";

/// Rules every module is held to when both sides are applied.
const BUILTIN_RULES: &[(&str, &[&str])] = &[(
    FLUTTER_GRADLE_PLUGIN,
    &[
        ANDROID_APPLICATION,
        ANDROID_LIBRARY,
        KOTLIN_ANDROID,
        KOTLIN_ANDROID_LEGACY,
    ],
)];

/// Expand the `kotlin("...")` shorthand to a full plugin id.
pub fn kotlin_plugin_id(module: &str) -> String {
    format!("org.jetbrains.kotlin.{}", module)
}

/// Check the plugin list against its ordering constraints.
pub fn check_plugin_order(plugins: &[PluginRef], builtin_rules: bool) -> ConfigResult<()> {
    let applied: Vec<&PluginRef> = plugins.iter().filter(|p| p.apply).collect();
    let position: HashMap<&str, usize> = applied
        .iter()
        .enumerate()
        .map(|(i, p)| (p.id.as_str(), i))
        .collect();

    for plugin in &applied {
        for dep in &plugin.after {
            if !position.contains_key(dep.as_str()) {
                return Err(ConfigError::PluginOrder(format!(
                    "plugin '{}' must be applied after '{}', which is not applied",
                    plugin.id, dep
                )));
            }
        }
    }

    if let Err(cycle) = detect_cycle(&applied) {
        return Err(ConfigError::PluginOrder(format!(
            "ordering constraints form a cycle: {}",
            cycle
        )));
    }

    for (index, plugin) in applied.iter().enumerate() {
        for dep in &plugin.after {
            if position[dep.as_str()] > index {
                return Err(ConfigError::PluginOrder(format!(
                    "plugin '{}' must be applied after '{}', but is declared before it",
                    plugin.id, dep
                )));
            }
        }
    }

    if builtin_rules {
        for (id, predecessors) in BUILTIN_RULES {
            let Some(&index) = position.get(id) else {
                continue;
            };
            for dep in predecessors.iter() {
                if let Some(&dep_index) = position.get(dep) {
                    if dep_index > index {
                        return Err(ConfigError::PluginOrder(format!(
                            "plugin '{}' must be applied after '{}'",
                            id, dep
                        )));
                    }
                }
            }
        }
    }

    debug!(plugins = applied.len(), "Plugin order verified");
    Ok(())
}

/// Detect cycles in the `after` graph using DFS.
fn detect_cycle(plugins: &[&PluginRef]) -> Result<(), String> {
    let mut visited = HashMap::new();
    let mut stack = Vec::new();

    let plugin_map: HashMap<&str, &PluginRef> =
        plugins.iter().map(|&p| (p.id.as_str(), p)).collect();

    for &plugin in plugins {
        if !visited.contains_key(plugin.id.as_str()) {
            if let Some(cycle) =
                dfs_detect_cycle(&plugin.id, &plugin_map, &mut visited, &mut stack)
            {
                return Err(cycle);
            }
        }
    }
    Ok(())
}

fn dfs_detect_cycle<'a>(
    node: &'a str,
    plugin_map: &HashMap<&'a str, &'a PluginRef>,
    visited: &mut HashMap<&'a str, bool>,
    stack: &mut Vec<&'a str>,
) -> Option<String> {
    visited.insert(node, true);
    stack.push(node);

    if let Some(&plugin) = plugin_map.get(node) {
        for dep in &plugin.after {
            let dep: &'a str = dep.as_str();
            if let Some(start) = stack.iter().position(|n| *n == dep) {
                let mut path: Vec<&str> = stack[start..].to_vec();
                path.push(dep);
                return Some(path.join(" -> "));
            }
            if !visited.contains_key(dep) {
                if let Some(cycle) = dfs_detect_cycle(dep, plugin_map, visited, stack) {
                    return Some(cycle);
                }
            }
        }
    }

    stack.pop();
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_order_satisfies_constraint() {
        let plugins = vec![PluginRef::new("a"), PluginRef::new("b").after("a")];
        assert!(check_plugin_order(&plugins, true).is_ok());
    }

    #[test]
    fn test_reversed_order_is_violation() {
        let plugins = vec![PluginRef::new("b").after("a"), PluginRef::new("a")];
        let err = check_plugin_order(&plugins, true).unwrap_err();
        assert!(matches!(err, ConfigError::PluginOrder(ref m) if m.contains("declared before")));
    }

    #[test]
    fn test_constraint_on_missing_plugin() {
        let plugins = vec![PluginRef::new("b").after("a")];
        let err = check_plugin_order(&plugins, true).unwrap_err();
        assert!(err.to_string().contains("not applied"));
    }

    #[test]
    fn test_constraint_on_unapplied_plugin() {
        let plugins = vec![
            PluginRef::new("a").applied(false),
            PluginRef::new("b").after("a"),
        ];
        assert!(check_plugin_order(&plugins, true).is_err());
    }

    #[test]
    fn test_cycle_is_reported() {
        let plugins = vec![
            PluginRef::new("a").after("b"),
            PluginRef::new("b").after("a"),
        ];
        let err = check_plugin_order(&plugins, true).unwrap_err();
        assert!(err.to_string().contains("a -> b -> a"));
    }

    #[test]
    fn test_builtin_flutter_rule() {
        let plugins = vec![
            PluginRef::new(FLUTTER_GRADLE_PLUGIN),
            PluginRef::new(ANDROID_APPLICATION),
        ];
        assert!(check_plugin_order(&plugins, true).is_err());
        assert!(check_plugin_order(&plugins, false).is_ok());
    }

    #[test]
    fn test_builtin_rule_ignores_absent_plugins() {
        let plugins = vec![
            PluginRef::new(ANDROID_APPLICATION),
            PluginRef::new(FLUTTER_GRADLE_PLUGIN),
        ];
        assert!(check_plugin_order(&plugins, true).is_ok());
    }

    #[test]
    fn test_kotlin_shorthand() {
        assert_eq!(kotlin_plugin_id("android"), KOTLIN_ANDROID);
    }
}
