// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structural validation of plugin manifests.
//!
//! Collects every defect instead of failing fast. A plugin is valid iff no
//! errors were found; warnings never affect validity.

use std::collections::HashSet;
use std::str::FromStr;

use keel_core::{is_valid_capability_name, IntegrationType, RiskLevel};
use serde::Serialize;

use crate::catalog::{PluginCatalog, PluginFactory};
use crate::manifest::RawPluginManifest;

/// Lifecycle methods a constructed plugin must provide.
const LIFECYCLE_METHODS: &[&str] = &["initialize", "health_check", "config", "is_initialized"];

/// Outcome of [`validate_plugin`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    fn from_findings(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// Check a manifest against the plugin contract.
///
/// The catalog resolves the entry point (which supplies the lifecycle methods
/// through the plugin traits) and the named capability handlers.
pub fn validate_plugin(manifest: &RawPluginManifest, catalog: &PluginCatalog) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    validate_metadata(manifest, &mut errors, &mut warnings);

    let factory = match manifest.entry_point() {
        Some(entry) => {
            let factory = catalog.get(entry);
            if factory.is_none() {
                errors.push(format!(
                    "entry point '{entry}' does not resolve to a registered constructor; \
                     missing lifecycle methods: {}",
                    LIFECYCLE_METHODS.join(", ")
                ));
            }
            factory
        }
        None => {
            errors.push(format!(
                "no entry point declared; missing lifecycle methods: {}",
                LIFECYCLE_METHODS.join(", ")
            ));
            None
        }
    };

    validate_capabilities(manifest, factory.map(|f| f.as_ref()), &mut errors, &mut warnings);
    validate_widgets(manifest, &mut errors, &mut warnings);

    ValidationResult::from_findings(errors, warnings)
}

fn non_empty_str<'a>(table: &'a toml::Table, key: &str) -> Option<&'a str> {
    table
        .get(key)
        .and_then(toml::Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn is_string_array(value: &toml::Value) -> bool {
    value
        .as_array()
        .is_some_and(|items| items.iter().all(toml::Value::is_str))
}

fn validate_metadata(
    manifest: &RawPluginManifest,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    let Some(meta) = manifest.metadata() else {
        errors.push("missing [plugin] metadata section".to_string());
        return;
    };

    if non_empty_str(meta, "name").is_none() {
        errors.push("plugin.name is required and must not be empty".to_string());
    }
    if non_empty_str(meta, "version").is_none() {
        errors.push("plugin.version is required and must not be empty".to_string());
    }
    if non_empty_str(meta, "author").is_none() {
        warnings.push("plugin.author is not set".to_string());
    }

    match meta.get("type").and_then(toml::Value::as_str) {
        Some(t) if IntegrationType::from_str(t).is_ok() => {}
        Some(t) => errors.push(format!(
            "plugin.type '{t}' is invalid (expected information, execution, or both)"
        )),
        None => {
            errors.push("plugin.type is required (information, execution, or both)".to_string())
        }
    }

    if let Some(deps) = meta.get("dependencies")
        && !is_string_array(deps)
    {
        errors.push("plugin.dependencies must be an array of plugin names".to_string());
    }
}

fn validate_capabilities(
    manifest: &RawPluginManifest,
    factory: Option<&dyn PluginFactory>,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    let Some(items) = manifest.table.get("capabilities").and_then(toml::Value::as_array) else {
        errors.push("capabilities must be an array".to_string());
        return;
    };

    let mut seen = HashSet::new();
    for (index, item) in items.iter().enumerate() {
        let Some(cap) = item.as_table() else {
            errors.push(format!("capabilities[{index}] must be a table"));
            continue;
        };

        let name = match non_empty_str(cap, "name") {
            Some(name) => {
                if !is_valid_capability_name(name) {
                    errors.push(format!(
                        "capability '{name}' must be a dot-delimited name such as 'command.execute'"
                    ));
                }
                if !seen.insert(name) {
                    warnings.push(format!("capability '{name}' is declared more than once"));
                }
                name.to_string()
            }
            None => {
                errors.push(format!("capabilities[{index}] is missing a name"));
                format!("capabilities[{index}]")
            }
        };

        match non_empty_str(cap, "handler") {
            None => errors.push(format!("capability '{name}' has no callable handler")),
            Some(handler) => {
                if let Some(factory) = factory
                    && factory.handler(handler).is_none()
                {
                    errors.push(format!(
                        "capability '{name}' has no callable handler: \
                         '{handler}' is not exported by '{}'",
                        factory.entry_point()
                    ));
                }
            }
        }

        match cap.get("risk_level").and_then(toml::Value::as_str) {
            Some(level) if RiskLevel::from_str(level).is_ok() => {}
            Some(level) => errors.push(format!(
                "capability '{name}' has invalid risk level '{level}' \
                 (expected read, write, execute, or admin)"
            )),
            None => errors.push(format!("capability '{name}' is missing a risk level")),
        }

        if let Some(perms) = cap.get("required_permissions")
            && !is_string_array(perms)
        {
            errors.push(format!(
                "capability '{name}' required_permissions must be an array of strings"
            ));
        }
    }
}

fn validate_widgets(
    manifest: &RawPluginManifest,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    let Some(value) = manifest.table.get("widgets") else {
        return;
    };
    let Some(items) = value.as_array() else {
        errors.push("widgets must be an array".to_string());
        return;
    };
    let prefix = manifest.name().map(|n| format!("{n}:"));

    for (index, item) in items.iter().enumerate() {
        let Some(widget) = item.as_table() else {
            errors.push(format!("widgets[{index}] must be a table"));
            continue;
        };
        let Some(id) = non_empty_str(widget, "id") else {
            errors.push(format!("widgets[{index}] is missing an id"));
            continue;
        };
        if let Some(prefix) = &prefix
            && !(id.starts_with(prefix.as_str()) && id.len() > prefix.len())
        {
            errors.push(format!("widget '{id}' must have an id of the form '{prefix}<slug>'"));
        }
        let has_slots = widget
            .get("slots")
            .and_then(toml::Value::as_array)
            .is_some_and(|slots| !slots.is_empty());
        if !has_slots {
            warnings.push(format!("widget '{id}' declares no slots and will never be shown"));
        }
    }
}
