// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin manifest parsing from `plugin.toml` files.
//!
//! Manifests are read in two stages. [`RawPluginManifest`] only requires the
//! file to be valid TOML so that validation can report every structural
//! defect at once. A manifest that validates is then converted into the
//! typed [`PluginManifest`].

use keel_core::{IntegrationType, KeelError, RiskLevel, Widget, WidgetSize, DEFAULT_PRIORITY};
use serde::{Deserialize, Serialize};

/// File name looked up in each plugin directory.
pub const MANIFEST_FILE: &str = "plugin.toml";

/// A syntactically valid but structurally unchecked manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPluginManifest {
    pub(crate) table: toml::Table,
}

impl RawPluginManifest {
    /// Parse TOML content without checking the manifest structure.
    pub fn parse(toml_content: &str) -> Result<Self, KeelError> {
        let table: toml::Table = toml::from_str(toml_content)
            .map_err(|e| KeelError::Config(format!("invalid plugin manifest: {e}")))?;
        Ok(Self { table })
    }

    pub(crate) fn metadata(&self) -> Option<&toml::Table> {
        self.table.get("plugin").and_then(toml::Value::as_table)
    }

    fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata()
            .and_then(|m| m.get(key))
            .and_then(toml::Value::as_str)
    }

    /// Declared plugin name, if present.
    pub fn name(&self) -> Option<&str> {
        self.metadata_str("name")
    }

    /// Constructor key; defaults to the plugin name.
    pub fn entry_point(&self) -> Option<&str> {
        self.metadata_str("entry").or_else(|| self.name())
    }

    /// Convert into the typed manifest.
    pub fn into_manifest(self) -> Result<PluginManifest, KeelError> {
        toml::Value::Table(self.table)
            .try_into()
            .map_err(|e| KeelError::Config(format!("invalid plugin manifest: {e}")))
    }
}

/// Typed plugin manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginManifest {
    pub plugin: PluginMetadata,
    pub capabilities: Vec<CapabilitySpec>,
    #[serde(default)]
    pub widgets: Vec<WidgetSpec>,
}

/// The `[plugin]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginMetadata {
    pub name: String,
    pub version: String,
    pub author: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub integration_type: IntegrationType,
    pub entry: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// One `[[capabilities]]` entry. The handler is bound by name at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilitySpec {
    pub name: String,
    pub category: Option<String>,
    #[serde(default)]
    pub description: String,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub required_permissions: Vec<String>,
    pub handler: String,
}

/// One `[[widgets]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetSpec {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slots: Vec<String>,
    #[serde(default)]
    pub required_capabilities: Vec<String>,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default)]
    pub size: WidgetSize,
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

impl PluginManifest {
    pub fn name(&self) -> &str {
        &self.plugin.name
    }

    pub fn entry_point(&self) -> &str {
        self.plugin.entry.as_deref().unwrap_or(&self.plugin.name)
    }

    /// Parsed semantic version, if the version string is valid semver.
    pub fn semver(&self) -> Option<semver::Version> {
        semver::Version::parse(&self.plugin.version).ok()
    }

    pub fn widgets(&self) -> Vec<Widget> {
        self.widgets.iter().map(WidgetSpec::to_widget).collect()
    }
}

impl WidgetSpec {
    pub fn to_widget(&self) -> Widget {
        let name = if self.name.is_empty() {
            self.id.clone()
        } else {
            self.name.clone()
        };
        Widget::new(self.id.clone(), name)
            .with_slots(self.slots.iter().cloned())
            .with_required_capabilities(self.required_capabilities.iter().cloned())
            .with_priority(self.priority)
            .with_size(self.size)
    }
}

/// Parse and convert a manifest without structural validation.
///
/// Prefer [`crate::validate_plugin`] followed by
/// [`RawPluginManifest::into_manifest`] when the source is untrusted.
pub fn parse_plugin_manifest(toml_content: &str) -> Result<PluginManifest, KeelError> {
    RawPluginManifest::parse(toml_content)?.into_manifest()
}
