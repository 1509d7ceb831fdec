// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin loading for Keel.
//!
//! Plugins are described by a `plugin.toml` manifest and constructed through a
//! [`PluginCatalog`] of compiled-in factories. The [`PluginLoader`] discovers
//! manifests, validates them, constructs instances, and orders them so every
//! plugin follows its dependencies.

pub mod catalog;
pub mod dependency;
pub mod discovery;
pub mod loader;
pub mod manifest;
pub mod validation;

pub use catalog::{PluginCatalog, PluginFactory};
pub use dependency::{resolve_dependencies, DependencyNode};
pub use discovery::{discover, DiscoveredPlugin, PluginOrigin, PluginSources};
pub use loader::{LoadReport, LoadedPlugin, PluginLoader, RejectedPlugin};
pub use manifest::{
    parse_plugin_manifest, CapabilitySpec, PluginManifest, PluginMetadata, RawPluginManifest,
    WidgetSpec, MANIFEST_FILE,
};
pub use validation::{validate_plugin, ValidationResult};
