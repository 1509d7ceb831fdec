// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin loading pipeline.
//!
//! discover -> parse -> validate -> construct -> bind handlers -> order.
//! A bad plugin is reported in [`LoadReport::rejected`] and never aborts the
//! load.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use keel_core::{Capability, IntegrationConfig, KeelError, PluginHandle, Widget};
use tracing::{info, warn};

use crate::catalog::{PluginCatalog, PluginFactory};
use crate::dependency::{resolve_dependencies, DependencyNode};
use crate::discovery::{discover, DiscoveredPlugin, PluginOrigin, PluginSources};
use crate::manifest::{PluginManifest, RawPluginManifest};
use crate::validation::{validate_plugin, ValidationResult};

/// A constructed plugin ready to hand to the integration manager.
#[derive(Debug, Clone)]
pub struct LoadedPlugin {
    pub manifest: PluginManifest,
    pub handle: PluginHandle,
    /// Manifest capabilities bound to the factory's handlers.
    pub capabilities: Vec<Capability>,
    pub widgets: Vec<Widget>,
    pub origin: PluginOrigin,
    pub manifest_path: Option<PathBuf>,
}

impl LoadedPlugin {
    pub fn name(&self) -> &str {
        self.manifest.name()
    }

    /// Enabled configuration with the default priority for this plugin.
    pub fn default_config(&self) -> IntegrationConfig {
        IntegrationConfig::new(self.manifest.name(), self.manifest.plugin.integration_type)
    }
}

impl DependencyNode for LoadedPlugin {
    fn name(&self) -> &str {
        self.manifest.name()
    }

    fn dependencies(&self) -> &[String] {
        &self.manifest.plugin.dependencies
    }
}

/// A plugin that could not be loaded and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedPlugin {
    pub name: Option<String>,
    pub manifest_path: Option<PathBuf>,
    pub errors: Vec<String>,
}

/// Result of [`PluginLoader::load`].
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Dependency-ordered plugins.
    pub loaded: Vec<LoadedPlugin>,
    pub rejected: Vec<RejectedPlugin>,
}

/// Turns configured sources into validated, dependency-ordered plugins.
pub struct PluginLoader {
    sources: PluginSources,
    catalog: PluginCatalog,
}

impl PluginLoader {
    pub fn new(sources: PluginSources, catalog: PluginCatalog) -> Self {
        Self { sources, catalog }
    }

    pub fn catalog(&self) -> &PluginCatalog {
        &self.catalog
    }

    /// Scan the configured sources for manifests.
    pub fn discover(&self) -> Vec<DiscoveredPlugin> {
        discover(&self.sources)
    }

    /// Structural check of a manifest against this loader's catalog.
    pub fn validate_plugin(&self, manifest: &RawPluginManifest) -> ValidationResult {
        validate_plugin(manifest, &self.catalog)
    }

    /// Build a plugin from manifest text (used for compiled-in manifests).
    pub fn load_manifest_str(
        &self,
        content: &str,
        origin: PluginOrigin,
    ) -> Result<LoadedPlugin, RejectedPlugin> {
        self.load_one(content, origin, None)
    }

    /// Discover, validate, construct, and order every plugin.
    ///
    /// When several sources declare the same name, the later origin wins
    /// (local over external over builtin).
    pub fn load(&self) -> LoadReport {
        let mut report = LoadReport::default();
        let mut by_name: HashMap<String, usize> = HashMap::new();
        let mut loaded: Vec<LoadedPlugin> = Vec::new();

        for found in self.discover() {
            let content = match fs::read_to_string(&found.manifest_path) {
                Ok(content) => content,
                Err(e) => {
                    report.rejected.push(RejectedPlugin {
                        name: found.declared_name.clone(),
                        manifest_path: Some(found.manifest_path.clone()),
                        errors: vec![format!("cannot read manifest: {e}")],
                    });
                    continue;
                }
            };

            match self.load_one(&content, found.origin, Some(found.manifest_path.clone())) {
                Ok(plugin) => match by_name.get(plugin.name()) {
                    Some(&index) => {
                        warn!(
                            plugin = %plugin.name(),
                            replaced = ?loaded[index].origin,
                            by = ?plugin.origin,
                            "plugin declared by several sources; later source wins"
                        );
                        loaded[index] = plugin;
                    }
                    None => {
                        by_name.insert(plugin.name().to_string(), loaded.len());
                        loaded.push(plugin);
                    }
                },
                Err(rejected) => report.rejected.push(rejected),
            }
        }

        report.loaded = resolve_dependencies(loaded);
        info!(
            loaded = report.loaded.len(),
            rejected = report.rejected.len(),
            "plugin load complete"
        );
        report
    }

    fn load_one(
        &self,
        content: &str,
        origin: PluginOrigin,
        manifest_path: Option<PathBuf>,
    ) -> Result<LoadedPlugin, RejectedPlugin> {
        let reject = |name: Option<String>, errors: Vec<String>| {
            warn!(
                plugin = name.as_deref().unwrap_or("<unnamed>"),
                path = ?manifest_path,
                errors = ?errors,
                "skipping invalid plugin"
            );
            RejectedPlugin {
                name,
                manifest_path: manifest_path.clone(),
                errors,
            }
        };

        let raw = RawPluginManifest::parse(content).map_err(|e| reject(None, vec![e.to_string()]))?;
        let declared = raw.name().map(str::to_string);

        let validation = self.validate_plugin(&raw);
        for warning in &validation.warnings {
            warn!(plugin = declared.as_deref().unwrap_or("<unnamed>"), "{warning}");
        }
        if !validation.valid {
            return Err(reject(declared, validation.errors));
        }

        let manifest = raw
            .into_manifest()
            .map_err(|e| reject(declared.clone(), vec![e.to_string()]))?;
        let factory = self
            .catalog
            .get(manifest.entry_point())
            .ok_or_else(|| {
                reject(
                    declared.clone(),
                    vec![format!("no constructor for entry point '{}'", manifest.entry_point())],
                )
            })?;

        let handle = factory
            .create(&manifest)
            .map_err(|e| reject(declared.clone(), vec![format!("constructor failed: {e}")]))?;
        check_identity(&manifest, &handle)
            .map_err(|e| reject(declared.clone(), vec![e.to_string()]))?;

        let capabilities = bind_capabilities(&manifest, factory.as_ref())
            .map_err(|e| reject(declared.clone(), vec![e.to_string()]))?;
        let widgets = manifest.widgets();

        Ok(LoadedPlugin {
            manifest,
            handle,
            capabilities,
            widgets,
            origin,
            manifest_path,
        })
    }
}

/// The constructed instance must match the manifest's name and type.
fn check_identity(manifest: &PluginManifest, handle: &PluginHandle) -> Result<(), KeelError> {
    if handle.name() != manifest.name() {
        return Err(KeelError::Config(format!(
            "constructor produced plugin '{}' for manifest '{}'",
            handle.name(),
            manifest.name()
        )));
    }
    if handle.kind() != manifest.plugin.integration_type {
        return Err(KeelError::Config(format!(
            "plugin '{}' declares type '{}' but its constructor produced '{}'",
            manifest.name(),
            manifest.plugin.integration_type,
            handle.kind()
        )));
    }
    Ok(())
}

fn bind_capabilities(
    manifest: &PluginManifest,
    factory: &dyn PluginFactory,
) -> Result<Vec<Capability>, KeelError> {
    manifest
        .capabilities
        .iter()
        .map(|spec| {
            let handler =
                factory.handler(&spec.handler).ok_or_else(|| KeelError::InvalidCapability {
                    name: spec.name.clone(),
                    reason: format!("handler '{}' is not exported", spec.handler),
                })?;
            let mut capability = Capability::new(spec.name.clone(), spec.risk_level, handler)
                .with_description(spec.description.clone())
                .with_permissions(spec.required_permissions.iter().cloned());
            if let Some(category) = &spec.category {
                capability = capability.with_category(category.clone());
            }
            Ok(capability)
        })
        .collect()
}
