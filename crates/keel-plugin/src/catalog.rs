// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static catalog of plugin constructors.
//!
//! Plugins are compiled in; discovery only finds manifests. The catalog maps
//! a manifest's entry point to the [`PluginFactory`] that builds the instance
//! and supplies its capability handlers by name.

use std::collections::HashMap;
use std::sync::Arc;

use keel_core::{CapabilityHandler, KeelError, PluginHandle};

use crate::manifest::PluginManifest;

/// Constructor for one kind of plugin.
pub trait PluginFactory: Send + Sync {
    /// Key matched against a manifest's `entry` (or name).
    fn entry_point(&self) -> &str;

    /// Resolve a capability handler exported under `name`.
    fn handler(&self, name: &str) -> Option<Arc<dyn CapabilityHandler>>;

    /// Build a plugin instance for a validated manifest.
    fn create(&self, manifest: &PluginManifest) -> Result<PluginHandle, KeelError>;
}

/// Registry of known plugin constructors keyed by entry point.
pub struct PluginCatalog {
    factories: HashMap<String, Arc<dyn PluginFactory>>,
}

impl PluginCatalog {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a factory. A factory with the same entry point is replaced.
    pub fn register(&mut self, factory: Arc<dyn PluginFactory>) {
        self.factories
            .insert(factory.entry_point().to_string(), factory);
    }

    pub fn get(&self, entry_point: &str) -> Option<&Arc<dyn PluginFactory>> {
        self.factories.get(entry_point)
    }

    pub fn contains(&self, entry_point: &str) -> bool {
        self.factories.contains_key(entry_point)
    }

    /// All entry points, sorted.
    pub fn entry_points(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Entry points containing `query` (case-insensitive). Empty query returns all.
    pub fn search(&self, query: &str) -> Vec<&str> {
        let query = query.to_lowercase();
        self.entry_points()
            .into_iter()
            .filter(|e| query.is_empty() || e.to_lowercase().contains(&query))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl Default for PluginCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PluginCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginCatalog")
            .field("entry_points", &self.entry_points())
            .finish()
    }
}
