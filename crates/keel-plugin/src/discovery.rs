// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filesystem discovery of plugin manifests.
//!
//! Each configured root is either a plugin directory itself (it contains a
//! `plugin.toml`) or a parent whose immediate subdirectories are plugins.
//! Missing or unreadable roots are skipped.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::manifest::{RawPluginManifest, MANIFEST_FILE};

/// Where a plugin was found. Later origins override earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginOrigin {
    Builtin,
    External,
    Local,
}

/// Configured discovery roots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginSources {
    pub builtin: Vec<PathBuf>,
    pub external: Vec<PathBuf>,
    pub local: Vec<PathBuf>,
}

impl PluginSources {
    pub fn is_empty(&self) -> bool {
        self.builtin.is_empty() && self.external.is_empty() && self.local.is_empty()
    }

    fn roots(&self) -> impl Iterator<Item = (PluginOrigin, &PathBuf)> {
        self.builtin
            .iter()
            .map(|p| (PluginOrigin::Builtin, p))
            .chain(self.external.iter().map(|p| (PluginOrigin::External, p)))
            .chain(self.local.iter().map(|p| (PluginOrigin::Local, p)))
    }
}

/// A manifest found on disk, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredPlugin {
    pub origin: PluginOrigin,
    /// Path to the `plugin.toml` file.
    pub manifest_path: PathBuf,
    /// Name declared in the manifest, if it could be read.
    pub declared_name: Option<String>,
    pub entry_point: Option<String>,
}

/// Scan every configured root in origin order.
///
/// Within a root, plugin directories are visited in file-name order so the
/// result is deterministic.
pub fn discover(sources: &PluginSources) -> Vec<DiscoveredPlugin> {
    let mut found = Vec::new();
    for (origin, root) in sources.roots() {
        scan_root(origin, root, &mut found);
    }
    debug!(count = found.len(), "plugin discovery complete");
    found
}

fn scan_root(origin: PluginOrigin, root: &Path, found: &mut Vec<DiscoveredPlugin>) {
    let direct = root.join(MANIFEST_FILE);
    if direct.is_file() {
        found.push(describe(origin, direct));
        return;
    }

    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(root = %root.display(), error = %e, "skipping unreadable plugin directory");
            return;
        }
    };

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();

    for dir in dirs {
        let manifest = dir.join(MANIFEST_FILE);
        if manifest.is_file() {
            found.push(describe(origin, manifest));
        }
    }
}

fn describe(origin: PluginOrigin, manifest_path: PathBuf) -> DiscoveredPlugin {
    let raw = fs::read_to_string(&manifest_path)
        .ok()
        .and_then(|content| RawPluginManifest::parse(&content).ok());
    DiscoveredPlugin {
        origin,
        declared_name: raw.as_ref().and_then(|r| r.name()).map(str::to_string),
        entry_point: raw.as_ref().and_then(|r| r.entry_point()).map(str::to_string),
        manifest_path,
    }
}
