// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a mistyped key is
//! reported at startup instead of silently ignored.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use keel_core::{IntegrationConfig, IntegrationType, DEFAULT_PRIORITY};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Top-level Keel configuration. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KeelConfig {
    /// Where plugin manifests are discovered.
    #[serde(default)]
    pub plugins: PluginsConfig,

    #[serde(default)]
    pub health: HealthConfig,

    #[serde(default)]
    pub aggregation: AggregationConfig,

    #[serde(default)]
    pub linking: LinkingConfig,

    /// Per-plugin settings keyed by plugin name.
    #[serde(default)]
    pub integrations: BTreeMap<String, IntegrationSection>,
}

impl KeelConfig {
    /// The manager-facing configuration for one plugin, if a section exists.
    pub fn integration_config(&self, name: &str) -> Option<IntegrationConfig> {
        self.integrations.get(name).map(|section| IntegrationConfig {
            enabled: section.enabled,
            name: name.to_string(),
            integration_type: section.integration_type,
            priority: section.priority,
            config: section.config.clone(),
        })
    }

    pub fn source_timeout(&self) -> Option<Duration> {
        self.aggregation.source_timeout_secs.map(Duration::from_secs)
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health.interval_secs)
    }
}

/// Plugin discovery roots, scanned in the order builtin, external, local.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PluginsConfig {
    #[serde(default)]
    pub builtin_dirs: Vec<PathBuf>,

    #[serde(default)]
    pub external_dirs: Vec<PathBuf>,

    #[serde(default)]
    pub local_dirs: Vec<PathBuf>,
}

/// Health checking settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HealthConfig {
    /// Run `health_check_all` periodically in the background.
    #[serde(default)]
    pub scheduler_enabled: bool,

    #[serde(default = "default_health_interval_secs")]
    pub interval_secs: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            scheduler_enabled: false,
            interval_secs: default_health_interval_secs(),
        }
    }
}

fn default_health_interval_secs() -> u64 {
    60
}

/// Multi-source query settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AggregationConfig {
    /// Bound on each per-source call. Unset leaves timing to the plugins.
    #[serde(default)]
    pub source_timeout_secs: Option<u64>,
}

/// Node linking settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LinkingConfig {
    /// Source preferred for certificate and status fields.
    #[serde(default = "default_authoritative_source")]
    pub authoritative_source: String,
}

impl Default for LinkingConfig {
    fn default() -> Self {
        Self {
            authoritative_source: default_authoritative_source(),
        }
    }
}

fn default_authoritative_source() -> String {
    "puppetserver".to_string()
}

/// One `[integrations.<name>]` section.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IntegrationSection {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(rename = "type")]
    pub integration_type: IntegrationType,

    #[serde(default = "default_priority")]
    pub priority: i32,

    /// Plugin-specific settings, passed through untouched.
    #[serde(default)]
    pub config: Map<String, Value>,
}

fn default_enabled() -> bool {
    true
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}
