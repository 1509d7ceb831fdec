// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Startup wiring: configuration to loaded, registered, initialized plugins.

use std::sync::Arc;

use keel_config::KeelConfig;
use keel_plugin::{PluginCatalog, PluginLoader, PluginSources, RejectedPlugin};
use serde::Serialize;
use tracing::{info, warn};

use crate::manager::{IntegrationManager, ManagerOptions, PluginError};

impl From<&KeelConfig> for ManagerOptions {
    fn from(config: &KeelConfig) -> Self {
        Self {
            source_timeout: config.source_timeout(),
            authoritative_source: config.linking.authoritative_source.clone(),
        }
    }
}

/// Discovery roots from the `[plugins]` section.
pub fn plugin_sources(config: &KeelConfig) -> PluginSources {
    PluginSources {
        builtin: config.plugins.builtin_dirs.clone(),
        external: config.plugins.external_dirs.clone(),
        local: config.plugins.local_dirs.clone(),
    }
}

/// Everything that went wrong during [`start`], none of it fatal.
#[derive(Debug, Default, Serialize)]
pub struct StartupReport {
    pub loaded: Vec<String>,
    pub rejected: Vec<String>,
    pub registration_errors: Vec<PluginError>,
    pub init_errors: Vec<PluginError>,
    pub scheduler_started: bool,
}

impl StartupReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
            && self.registration_errors.is_empty()
            && self.init_errors.is_empty()
    }
}

fn describe_rejection(rejected: &RejectedPlugin) -> String {
    let who = rejected
        .name
        .clone()
        .or_else(|| rejected.manifest_path.as_ref().map(|p| p.display().to_string()))
        .unwrap_or_else(|| "<unknown>".to_string());
    format!("{who}: {}", rejected.errors.join("; "))
}

/// Load plugins from the configured roots, register them in dependency
/// order, initialize them, and start the health scheduler if enabled.
///
/// Plugins with an `[integrations.<name>]` section use it; the rest run
/// enabled at the default priority.
pub async fn start(
    config: &KeelConfig,
    catalog: PluginCatalog,
) -> (Arc<IntegrationManager>, StartupReport) {
    let load = PluginLoader::new(plugin_sources(config), catalog).load();
    let manager = Arc::new(IntegrationManager::new(ManagerOptions::from(config)));
    let mut report = StartupReport {
        rejected: load.rejected.iter().map(describe_rejection).collect(),
        ..StartupReport::default()
    };

    for plugin in load.loaded {
        let name = plugin.name().to_string();
        let settings = config.integration_config(&name);
        match manager.register_loaded_plugin(plugin, settings).await {
            Ok(()) => report.loaded.push(name),
            Err(e) => {
                warn!(plugin = %name, error = %e, "plugin registration failed");
                report.registration_errors.push(PluginError {
                    plugin: name,
                    error: e.to_string(),
                });
            }
        }
    }

    report.init_errors = manager.initialize_plugins().await;
    if config.health.scheduler_enabled {
        report.scheduler_started = manager.start_health_check_scheduler(config.health_interval());
    }

    info!(
        loaded = report.loaded.len(),
        rejected = report.rejected.len(),
        failed = report.registration_errors.len() + report.init_errors.len(),
        "integration kernel started"
    );
    (manager, report)
}
