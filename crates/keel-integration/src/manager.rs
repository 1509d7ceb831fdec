// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The integration manager: plugin lifecycles and multi-source views.
//!
//! Every multi-source read fans out to all relevant plugins concurrently and
//! waits for each to settle. A failing or slow source only affects its own
//! entry in the result.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use keel_capability::{CapabilityRegistry, CapabilityResult, DebugContext};
use keel_core::{
    Action, ActionResult, Capability, ExecutionTool, Facts, HealthStatus, InformationSource,
    IntegrationConfig, IntegrationType, KeelError, Node, PluginHandle, User, Widget,
};
use keel_plugin::LoadedPlugin;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::health::{HealthCheckCache, HealthCheckScheduler};
use crate::inventory::{
    deduplicate_by_priority, AggregatedInventory, LinkedInventory, NodeData, SourceInfo,
    SourceInventory, SourceStatus,
};
use crate::linking::{self, NodeLinkingService, DEFAULT_AUTHORITATIVE_SOURCE};

/// Tunables for an [`IntegrationManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerOptions {
    /// Upper bound on each fanned-out source call. `None` leaves timing to
    /// the plugins.
    pub source_timeout: Option<Duration>,
    /// Source whose certificate and status fields win during node linking.
    pub authoritative_source: String,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            source_timeout: None,
            authoritative_source: DEFAULT_AUTHORITATIVE_SOURCE.to_string(),
        }
    }
}

/// A per-plugin failure collected during a lifecycle pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginError {
    pub plugin: String,
    pub error: String,
}

/// Listing entry for [`IntegrationManager::list_plugins`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub integration_type: IntegrationType,
    pub enabled: bool,
    pub initialized: bool,
    pub priority: i32,
}

struct Registration {
    handle: PluginHandle,
    config: IntegrationConfig,
}

/// Registered plugins in registration order.
#[derive(Default)]
struct PluginTable {
    entries: HashMap<String, Registration>,
    order: Vec<String>,
}

impl PluginTable {
    fn iter(&self) -> impl Iterator<Item = (usize, &Registration)> {
        self.order
            .iter()
            .enumerate()
            .filter_map(|(position, name)| self.entries.get(name).map(|r| (position, r)))
    }
}

/// A source that currently holds a node, best owner first after sorting.
struct NodeHolder {
    source_name: String,
    priority: i32,
    order: usize,
    source: Arc<dyn InformationSource>,
    node: Node,
}

/// Owns plugin instances for the life of the process.
pub struct IntegrationManager {
    plugins: RwLock<PluginTable>,
    registry: Arc<RwLock<CapabilityRegistry>>,
    health_cache: HealthCheckCache,
    scheduler: HealthCheckScheduler,
    linking: NodeLinkingService,
    source_timeout: Option<Duration>,
    initialized: AtomicBool,
}

impl Default for IntegrationManager {
    fn default() -> Self {
        Self::new(ManagerOptions::default())
    }
}

impl IntegrationManager {
    pub fn new(options: ManagerOptions) -> Self {
        Self::with_registry(Arc::new(RwLock::new(CapabilityRegistry::new())), options)
    }

    /// Build a manager that routes capabilities through a shared registry.
    pub fn with_registry(
        registry: Arc<RwLock<CapabilityRegistry>>,
        options: ManagerOptions,
    ) -> Self {
        Self {
            plugins: RwLock::new(PluginTable::default()),
            registry,
            health_cache: HealthCheckCache::new(),
            scheduler: HealthCheckScheduler::new(),
            linking: NodeLinkingService::new(options.authoritative_source),
            source_timeout: options.source_timeout,
            initialized: AtomicBool::new(false),
        }
    }

    pub fn registry(&self) -> Arc<RwLock<CapabilityRegistry>> {
        self.registry.clone()
    }

    pub fn health_cache(&self) -> &HealthCheckCache {
        &self.health_cache
    }

    pub fn linking_service(&self) -> &NodeLinkingService {
        &self.linking
    }

    /// Whether `initialize_plugins` has completed at least once since the
    /// last `shutdown_all`.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn ensure_initialized(&self) -> Result<(), KeelError> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(KeelError::ManagerNotInitialized)
        }
    }

    // --- registration ---

    /// Register a plugin and the capabilities and widgets it declares.
    ///
    /// Capabilities are registered at `config.priority`. Fails without side
    /// effects on a duplicate name or a malformed capability or widget.
    pub async fn register_plugin(
        &self,
        handle: PluginHandle,
        config: IntegrationConfig,
    ) -> Result<(), KeelError> {
        let capabilities = handle.capabilities();
        let widgets = handle.widgets();
        self.register_with(handle, config, capabilities, widgets).await
    }

    /// Register a plugin produced by the loader.
    ///
    /// Manifest capabilities and widgets are registered along with any the
    /// instance declares itself. Without `config`, the plugin is enabled at
    /// the default priority.
    pub async fn register_loaded_plugin(
        &self,
        plugin: LoadedPlugin,
        config: Option<IntegrationConfig>,
    ) -> Result<(), KeelError> {
        let config = config.unwrap_or_else(|| plugin.default_config());
        let mut capabilities = plugin.capabilities;
        capabilities.extend(plugin.handle.capabilities());
        let mut widgets = plugin.widgets;
        widgets.extend(plugin.handle.widgets());
        self.register_with(plugin.handle, config, capabilities, widgets).await
    }

    async fn register_with(
        &self,
        handle: PluginHandle,
        config: IntegrationConfig,
        capabilities: Vec<Capability>,
        widgets: Vec<Widget>,
    ) -> Result<(), KeelError> {
        let name = handle.name().to_string();
        let mut plugins = self.plugins.write().await;
        if plugins.entries.contains_key(&name) {
            return Err(KeelError::DuplicatePlugin { name });
        }

        {
            let mut registry = self.registry.write().await;
            let capability_count = capabilities.len();
            register_contributions(&mut registry, &name, capabilities, widgets, config.priority)?;
            debug!(
                plugin = %name,
                capabilities = capability_count,
                "plugin capabilities registered"
            );
        }

        info!(
            plugin = %name,
            kind = %handle.kind(),
            priority = config.priority,
            enabled = config.enabled,
            "plugin registered"
        );
        plugins.order.push(name.clone());
        plugins.entries.insert(name, Registration { handle, config });
        Ok(())
    }

    /// Shut a plugin down and drop everything it registered.
    ///
    /// Returns the number of capability registrations removed.
    pub async fn unregister_plugin(&self, name: &str) -> Result<usize, KeelError> {
        let registration = {
            let mut plugins = self.plugins.write().await;
            let registration =
                plugins.entries.remove(name).ok_or_else(|| KeelError::PluginNotFound {
                    kind: "plugin".to_string(),
                    name: name.to_string(),
                })?;
            plugins.order.retain(|n| n != name);
            registration
        };

        let removed = self.registry.write().await.unregister_plugin(name);
        self.health_cache.remove(name).await;
        if let Err(e) = registration.handle.shutdown().await {
            warn!(plugin = %name, error = %e, "plugin shutdown failed during unregister");
        }
        info!(plugin = %name, capabilities = removed, "plugin unregistered");
        Ok(removed)
    }

    // --- lifecycle ---

    /// Initialize every enabled plugin, one at a time in registration order.
    ///
    /// The loader registers plugins after their dependencies, so each plugin
    /// starts only once everything registered before it has finished. A
    /// failure is recorded and never stops the others. The manager counts as
    /// initialized once the pass completes, whatever the individual outcomes.
    pub async fn initialize_plugins(&self) -> Vec<PluginError> {
        let pending: Vec<(String, PluginHandle, IntegrationConfig)> = {
            let plugins = self.plugins.read().await;
            plugins
                .iter()
                .filter_map(|(_, reg)| {
                    if !reg.config.enabled {
                        debug!(
                            plugin = %reg.handle.name(),
                            "plugin disabled, skipping initialization"
                        );
                        return None;
                    }
                    Some((reg.handle.name().to_string(), reg.handle.clone(), reg.config.clone()))
                })
                .collect()
        };

        let mut errors = Vec::new();
        for (name, handle, config) in pending {
            match initialize_one(&handle, config).await {
                Ok(()) => info!(plugin = %name, "plugin initialized"),
                Err(e) => {
                    error!(plugin = %name, error = %e, "plugin initialization failed");
                    errors.push(PluginError {
                        plugin: name,
                        error: e.detail(),
                    });
                }
            }
        }

        self.initialized.store(true, Ordering::SeqCst);
        info!(failed = errors.len(), "plugin initialization complete");
        errors
    }

    /// Stop the scheduler and shut every plugin down, newest first.
    pub async fn shutdown_all(&self) -> Vec<PluginError> {
        self.scheduler.stop().await;

        let handles: Vec<PluginHandle> = {
            let plugins = self.plugins.read().await;
            plugins.iter().map(|(_, reg)| reg.handle.clone()).collect()
        };

        let mut errors = Vec::new();
        for handle in handles.iter().rev() {
            if let Err(e) = handle.shutdown().await {
                warn!(plugin = %handle.name(), error = %e, "plugin shutdown failed");
                errors.push(PluginError {
                    plugin: handle.name().to_string(),
                    error: e.detail(),
                });
            }
        }

        self.initialized.store(false, Ordering::SeqCst);
        info!(plugins = handles.len(), failed = errors.len(), "all plugins shut down");
        errors
    }

    // --- lookup ---

    pub async fn get_plugin(&self, name: &str) -> Option<PluginHandle> {
        self.plugins.read().await.entries.get(name).map(|r| r.handle.clone())
    }

    pub async fn get_information_source(&self, name: &str) -> Option<Arc<dyn InformationSource>> {
        let plugins = self.plugins.read().await;
        plugins.entries.get(name)?.handle.as_information_source().cloned()
    }

    pub async fn get_execution_tool(&self, name: &str) -> Option<Arc<dyn ExecutionTool>> {
        let plugins = self.plugins.read().await;
        plugins.entries.get(name)?.handle.as_execution_tool().cloned()
    }

    /// Information sources in registration order.
    pub async fn get_all_information_sources(&self) -> Vec<Arc<dyn InformationSource>> {
        let plugins = self.plugins.read().await;
        plugins
            .iter()
            .filter_map(|(_, reg)| reg.handle.as_information_source().cloned())
            .collect()
    }

    /// Execution tools in registration order.
    pub async fn get_all_execution_tools(&self) -> Vec<Arc<dyn ExecutionTool>> {
        let plugins = self.plugins.read().await;
        plugins
            .iter()
            .filter_map(|(_, reg)| reg.handle.as_execution_tool().cloned())
            .collect()
    }

    pub async fn list_plugins(&self) -> Vec<PluginSummary> {
        let plugins = self.plugins.read().await;
        plugins
            .iter()
            .map(|(_, reg)| PluginSummary {
                name: reg.handle.name().to_string(),
                integration_type: reg.handle.kind(),
                enabled: reg.config.enabled,
                initialized: reg.handle.is_initialized(),
                priority: reg.config.priority,
            })
            .collect()
    }

    pub async fn plugin_count(&self) -> usize {
        self.plugins.read().await.entries.len()
    }

    // --- execution ---

    /// Run an action on the named execution tool.
    ///
    /// An unknown or uninitialized tool is an error. A failure inside the tool
    /// is reported as a failed [`ActionResult`].
    pub async fn execute_action(
        &self,
        tool_name: &str,
        action: Action,
    ) -> Result<ActionResult, KeelError> {
        let tool = self
            .get_execution_tool(tool_name)
            .await
            .ok_or_else(|| KeelError::PluginNotFound {
                kind: "execution tool".to_string(),
                name: tool_name.to_string(),
            })?;
        if !tool.is_initialized() {
            return Err(KeelError::PluginNotInitialized {
                name: tool_name.to_string(),
            });
        }

        debug!(
            tool = %tool_name,
            action = %action.action,
            targets = action.targets.len(),
            "executing action"
        );
        match tool.execute_action(action.clone()).await {
            Ok(result) => Ok(result),
            Err(e) => {
                error!(tool = %tool_name, error = %e, "action execution failed");
                Ok(ActionResult::failed(&action, e.detail()))
            }
        }
    }

    /// Route a capability call through the registry.
    ///
    /// The registry lock is released before the handler runs.
    pub async fn execute_capability(
        &self,
        user: &User,
        name: &str,
        args: Value,
        debug_context: Option<&DebugContext>,
    ) -> CapabilityResult {
        let prepared = self.registry.read().await.prepare_execution(user, name, debug_context);
        match prepared {
            Ok(prepared) => prepared.run(args).await,
            Err(result) => result,
        }
    }

    // --- aggregation ---

    async fn bounded<T, F>(&self, call: F) -> Result<T, KeelError>
    where
        F: Future<Output = Result<T, KeelError>>,
    {
        match self.source_timeout {
            Some(duration) => tokio::time::timeout(duration, call)
                .await
                .map_err(|_| KeelError::Timeout { duration })?,
            None => call.await,
        }
    }

    /// Enabled, initialized information sources with their ordering keys.
    async fn active_sources(&self) -> Vec<(String, i32, usize, Arc<dyn InformationSource>)> {
        let plugins = self.plugins.read().await;
        plugins
            .iter()
            .filter(|(_, reg)| reg.config.enabled)
            .filter_map(|(order, reg)| {
                let source = reg.handle.as_information_source()?;
                source.is_initialized().then(|| {
                    (reg.handle.name().to_string(), reg.config.priority, order, source.clone())
                })
            })
            .collect()
    }

    /// Query every active source's inventory concurrently, in registration order.
    async fn query_sources(&self) -> Vec<(Arc<dyn InformationSource>, SourceInventory)> {
        let sources = self.active_sources().await;
        join_all(sources.into_iter().map(|(name, priority, order, source)| async move {
            let result = self.bounded(source.get_inventory()).await;
            let last_sync = Utc::now();

            let (nodes, info) = match result {
                Ok(mut nodes) => {
                    for node in &mut nodes {
                        node.source.clone_from(&name);
                    }
                    let status = match self.health_cache.get(&name).await {
                        Some(health) if !health.healthy => SourceStatus::Degraded,
                        _ => SourceStatus::Healthy,
                    };
                    let info = SourceInfo {
                        node_count: nodes.len(),
                        last_sync,
                        status,
                        error: None,
                    };
                    (nodes, info)
                }
                Err(e) => {
                    warn!(source = %name, error = %e, "information source unavailable");
                    let info = SourceInfo {
                        node_count: 0,
                        last_sync,
                        status: SourceStatus::Unavailable,
                        error: Some(e.detail()),
                    };
                    (Vec::new(), info)
                }
            };

            let inventory = SourceInventory {
                name,
                priority,
                order,
                nodes,
                info,
            };
            (source, inventory)
        }))
        .await
    }

    /// Inventory from every source, one record per node id.
    ///
    /// When several sources report the same id, the highest-priority source's
    /// record wins. Failed sources appear as `unavailable` with no nodes.
    pub async fn get_aggregated_inventory(&self) -> Result<AggregatedInventory, KeelError> {
        self.ensure_initialized()?;
        let results = self.query_sources().await;
        let inventories: Vec<SourceInventory> = results.into_iter().map(|(_, inv)| inv).collect();

        let nodes = deduplicate_by_priority(&inventories);
        let sources: BTreeMap<String, SourceInfo> =
            inventories.into_iter().map(|inv| (inv.name, inv.info)).collect();
        info!(nodes = nodes.len(), sources = sources.len(), "inventory aggregated");
        Ok(AggregatedInventory { nodes, sources })
    }

    /// Every source's records before deduplication, in registration order.
    async fn raw_inventory(&self) -> (Vec<Node>, BTreeMap<String, SourceInfo>) {
        let mut nodes = Vec::new();
        let mut sources = BTreeMap::new();
        for (_, inventory) in self.query_sources().await {
            nodes.extend(inventory.nodes);
            sources.insert(inventory.name, inventory.info);
        }
        (nodes, sources)
    }

    /// Inventory merged by node identity across sources.
    pub async fn get_linked_inventory(&self) -> Result<LinkedInventory, KeelError> {
        self.ensure_initialized()?;
        let (raw, sources) = self.raw_inventory().await;
        let nodes = self.linking.link_nodes(&raw);
        info!(records = raw.len(), nodes = nodes.len(), "linked inventory built");
        Ok(LinkedInventory { nodes, sources })
    }

    /// Raw per-source records whose name or id matches `identifier`.
    pub async fn find_matching_nodes(&self, identifier: &str) -> Result<Vec<Node>, KeelError> {
        self.ensure_initialized()?;
        let (raw, _) = self.raw_inventory().await;
        Ok(linking::find_matching_nodes(&raw, identifier))
    }

    /// Sources holding `node_id`, highest priority first.
    async fn locate_node(&self, node_id: &str) -> Result<Vec<NodeHolder>, KeelError> {
        let mut holders: Vec<NodeHolder> = self
            .query_sources()
            .await
            .into_iter()
            .filter_map(|(source, inventory)| {
                let node = inventory
                    .nodes
                    .into_iter()
                    .find(|n| n.id == node_id || n.name == node_id)?;
                Some(NodeHolder {
                    source_name: inventory.name,
                    priority: inventory.priority,
                    order: inventory.order,
                    source,
                    node,
                })
            })
            .collect();

        if holders.is_empty() {
            return Err(KeelError::NodeNotFound {
                node_id: node_id.to_string(),
            });
        }
        holders.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.order.cmp(&b.order)));
        Ok(holders)
    }

    /// The owning source's record for a node plus facts from every source
    /// that has it.
    pub async fn get_node_data(&self, node_id: &str) -> Result<NodeData, KeelError> {
        self.ensure_initialized()?;
        let holders = self.locate_node(node_id).await?;

        let facts: BTreeMap<String, Facts> = join_all(holders.iter().map(|holder| async move {
            let facts = match self.bounded(holder.source.get_node_facts(&holder.node.id)).await {
                Ok(facts) => facts,
                Err(e) => {
                    warn!(
                        source = %holder.source_name,
                        node = %holder.node.id,
                        error = %e,
                        "fact retrieval failed"
                    );
                    Facts::empty(&holder.node.id, &holder.source_name)
                }
            };
            (holder.source_name.clone(), facts)
        }))
        .await
        .into_iter()
        .collect();

        let owner = holders.into_iter().next().map(|h| h.node);
        let node = owner.ok_or_else(|| KeelError::NodeNotFound {
            node_id: node_id.to_string(),
        })?;
        Ok(NodeData { node, facts })
    }

    /// Source-specific data (reports, catalogs, events) from the node's owner.
    pub async fn query_node_data(
        &self,
        node_id: &str,
        data_type: &str,
    ) -> Result<Value, KeelError> {
        self.ensure_initialized()?;
        let holders = self.locate_node(node_id).await?;
        let owner = holders.first().ok_or_else(|| KeelError::NodeNotFound {
            node_id: node_id.to_string(),
        })?;
        debug!(source = %owner.source_name, node = %owner.node.id, data_type, "querying node data");
        self.bounded(owner.source.get_node_data(&owner.node.id, data_type)).await
    }

    // --- health ---

    /// Health of every registered plugin.
    ///
    /// A failing health check becomes an unhealthy status. With `use_cache`,
    /// a cached status is returned instead of calling the plugin.
    pub async fn health_check_all(&self, use_cache: bool) -> BTreeMap<String, HealthStatus> {
        let handles: Vec<PluginHandle> = {
            let plugins = self.plugins.read().await;
            plugins.iter().map(|(_, reg)| reg.handle.clone()).collect()
        };

        join_all(handles.iter().map(|handle| async move {
            let name = handle.name();
            let status = self
                .health_cache
                .get_or_refresh(name, use_cache, || async move {
                    match self.bounded(handle.health_check()).await {
                        Ok(status) => status,
                        Err(e) => {
                            warn!(plugin = %name, error = %e, "health check failed");
                            HealthStatus::unhealthy(format!("health check failed: {}", e.detail()))
                        }
                    }
                })
                .await;
            (name.to_string(), status)
        }))
        .await
        .into_iter()
        .collect()
    }

    pub async fn clear_health_check_cache(&self) {
        self.health_cache.clear().await;
    }

    /// Re-run `health_check_all` every `interval` in the background.
    ///
    /// Returns `false` if the scheduler is already running. The task ends on
    /// its own once the manager is dropped.
    pub fn start_health_check_scheduler(self: &Arc<Self>, interval: Duration) -> bool {
        let manager: Weak<Self> = Arc::downgrade(self);
        self.scheduler.start(interval, move || {
            let manager = manager.clone();
            async move {
                let Some(manager) = manager.upgrade() else {
                    return false;
                };
                let statuses = manager.health_check_all(false).await;
                let unhealthy = statuses.values().filter(|s| !s.healthy).count();
                debug!(plugins = statuses.len(), unhealthy, "scheduled health check complete");
                true
            }
        })
    }

    /// Returns `false` if the scheduler was not running.
    pub async fn stop_health_check_scheduler(&self) -> bool {
        self.scheduler.stop().await
    }

    pub fn is_health_check_scheduler_running(&self) -> bool {
        self.scheduler.is_running()
    }
}

async fn initialize_one(handle: &PluginHandle, config: IntegrationConfig) -> Result<(), KeelError> {
    if config.name != handle.name() {
        return Err(KeelError::Config(format!(
            "configuration name '{}' does not match plugin '{}'",
            config.name,
            handle.name()
        )));
    }
    if config.integration_type != handle.declared_type() {
        return Err(KeelError::Config(format!(
            "configuration type '{}' does not match plugin type '{}'",
            config.integration_type,
            handle.declared_type()
        )));
    }
    handle.initialize(config).await
}

fn register_contributions(
    registry: &mut CapabilityRegistry,
    plugin: &str,
    capabilities: Vec<Capability>,
    widgets: Vec<Widget>,
    priority: i32,
) -> Result<(), KeelError> {
    // The registry may be shared, so nothing is written until every
    // contribution has passed.
    for capability in &capabilities {
        CapabilityRegistry::validate_capability(plugin, capability)?;
    }
    for widget in &widgets {
        CapabilityRegistry::validate_widget(plugin, widget)?;
    }
    for capability in capabilities {
        registry.register_capability_with_priority(plugin, capability, priority)?;
    }
    for widget in widgets {
        registry.register_widget(plugin, widget)?;
    }
    Ok(())
}
