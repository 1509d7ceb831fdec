// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability routing table.
//!
//! The [`CapabilityRegistry`] maps capability names to an ordered list of
//! [`CapabilityProvider`] bindings. Providers for one name are kept sorted by
//! priority (descending), with ties in registration order, so the head of the
//! list is always the primary provider.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use keel_core::{
    validate_capability_name, Capability, CapabilityHandler, CapabilityInfo, ExecutionContext,
    KeelError, RiskLevel, User, DEFAULT_PRIORITY,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::result::{
    CapabilityErrorCode, CapabilityOutput, CapabilityResult, DebugContext, DebugInfo,
};
use crate::widget::RegisteredWidget;

/// A (plugin, capability, priority) binding.
#[derive(Debug, Clone)]
pub struct CapabilityProvider {
    pub plugin_name: String,
    pub capability: Capability,
    pub priority: i32,
}

/// Filter for [`CapabilityRegistry::get_all_capabilities`].
#[derive(Debug, Clone, Default)]
pub struct CapabilityFilter {
    pub category: Option<String>,
    pub risk_level: Option<RiskLevel>,
    pub plugin_name: Option<String>,
    /// Keep entries the user is not authorized for (marked `authorized: false`).
    pub include_unauthorized: bool,
}

/// One provider entry in a capability listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityListing {
    pub plugin_name: String,
    pub priority: i32,
    #[serde(flatten)]
    pub capability: CapabilityInfo,
    pub authorized: bool,
}

/// Aggregate counters over the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    /// Distinct capability names.
    pub total_capabilities: usize,
    pub total_providers: usize,
    pub total_widgets: usize,
    /// Distinct plugins owning at least one provider or widget.
    pub plugin_count: usize,
    pub capabilities_by_category: BTreeMap<String, usize>,
    pub capabilities_by_risk_level: BTreeMap<RiskLevel, usize>,
}

/// A resolved, authorized capability call ready to run.
///
/// Produced by [`CapabilityRegistry::prepare_execution`] so callers holding the
/// registry behind a lock can release it before awaiting the handler.
pub struct PreparedExecution {
    handler: Arc<dyn CapabilityHandler>,
    context: ExecutionContext,
    debug: Option<DebugInfo>,
}

impl PreparedExecution {
    pub fn plugin_name(&self) -> &str {
        &self.context.plugin_name
    }

    pub fn correlation_id(&self) -> &str {
        &self.context.correlation_id
    }

    /// Invoke the handler, timing it and converting failure into data.
    pub async fn run(self, args: Value) -> CapabilityResult {
        let plugin_name = self.context.plugin_name.clone();
        let capability_name = self.context.capability_name.clone();
        let started = Instant::now();

        let outcome = self.handler.handle(args, self.context).await;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match outcome {
            Ok(data) => {
                debug!(
                    capability = %capability_name,
                    plugin = %plugin_name,
                    duration_ms,
                    "capability executed"
                );
                CapabilityResult {
                    outcome: Ok(CapabilityOutput {
                        data,
                        handled_by: plugin_name,
                        duration_ms,
                    }),
                    debug: self.debug,
                }
            }
            Err(e) => {
                error!(
                    capability = %capability_name,
                    plugin = %plugin_name,
                    error = %e,
                    "capability handler failed"
                );
                CapabilityResult::failure(
                    CapabilityErrorCode::ExecutionError,
                    e.detail(),
                    self.debug,
                )
            }
        }
    }
}

/// Routing table from capability name to ordered providers, plus widgets.
pub struct CapabilityRegistry {
    pub(crate) capabilities: HashMap<String, Vec<CapabilityProvider>>,
    pub(crate) widgets: HashMap<String, RegisteredWidget>,
    /// Reverse index: capability name -> widget ids requiring it.
    pub(crate) widgets_by_capability: HashMap<String, BTreeSet<String>>,
    pub(crate) next_widget_seq: u64,
}

impl CapabilityRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            capabilities: HashMap::new(),
            widgets: HashMap::new(),
            widgets_by_capability: HashMap::new(),
            next_widget_seq: 0,
        }
    }

    /// Register a capability at the default priority.
    pub fn register_capability(
        &mut self,
        plugin_name: &str,
        capability: Capability,
    ) -> Result<(), KeelError> {
        self.register_capability_with_priority(plugin_name, capability, DEFAULT_PRIORITY)
    }

    /// Register a capability provider with an explicit priority.
    ///
    /// A plugin re-registering the same name replaces its previous binding and
    /// moves to the back of its priority tier.
    pub fn register_capability_with_priority(
        &mut self,
        plugin_name: &str,
        capability: Capability,
        priority: i32,
    ) -> Result<(), KeelError> {
        Self::validate_capability(plugin_name, &capability)?;

        let name = capability.name.clone();
        let providers = self.capabilities.entry(name.clone()).or_default();
        providers.retain(|p| p.plugin_name != plugin_name);

        // Insert after every provider of equal or higher priority.
        let position = providers
            .iter()
            .position(|p| p.priority < priority)
            .unwrap_or(providers.len());
        providers.insert(
            position,
            CapabilityProvider {
                plugin_name: plugin_name.to_string(),
                capability,
                priority,
            },
        );

        debug!(
            capability = %name,
            plugin = %plugin_name,
            priority,
            providers = providers.len(),
            "capability registered"
        );
        Ok(())
    }

    /// The checks `register_capability_with_priority` applies, without
    /// touching the table.
    pub fn validate_capability(
        plugin_name: &str,
        capability: &Capability,
    ) -> Result<(), KeelError> {
        validate_capability_name(&capability.name)?;
        if plugin_name.trim().is_empty() {
            return Err(KeelError::InvalidCapability {
                name: capability.name.clone(),
                reason: "provider plugin name must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Remove one plugin's binding for `name`. Returns whether one existed.
    pub fn unregister_capability(&mut self, plugin_name: &str, name: &str) -> bool {
        let Some(providers) = self.capabilities.get_mut(name) else {
            return false;
        };
        let before = providers.len();
        providers.retain(|p| p.plugin_name != plugin_name);
        let removed = providers.len() != before;
        if providers.is_empty() {
            self.capabilities.remove(name);
        }
        removed
    }

    /// Remove every provider and widget owned by `plugin_name`.
    ///
    /// Returns the number of capability registrations removed.
    pub fn unregister_plugin(&mut self, plugin_name: &str) -> usize {
        let mut removed = 0;
        self.capabilities.retain(|_, providers| {
            let before = providers.len();
            providers.retain(|p| p.plugin_name != plugin_name);
            removed += before - providers.len();
            !providers.is_empty()
        });

        let owned: Vec<String> = self
            .widgets
            .values()
            .filter(|w| w.plugin_name == plugin_name)
            .map(|w| w.widget.id.clone())
            .collect();
        for id in &owned {
            self.unregister_widget(id);
        }

        info!(
            plugin = %plugin_name,
            capabilities = removed,
            widgets = owned.len(),
            "plugin unregistered from capability registry"
        );
        removed
    }

    /// Providers for `name`, primary first. Empty if none are registered.
    pub fn get_providers_for_capability(&self, name: &str) -> &[CapabilityProvider] {
        self.capabilities
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The highest-priority provider for `name`.
    pub fn get_primary_provider(&self, name: &str) -> Option<&CapabilityProvider> {
        self.capabilities.get(name).and_then(|p| p.first())
    }

    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities.contains_key(name)
    }

    /// All registered capability names, sorted.
    pub fn capability_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.capabilities.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Whether `user` may invoke the primary provider of `name`.
    ///
    /// Unknown capabilities are never authorized.
    pub fn is_authorized(&self, user: &User, name: &str) -> bool {
        self.get_primary_provider(name)
            .is_some_and(|p| user.is_authorized_for(&p.capability.required_permissions))
    }

    /// Every provider of every capability, annotated with authorization.
    ///
    /// Without a user every entry is marked authorized; this listing is not
    /// itself an authorization boundary. Sorted by capability name, then
    /// provider order.
    pub fn get_all_capabilities(
        &self,
        user: Option<&User>,
        filter: &CapabilityFilter,
    ) -> Vec<CapabilityListing> {
        let mut listings = Vec::new();
        for name in self.capability_names() {
            for provider in self.get_providers_for_capability(name) {
                let cap = &provider.capability;
                if filter.category.as_ref().is_some_and(|c| c != &cap.category)
                    || filter.risk_level.is_some_and(|r| r != cap.risk_level)
                    || filter
                        .plugin_name
                        .as_ref()
                        .is_some_and(|p| p != &provider.plugin_name)
                {
                    continue;
                }

                let authorized =
                    user.is_none_or(|u| u.is_authorized_for(&cap.required_permissions));
                if !authorized && !filter.include_unauthorized {
                    continue;
                }

                listings.push(CapabilityListing {
                    plugin_name: provider.plugin_name.clone(),
                    priority: provider.priority,
                    capability: cap.info(),
                    authorized,
                });
            }
        }
        listings
    }

    /// Resolve and authorize a call without running it.
    ///
    /// Returns the failure result directly when the capability is unknown or
    /// the user is not authorized.
    pub fn prepare_execution(
        &self,
        user: &User,
        name: &str,
        debug_context: Option<&DebugContext>,
    ) -> Result<PreparedExecution, CapabilityResult> {
        let correlation_id = debug_context
            .and_then(|d| d.correlation_id.clone())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let providers = self.get_providers_for_capability(name);
        let primary = providers.first();

        let debug = debug_context.map(|_| DebugInfo {
            correlation_id: correlation_id.clone(),
            capability_name: name.to_string(),
            plugin_name: primary.map(|p| p.plugin_name.clone()),
            providers_count: providers.len(),
        });

        let Some(provider) = primary else {
            warn!(capability = %name, "capability not found");
            return Err(CapabilityResult::failure(
                CapabilityErrorCode::CapabilityNotFound,
                format!("capability '{name}' is not registered"),
                debug,
            ));
        };

        let required = &provider.capability.required_permissions;
        if !user.is_authorized_for(required) {
            warn!(
                capability = %name,
                user = %user.username,
                required = ?required,
                "capability execution denied"
            );
            return Err(CapabilityResult::failure(
                CapabilityErrorCode::PermissionDenied,
                format!(
                    "user '{}' lacks permission for capability '{name}' (requires one of: {})",
                    user.username,
                    required.join(", ")
                ),
                debug,
            ));
        }

        Ok(PreparedExecution {
            handler: provider.capability.handler.clone(),
            context: ExecutionContext {
                user: user.clone(),
                correlation_id,
                start_time: Utc::now(),
                capability_name: name.to_string(),
                plugin_name: provider.plugin_name.clone(),
            },
            debug,
        })
    }

    /// Route a call to the primary provider of `name`.
    ///
    /// Never fails: unknown capabilities, denied users, and handler errors are
    /// reported in the returned [`CapabilityResult`].
    pub async fn execute_capability(
        &self,
        user: &User,
        name: &str,
        args: Value,
        debug_context: Option<&DebugContext>,
    ) -> CapabilityResult {
        match self.prepare_execution(user, name, debug_context) {
            Ok(prepared) => prepared.run(args).await,
            Err(result) => result,
        }
    }

    /// Aggregate counters for dashboards and diagnostics.
    pub fn get_stats(&self) -> RegistryStats {
        let mut stats = RegistryStats {
            total_capabilities: self.capabilities.len(),
            total_widgets: self.widgets.len(),
            ..RegistryStats::default()
        };

        let mut plugins = BTreeSet::new();
        for providers in self.capabilities.values() {
            stats.total_providers += providers.len();
            plugins.extend(providers.iter().map(|p| p.plugin_name.as_str()));
            if let Some(primary) = providers.first() {
                *stats
                    .capabilities_by_category
                    .entry(primary.capability.category.clone())
                    .or_default() += 1;
                *stats
                    .capabilities_by_risk_level
                    .entry(primary.capability.risk_level)
                    .or_default() += 1;
            }
        }
        plugins.extend(self.widgets.values().map(|w| w.plugin_name.as_str()));
        stats.plugin_count = plugins.len();
        stats
    }

    /// Number of distinct capability names.
    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    /// Returns true if no capabilities are registered.
    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    /// Drop every provider and widget.
    pub fn clear(&mut self) {
        self.capabilities.clear();
        self.widgets.clear();
        self.widgets_by_capability.clear();
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use keel_core::handler_fn;
    use proptest::prelude::*;
    use serde_json::json;
    use tracing_test::traced_test;

    fn cap(name: &str) -> Capability {
        Capability::new(name, RiskLevel::Read, handler_fn(|_, _| async { Ok(json!(null)) }))
    }

    fn tagged_cap(name: &str, tag: &'static str) -> Capability {
        Capability::new(
            name,
            RiskLevel::Execute,
            handler_fn(move |_, _| async move { Ok(json!(tag)) }),
        )
    }

    fn admin() -> User {
        User::new("1", "root").with_roles(["admin"])
    }

    #[test]
    fn rejects_malformed_names() {
        let mut registry = CapabilityRegistry::new();
        assert!(registry.register_capability("bolt", cap("command")).is_err());
        assert!(registry.register_capability("bolt", cap("")).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn rejects_empty_plugin_name() {
        let mut registry = CapabilityRegistry::new();
        assert!(registry.register_capability("", cap("command.execute")).is_err());
    }

    #[test]
    fn providers_sorted_by_priority_then_registration() {
        let mut registry = CapabilityRegistry::new();
        registry
            .register_capability_with_priority("a", cap("command.execute"), 5)
            .unwrap();
        registry
            .register_capability_with_priority("b", cap("command.execute"), 20)
            .unwrap();
        registry
            .register_capability_with_priority("c", cap("command.execute"), 5)
            .unwrap();
        registry
            .register_capability("d", cap("command.execute"))
            .unwrap();

        let order: Vec<&str> = registry
            .get_providers_for_capability("command.execute")
            .iter()
            .map(|p| p.plugin_name.as_str())
            .collect();
        assert_eq!(order, vec!["b", "d", "a", "c"]);
        assert_eq!(
            registry.get_primary_provider("command.execute").unwrap().plugin_name,
            "b"
        );
    }

    #[test]
    fn unknown_capability_has_no_providers() {
        let registry = CapabilityRegistry::new();
        assert!(registry.get_providers_for_capability("x.y").is_empty());
        assert!(registry.get_primary_provider("x.y").is_none());
    }

    #[test]
    fn reregistering_replaces_binding() {
        let mut registry = CapabilityRegistry::new();
        registry
            .register_capability_with_priority("bolt", cap("command.execute"), 5)
            .unwrap();
        registry
            .register_capability_with_priority("bolt", cap("command.execute"), 50)
            .unwrap();
        let providers = registry.get_providers_for_capability("command.execute");
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].priority, 50);
    }

    #[test]
    fn unregister_plugin_leaves_other_providers() {
        let mut registry = CapabilityRegistry::new();
        registry.register_capability("bolt", cap("command.execute")).unwrap();
        registry.register_capability("bolt", cap("task.run")).unwrap();
        registry.register_capability("ansible", cap("command.execute")).unwrap();

        let removed = registry.unregister_plugin("bolt");
        assert_eq!(removed, 2);
        let providers = registry.get_providers_for_capability("command.execute");
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].plugin_name, "ansible");
        assert!(!registry.has_capability("task.run"));
    }

    #[test]
    fn unregister_single_capability() {
        let mut registry = CapabilityRegistry::new();
        registry.register_capability("bolt", cap("command.execute")).unwrap();
        assert!(registry.unregister_capability("bolt", "command.execute"));
        assert!(!registry.unregister_capability("bolt", "command.execute"));
        assert!(!registry.has_capability("command.execute"));
    }

    #[tokio::test]
    async fn executes_highest_priority_provider_only() {
        let low_calls = Arc::new(AtomicUsize::new(0));
        let high_calls = Arc::new(AtomicUsize::new(0));
        let mut registry = CapabilityRegistry::new();

        let counter = low_calls.clone();
        let low = Capability::new(
            "command.execute",
            RiskLevel::Execute,
            handler_fn(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok(json!("low")) }
            }),
        );
        let counter = high_calls.clone();
        let high = Capability::new(
            "command.execute",
            RiskLevel::Execute,
            handler_fn(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok(json!("high")) }
            }),
        );
        registry.register_capability_with_priority("low", low, 5).unwrap();
        registry.register_capability_with_priority("high", high, 20).unwrap();

        let result = registry
            .execute_capability(&admin(), "command.execute", json!({}), None)
            .await;
        assert!(result.is_success());
        assert_eq!(result.handled_by(), Some("high"));
        assert_eq!(result.data(), Some(&json!("high")));
        assert_eq!(high_calls.load(Ordering::SeqCst), 1);
        assert_eq!(low_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_capability_is_structured_failure() {
        let registry = CapabilityRegistry::new();
        let result = registry
            .execute_capability(&admin(), "nothing.here", json!({}), None)
            .await;
        assert_eq!(result.error_code(), Some(CapabilityErrorCode::CapabilityNotFound));
        assert!(result.debug.is_none());
    }

    #[tokio::test]
    #[traced_test]
    async fn denied_user_gets_permission_denied() {
        let mut registry = CapabilityRegistry::new();
        registry
            .register_capability(
                "bolt",
                tagged_cap("command.execute", "x").with_permissions(["command.execute"]),
            )
            .unwrap();
        let user = User::new("2", "viewer").with_roles(["viewer"]);
        let result = registry
            .execute_capability(&user, "command.execute", json!({}), None)
            .await;
        assert_eq!(result.error_code(), Some(CapabilityErrorCode::PermissionDenied));
        assert!(!registry.is_authorized(&user, "command.execute"));
        assert!(logs_contain("capability execution denied"));
    }

    #[tokio::test]
    async fn handler_error_is_wrapped_with_original_message() {
        let mut registry = CapabilityRegistry::new();
        let failing = Capability::new(
            "command.execute",
            RiskLevel::Execute,
            handler_fn(|_, _| async { Err(KeelError::plugin("bolt", "connection refused")) }),
        );
        registry.register_capability("bolt", failing).unwrap();
        let result = registry
            .execute_capability(&admin(), "command.execute", json!({}), None)
            .await;
        assert_eq!(result.error_code(), Some(CapabilityErrorCode::ExecutionError));
        assert_eq!(result.error_message(), Some("connection refused"));
    }

    #[tokio::test]
    async fn debug_context_propagates_correlation_id() {
        let mut registry = CapabilityRegistry::new();
        let echo = Capability::new(
            "debug.echo",
            RiskLevel::Read,
            handler_fn(|_, ctx: ExecutionContext| async move { Ok(json!(ctx.correlation_id)) }),
        );
        registry.register_capability("a", echo.clone()).unwrap();
        registry.register_capability_with_priority("b", echo, 1).unwrap();

        let debug = DebugContext::with_correlation_id("req-42");
        let result = registry
            .execute_capability(&admin(), "debug.echo", json!({}), Some(&debug))
            .await;
        assert_eq!(result.data(), Some(&json!("req-42")));
        let info = result.debug.unwrap();
        assert_eq!(info.correlation_id, "req-42");
        assert_eq!(info.capability_name, "debug.echo");
        assert_eq!(info.plugin_name.as_deref(), Some("a"));
        assert_eq!(info.providers_count, 2);
    }

    #[tokio::test]
    async fn generated_correlation_id_when_debug_has_none() {
        let mut registry = CapabilityRegistry::new();
        registry.register_capability("a", tagged_cap("debug.echo", "x")).unwrap();
        let result = registry
            .execute_capability(&admin(), "debug.echo", json!({}), Some(&DebugContext::default()))
            .await;
        assert!(!result.debug.unwrap().correlation_id.is_empty());
    }

    #[test]
    fn listing_filters_and_marks_authorization() {
        let mut registry = CapabilityRegistry::new();
        registry
            .register_capability(
                "bolt",
                tagged_cap("command.execute", "x").with_permissions(["command.execute"]),
            )
            .unwrap();
        registry.register_capability("puppetdb", cap("inventory.list")).unwrap();

        let viewer = User::new("2", "viewer");
        let visible = registry.get_all_capabilities(Some(&viewer), &CapabilityFilter::default());
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].capability.name, "inventory.list");

        let all = registry.get_all_capabilities(
            Some(&viewer),
            &CapabilityFilter {
                include_unauthorized: true,
                ..CapabilityFilter::default()
            },
        );
        assert_eq!(all.len(), 2);
        assert!(!all[0].authorized);
        assert_eq!(all[0].capability.name, "command.execute");

        let anonymous = registry.get_all_capabilities(None, &CapabilityFilter::default());
        assert!(anonymous.iter().all(|l| l.authorized));

        let by_risk = registry.get_all_capabilities(
            None,
            &CapabilityFilter {
                risk_level: Some(RiskLevel::Execute),
                ..CapabilityFilter::default()
            },
        );
        assert_eq!(by_risk.len(), 1);

        let by_plugin = registry.get_all_capabilities(
            None,
            &CapabilityFilter {
                plugin_name: Some("puppetdb".into()),
                category: Some("inventory".into()),
                ..CapabilityFilter::default()
            },
        );
        assert_eq!(by_plugin.len(), 1);
        assert_eq!(by_plugin[0].plugin_name, "puppetdb");
    }

    #[test]
    fn stats_count_names_providers_and_plugins() {
        let mut registry = CapabilityRegistry::new();
        registry.register_capability("bolt", tagged_cap("command.execute", "x")).unwrap();
        registry.register_capability("ssh", tagged_cap("command.execute", "y")).unwrap();
        registry.register_capability("puppetdb", cap("inventory.list")).unwrap();

        let stats = registry.get_stats();
        assert_eq!(stats.total_capabilities, 2);
        assert_eq!(stats.total_providers, 3);
        assert_eq!(stats.plugin_count, 3);
        assert_eq!(stats.capabilities_by_category.get("command"), Some(&1));
        assert_eq!(stats.capabilities_by_risk_level.get(&RiskLevel::Read), Some(&1));
    }

    proptest! {
        #[test]
        fn provider_order_is_priority_desc_then_registration(
            priorities in proptest::collection::vec(-5i32..5, 1..12)
        ) {
            let mut registry = CapabilityRegistry::new();
            for (i, priority) in priorities.iter().enumerate() {
                registry
                    .register_capability_with_priority(
                        &format!("p{i}"),
                        cap("command.execute"),
                        *priority,
                    )
                    .unwrap();
            }

            let mut expected: Vec<(usize, i32)> = priorities.iter().copied().enumerate().collect();
            expected.sort_by(|a, b| b.1.cmp(&a.1));
            let expected: Vec<String> = expected.iter().map(|(i, _)| format!("p{i}")).collect();

            let actual: Vec<String> = registry
                .get_providers_for_capability("command.execute")
                .iter()
                .map(|p| p.plugin_name.clone())
                .collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
