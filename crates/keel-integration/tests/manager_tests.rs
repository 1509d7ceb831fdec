// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration manager scenarios: lifecycle, aggregation, linking, health,
//! and capability routing across mock plugins.

use std::sync::Arc;
use std::time::Duration;

use keel_capability::{CapabilityErrorCode, CapabilityRegistry, DebugContext};
use keel_core::{
    Action, ActionStatus, IntegrationConfig, IntegrationPlugin, IntegrationType, KeelError, Node,
    PluginHandle, Widget,
};
use keel_integration::{IntegrationManager, ManagerOptions, SourceStatus};
use keel_test_utils::{
    admin_user, anonymous_user, tagged_capability, user_with_permissions, user_with_roles,
    LifecycleLog, MockExecutionTool, MockHybridPlugin, MockInformationSource,
};
use serde_json::json;

fn info_config(name: &str, priority: i32) -> IntegrationConfig {
    IntegrationConfig::new(name, IntegrationType::Information).with_priority(priority)
}

fn exec_config(name: &str, priority: i32) -> IntegrationConfig {
    IntegrationConfig::new(name, IntegrationType::Execution).with_priority(priority)
}

async fn register_source(
    manager: &IntegrationManager,
    source: MockInformationSource,
    priority: i32,
) -> Arc<MockInformationSource> {
    let source = Arc::new(source);
    let config = info_config(source.name(), priority);
    manager
        .register_plugin(PluginHandle::information(source.clone()), config)
        .await
        .unwrap();
    source
}

// --- registration and lifecycle ---

#[tokio::test]
async fn duplicate_plugin_name_is_rejected() {
    let manager = IntegrationManager::default();
    register_source(&manager, MockInformationSource::new("ssh"), 10).await;

    let err = manager
        .register_plugin(
            PluginHandle::information(Arc::new(MockInformationSource::new("ssh"))),
            info_config("ssh", 10),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, KeelError::DuplicatePlugin { name } if name == "ssh"));
    assert_eq!(manager.plugin_count().await, 1);
}

#[tokio::test]
async fn malformed_capability_registers_nothing() {
    let manager = IntegrationManager::default();
    let tool = MockExecutionTool::new("bolt")
        .with_capability(tagged_capability("command.execute", "bolt", &[]))
        .with_capability(tagged_capability("nodots", "bolt", &[]));

    let err = manager
        .register_plugin(PluginHandle::execution(Arc::new(tool)), exec_config("bolt", 10))
        .await
        .unwrap_err();
    assert!(matches!(err, KeelError::InvalidCapability { .. }));
    assert_eq!(manager.plugin_count().await, 0);
    assert!(manager.registry().read().await.is_empty());
}

#[tokio::test]
async fn rejected_registration_leaves_shared_registry_untouched() {
    let shared = Arc::new(tokio::sync::RwLock::new(CapabilityRegistry::new()));
    shared
        .write()
        .await
        .register_capability("bolt", tagged_capability("inventory.list", "bolt", &[]))
        .unwrap();
    let manager = IntegrationManager::with_registry(shared.clone(), ManagerOptions::default());

    let bad_capability = MockExecutionTool::new("bolt")
        .with_capability(tagged_capability("command.execute", "bolt", &[]))
        .with_capability(tagged_capability("nodots", "bolt", &[]));
    let err = manager
        .register_plugin(
            PluginHandle::execution(Arc::new(bad_capability)),
            exec_config("bolt", 10),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, KeelError::InvalidCapability { .. }));

    let bad_widget = MockExecutionTool::new("bolt")
        .with_capability(tagged_capability("command.execute", "bolt", &[]))
        .with_widget(
            Widget::new("bolt:runner", "Runner")
                .with_slots(["dashboard"])
                .with_required_capabilities(["nodots"]),
        );
    let err = manager
        .register_plugin(
            PluginHandle::execution(Arc::new(bad_widget)),
            exec_config("bolt", 10),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, KeelError::InvalidWidget { .. }));

    let registry = shared.read().await;
    let kept = registry.get_providers_for_capability("inventory.list");
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].plugin_name, "bolt");
    assert!(!registry.has_capability("command.execute"));
    assert!(registry.get_widget("bolt:runner").is_none());
    drop(registry);
    assert_eq!(manager.plugin_count().await, 0);
}

#[tokio::test]
async fn typed_accessors_never_fail_for_unknown_names() {
    let manager = IntegrationManager::default();
    let hybrid = Arc::new(MockHybridPlugin::new("ssh"));
    manager
        .register_plugin(
            PluginHandle::both(hybrid),
            IntegrationConfig::new("ssh", IntegrationType::Both),
        )
        .await
        .unwrap();
    register_source(&manager, MockInformationSource::new("puppetdb"), 10).await;

    assert!(manager.get_information_source("ssh").await.is_some());
    assert!(manager.get_execution_tool("ssh").await.is_some());
    assert!(manager.get_execution_tool("puppetdb").await.is_none());
    assert!(manager.get_information_source("ghost").await.is_none());
    assert_eq!(manager.get_all_information_sources().await.len(), 2);
    assert_eq!(manager.get_all_execution_tools().await.len(), 1);
}

#[tokio::test]
async fn initialization_failures_are_collected() {
    let manager = IntegrationManager::default();
    let good = register_source(&manager, MockInformationSource::new("good"), 10).await;
    register_source(
        &manager,
        MockInformationSource::new("bad").failing_init("no credentials"),
        10,
    )
    .await;
    let disabled = Arc::new(MockInformationSource::new("off"));
    manager
        .register_plugin(
            PluginHandle::information(disabled.clone()),
            info_config("off", 10).with_enabled(false),
        )
        .await
        .unwrap();

    assert!(!manager.is_initialized());
    let errors = manager.initialize_plugins().await;

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].plugin, "bad");
    assert_eq!(errors[0].error, "no credentials");
    assert!(manager.is_initialized());
    assert_eq!(good.init_calls(), 1);
    assert_eq!(disabled.init_calls(), 0);
    assert_eq!(good.config().unwrap().name, "good");
}

#[tokio::test(start_paused = true)]
async fn plugins_initialize_in_registration_order() {
    let manager = IntegrationManager::default();
    let log = LifecycleLog::default();
    register_source(
        &manager,
        MockInformationSource::new("dep")
            .with_init_delay(Duration::from_millis(100))
            .with_lifecycle_log(log.clone()),
        10,
    )
    .await;
    register_source(
        &manager,
        MockInformationSource::new("dependent")
            .with_init_delay(Duration::from_millis(1))
            .with_lifecycle_log(log.clone()),
        10,
    )
    .await;

    assert!(manager.initialize_plugins().await.is_empty());
    assert_eq!(
        *log.lock().unwrap(),
        vec!["start dep", "done dep", "start dependent", "done dependent"]
    );
}

#[tokio::test]
async fn failed_dependency_does_not_stop_later_plugins() {
    let manager = IntegrationManager::default();
    let log = LifecycleLog::default();
    register_source(
        &manager,
        MockInformationSource::new("dep")
            .failing_init("unreachable")
            .with_lifecycle_log(log.clone()),
        10,
    )
    .await;
    let dependent = register_source(
        &manager,
        MockInformationSource::new("dependent").with_lifecycle_log(log.clone()),
        10,
    )
    .await;

    let errors = manager.initialize_plugins().await;
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].plugin, "dep");
    assert!(dependent.is_initialized());
    assert_eq!(log.lock().unwrap().len(), 4);
}

#[tokio::test]
async fn config_identity_mismatch_fails_initialization() {
    let manager = IntegrationManager::default();
    let source = Arc::new(MockInformationSource::new("puppetdb"));
    manager
        .register_plugin(
            PluginHandle::information(source.clone()),
            IntegrationConfig::new("puppetdb", IntegrationType::Execution),
        )
        .await
        .unwrap();

    let errors = manager.initialize_plugins().await;
    assert_eq!(errors.len(), 1);
    assert!(errors[0].error.contains("does not match"));
    assert_eq!(source.init_calls(), 0);
}

#[tokio::test]
async fn reads_before_initialization_are_errors() {
    let manager = IntegrationManager::default();
    assert!(matches!(
        manager.get_aggregated_inventory().await,
        Err(KeelError::ManagerNotInitialized)
    ));
    assert!(matches!(
        manager.get_node_data("web01").await,
        Err(KeelError::ManagerNotInitialized)
    ));
    assert!(matches!(
        manager.get_linked_inventory().await,
        Err(KeelError::ManagerNotInitialized)
    ));
}

#[tokio::test]
async fn list_plugins_reports_state() {
    let manager = IntegrationManager::default();
    register_source(&manager, MockInformationSource::new("puppetdb"), 20).await;
    manager.initialize_plugins().await;

    let listed = manager.list_plugins().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "puppetdb");
    assert_eq!(listed[0].priority, 20);
    assert!(listed[0].initialized);
    assert!(listed[0].enabled);
}

#[tokio::test]
async fn shutdown_all_resets_initialization() {
    let manager = IntegrationManager::default();
    let source = register_source(&manager, MockInformationSource::new("puppetdb"), 10).await;
    manager.initialize_plugins().await;

    assert!(manager.shutdown_all().await.is_empty());
    assert_eq!(source.shutdown_calls(), 1);
    assert!(!manager.is_initialized());
}

// --- execution ---

#[tokio::test]
async fn execute_action_distinguishes_missing_and_uninitialized_tools() {
    let manager = IntegrationManager::default();
    manager
        .register_plugin(
            PluginHandle::execution(Arc::new(MockExecutionTool::new("bolt").failing_init("x"))),
            exec_config("bolt", 10),
        )
        .await
        .unwrap();
    manager.initialize_plugins().await;

    let action = Action::command(vec!["web01".into()], "uptime");
    assert!(matches!(
        manager.execute_action("ansible", action.clone()).await,
        Err(KeelError::PluginNotFound { .. })
    ));
    assert!(matches!(
        manager.execute_action("bolt", action).await,
        Err(KeelError::PluginNotInitialized { name }) if name == "bolt"
    ));
}

#[tokio::test]
async fn tool_failure_becomes_failed_action_result() {
    let manager = IntegrationManager::default();
    let tool = Arc::new(MockExecutionTool::new("bolt").failing_execution("ssh refused"));
    manager
        .register_plugin(PluginHandle::execution(tool.clone()), exec_config("bolt", 10))
        .await
        .unwrap();
    manager.initialize_plugins().await;

    let result = manager
        .execute_action("bolt", Action::command(vec!["web01".into()], "uptime"))
        .await
        .unwrap();
    assert_eq!(result.status, ActionStatus::Failed);
    assert_eq!(result.error.as_deref(), Some("ssh refused"));
    assert_eq!(tool.executed_actions().await.len(), 1);
}

#[tokio::test]
async fn capability_routes_to_highest_priority_provider() {
    let manager = IntegrationManager::default();
    for (name, priority) in [("low", 5), ("high", 20)] {
        let tool = MockExecutionTool::new(name)
            .with_capability(tagged_capability("command.execute", name, &[]));
        manager
            .register_plugin(PluginHandle::execution(Arc::new(tool)), exec_config(name, priority))
            .await
            .unwrap();
    }

    let result = manager
        .execute_capability(&admin_user(), "command.execute", json!({}), None)
        .await;
    assert!(result.is_success());
    assert_eq!(result.handled_by(), Some("high"));
    assert_eq!(result.data().unwrap()["plugin"], "high");
}

#[tokio::test]
async fn capability_authorization_through_manager() {
    let manager = IntegrationManager::default();
    let tool = MockExecutionTool::new("bolt")
        .with_capability(tagged_capability("command.execute", "bolt", &["command.execute"]));
    manager
        .register_plugin(PluginHandle::execution(Arc::new(tool)), exec_config("bolt", 10))
        .await
        .unwrap();

    let denied = manager
        .execute_capability(&anonymous_user(), "command.execute", json!({}), None)
        .await;
    assert_eq!(denied.error_code(), Some(CapabilityErrorCode::PermissionDenied));

    for user in [
        user_with_permissions(&["command.execute"]),
        user_with_permissions(&["*"]),
        user_with_roles(&["command.execute"]),
    ] {
        let allowed = manager
            .execute_capability(&user, "command.execute", json!({}), None)
            .await;
        assert!(allowed.is_success(), "{} should be allowed", user.username);
    }

    let debug = DebugContext::with_correlation_id("req-7");
    let missing = manager
        .execute_capability(&admin_user(), "package.install", json!({}), Some(&debug))
        .await;
    assert_eq!(missing.error_code(), Some(CapabilityErrorCode::CapabilityNotFound));
    let wire = serde_json::to_value(&missing).unwrap();
    assert_eq!(wire["correlationId"], "req-7");
}

#[tokio::test]
async fn unregister_plugin_removes_only_its_registrations() {
    let manager = IntegrationManager::default();
    let bolt = Arc::new(
        MockExecutionTool::new("bolt")
            .with_capability(tagged_capability("command.execute", "bolt", &[]))
            .with_capability(tagged_capability("task.run", "bolt", &[]))
            .with_widget(
                Widget::new("bolt:runner", "Runner")
                    .with_slots(["dashboard"])
                    .with_required_capabilities(["command.execute"]),
            ),
    );
    manager
        .register_plugin(PluginHandle::execution(bolt.clone()), exec_config("bolt", 10))
        .await
        .unwrap();
    manager
        .register_plugin(
            PluginHandle::execution(Arc::new(
                MockExecutionTool::new("ansible")
                    .with_capability(tagged_capability("command.execute", "ansible", &[])),
            )),
            exec_config("ansible", 10),
        )
        .await
        .unwrap();

    assert_eq!(manager.unregister_plugin("bolt").await.unwrap(), 2);
    assert_eq!(bolt.shutdown_calls(), 1);

    let registry = manager.registry();
    let registry = registry.read().await;
    let providers = registry.get_providers_for_capability("command.execute");
    assert_eq!(providers.len(), 1);
    assert_eq!(providers[0].plugin_name, "ansible");
    assert!(registry.get_widget("bolt:runner").is_none());
    drop(registry);

    assert!(matches!(
        manager.unregister_plugin("bolt").await,
        Err(KeelError::PluginNotFound { .. })
    ));
}

// --- aggregation ---

#[tokio::test]
async fn failing_source_is_isolated() {
    let manager = IntegrationManager::default();
    register_source(
        &manager,
        MockInformationSource::new("bad").failing_inventory("boom"),
        10,
    )
    .await;
    register_source(
        &manager,
        MockInformationSource::new("good")
            .with_nodes(vec![Node::new("web01", "ssh://web01", "good")]),
        10,
    )
    .await;
    manager.initialize_plugins().await;

    let inventory = manager.get_aggregated_inventory().await.unwrap();
    assert_eq!(inventory.nodes.len(), 1);
    assert_eq!(inventory.sources["bad"].status, SourceStatus::Unavailable);
    assert_eq!(inventory.sources["bad"].node_count, 0);
    assert_eq!(inventory.sources["bad"].error.as_deref(), Some("boom"));
    assert_eq!(inventory.sources["good"].status, SourceStatus::Healthy);
    assert_eq!(inventory.sources["good"].node_count, 1);
}

#[tokio::test]
async fn duplicate_ids_resolve_to_higher_priority_source() {
    let manager = IntegrationManager::default();
    register_source(
        &manager,
        MockInformationSource::new("ssh").with_nodes(vec![
            Node::new("web01", "ssh://web01", "ssh"),
            Node::new("db01", "ssh://db01", "ssh"),
        ]),
        5,
    )
    .await;
    register_source(
        &manager,
        MockInformationSource::new("puppetdb")
            .with_nodes(vec![Node::new("web01", "https://web01", "whatever")]),
        20,
    )
    .await;
    manager.initialize_plugins().await;

    let inventory = manager.get_aggregated_inventory().await.unwrap();
    assert_eq!(inventory.nodes.len(), 2);
    let web = inventory.nodes.iter().find(|n| n.id == "web01").unwrap();
    assert_eq!(web.source, "puppetdb");
    assert_eq!(web.uri, "https://web01");
    assert_eq!(inventory.sources["ssh"].node_count, 2);
}

#[tokio::test]
async fn uninitialized_sources_are_not_queried() {
    let manager = IntegrationManager::default();
    let broken =
        register_source(&manager, MockInformationSource::new("hiera").failing_init("x"), 10).await;
    manager.initialize_plugins().await;

    let inventory = manager.get_aggregated_inventory().await.unwrap();
    assert!(inventory.sources.is_empty());
    assert_eq!(broken.inventory_calls(), 0);
}

#[tokio::test]
async fn cached_unhealthy_source_is_degraded() {
    let manager = IntegrationManager::default();
    register_source(
        &manager,
        MockInformationSource::new("puppetdb")
            .with_nodes(vec![Node::new("web01", "web01", "puppetdb")])
            .unhealthy("slow queries"),
        10,
    )
    .await;
    manager.initialize_plugins().await;
    manager.health_check_all(false).await;

    let inventory = manager.get_aggregated_inventory().await.unwrap();
    assert_eq!(inventory.sources["puppetdb"].status, SourceStatus::Degraded);
    assert_eq!(inventory.nodes.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn source_timeout_marks_slow_source_unavailable() {
    let manager = IntegrationManager::new(ManagerOptions {
        source_timeout: Some(Duration::from_secs(2)),
        ..ManagerOptions::default()
    });
    register_source(
        &manager,
        MockInformationSource::new("slow")
            .with_nodes(vec![Node::new("a", "a", "slow")])
            .with_inventory_delay(Duration::from_secs(30)),
        10,
    )
    .await;
    register_source(
        &manager,
        MockInformationSource::new("fast").with_nodes(vec![Node::new("b", "b", "fast")]),
        10,
    )
    .await;
    manager.initialize_plugins().await;

    let inventory = manager.get_aggregated_inventory().await.unwrap();
    assert_eq!(inventory.sources["slow"].status, SourceStatus::Unavailable);
    assert_eq!(inventory.sources["fast"].status, SourceStatus::Healthy);
    assert_eq!(inventory.nodes.len(), 1);
}

// --- node data ---

#[tokio::test]
async fn node_data_gathers_facts_from_every_holder() {
    let manager = IntegrationManager::default();
    register_source(
        &manager,
        MockInformationSource::new("puppetdb")
            .with_nodes(vec![Node::new("web01", "web01", "puppetdb")])
            .with_facts("web01", json!({"os": "debian"})),
        20,
    )
    .await;
    register_source(
        &manager,
        MockInformationSource::new("ssh")
            .with_nodes(vec![Node::new("web01", "ssh://web01", "ssh")])
            .failing_facts("connection reset"),
        5,
    )
    .await;
    register_source(&manager, MockInformationSource::new("hiera"), 10).await;
    manager.initialize_plugins().await;

    let data = manager.get_node_data("web01").await.unwrap();
    assert_eq!(data.node.source, "puppetdb");
    assert_eq!(data.facts.len(), 2);
    assert_eq!(data.facts["puppetdb"].values["os"], "debian");
    assert!(data.facts["ssh"].is_empty());
    assert!(!data.facts.contains_key("hiera"));

    assert!(matches!(
        manager.get_node_data("nowhere").await,
        Err(KeelError::NodeNotFound { node_id }) if node_id == "nowhere"
    ));
}

#[tokio::test]
async fn query_node_data_asks_the_owner() {
    let manager = IntegrationManager::default();
    register_source(
        &manager,
        MockInformationSource::new("puppetdb")
            .with_nodes(vec![Node::new("web01", "web01", "puppetdb")])
            .with_node_data("web01", "reports", json!([{"status": "changed"}])),
        20,
    )
    .await;
    manager.initialize_plugins().await;

    let reports = manager.query_node_data("web01", "reports").await.unwrap();
    assert_eq!(reports[0]["status"], "changed");
    assert!(manager.query_node_data("web01", "catalog").await.is_err());
}

// --- linking ---

#[tokio::test]
async fn linked_inventory_merges_by_hostname() {
    let manager = IntegrationManager::default();
    register_source(
        &manager,
        MockInformationSource::new("ssh").with_nodes(vec![
            Node::new("web01", "ssh://web01.example.com:22", "ssh"),
            Node::new("db01", "ssh://db01.example.com", "ssh"),
        ]),
        10,
    )
    .await;
    register_source(
        &manager,
        MockInformationSource::new("puppetserver").with_nodes(vec![Node::new(
            "web01.example.com",
            "https://web01.example.com:8140",
            "puppetserver",
        )
        .with_certificate_status("signed")]),
        10,
    )
    .await;
    manager.initialize_plugins().await;

    let linked = manager.get_linked_inventory().await.unwrap();
    assert_eq!(linked.nodes.len(), 2);
    let web = &linked.nodes[0];
    assert!(web.linked);
    assert_eq!(web.sources, vec!["ssh", "puppetserver"]);
    assert_eq!(web.certificate_status.as_deref(), Some("signed"));
    let db = &linked.nodes[1];
    assert!(!db.linked);
    assert_eq!(db.sources, vec!["ssh"]);
    assert_eq!(linked.sources.len(), 2);

    let matches = manager.find_matching_nodes("WEB01").await.unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].source, "ssh");
}

// --- health ---

#[tokio::test]
async fn health_check_all_converts_errors_and_uses_cache() {
    let manager = IntegrationManager::default();
    let ok = register_source(&manager, MockInformationSource::new("ok"), 10).await;
    register_source(
        &manager,
        MockInformationSource::new("broken").failing_health("timeout"),
        10,
    )
    .await;

    let statuses = manager.health_check_all(false).await;
    assert!(statuses["ok"].healthy);
    assert!(!statuses["broken"].healthy);
    assert!(statuses["broken"].message.contains("timeout"));
    assert_eq!(ok.health_calls(), 1);

    manager.health_check_all(true).await;
    assert_eq!(ok.health_calls(), 1);

    manager.clear_health_check_cache().await;
    assert!(manager.health_cache().is_empty().await);
    manager.health_check_all(true).await;
    assert_eq!(ok.health_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn scheduler_refreshes_health_and_starts_once() {
    let manager = Arc::new(IntegrationManager::default());
    let source = register_source(&manager, MockInformationSource::new("puppetdb"), 10).await;

    assert!(manager.start_health_check_scheduler(Duration::from_secs(30)));
    assert!(!manager.start_health_check_scheduler(Duration::from_secs(30)));
    assert!(manager.is_health_check_scheduler_running());

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(source.health_calls(), 2);
    assert_eq!(manager.health_cache().len().await, 1);

    assert!(manager.stop_health_check_scheduler().await);
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(source.health_calls(), 2);
}
