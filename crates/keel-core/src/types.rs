// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by plugins, the capability registry, and the manager.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

/// Default priority for integrations, capability providers, and widgets.
pub const DEFAULT_PRIORITY: i32 = 10;

/// Role name that bypasses every permission check.
pub const ADMIN_ROLE: &str = "admin";

/// Permission that grants every capability.
pub const WILDCARD_PERMISSION: &str = "*";

/// Capability set a plugin provides.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum IntegrationType {
    /// Inventory, fact, and node-data queries.
    Information,
    /// Remote action execution.
    Execution,
    /// Both of the above.
    Both,
}

impl IntegrationType {
    pub fn is_information(self) -> bool {
        matches!(self, IntegrationType::Information | IntegrationType::Both)
    }

    pub fn is_execution(self) -> bool {
        matches!(self, IntegrationType::Execution | IntegrationType::Both)
    }
}

/// Per-plugin configuration handed to [`initialize`](crate::IntegrationPlugin::initialize).
///
/// The plugin receives its own clone; the manager keeps the original.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationConfig {
    pub enabled: bool,
    pub name: String,
    #[serde(rename = "type")]
    pub integration_type: IntegrationType,
    #[serde(default = "default_priority")]
    pub priority: i32,
    /// Backend-specific settings, opaque to the kernel.
    #[serde(default)]
    pub config: Map<String, Value>,
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

impl IntegrationConfig {
    /// Enabled config with the default priority and no backend settings.
    pub fn new(name: impl Into<String>, integration_type: IntegrationType) -> Self {
        Self {
            enabled: true,
            name: name.into(),
            integration_type,
            priority: DEFAULT_PRIORITY,
            config: Map::new(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: Value) -> Self {
        self.config.insert(key.into(), value);
        self
    }
}

/// Result of a plugin health check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub healthy: bool,
    pub message: String,
    pub last_check: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl HealthStatus {
    pub fn healthy(message: impl Into<String>) -> Self {
        Self {
            healthy: true,
            message: message.into(),
            last_check: Utc::now(),
            details: None,
        }
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            healthy: false,
            message: message.into(),
            last_check: Utc::now(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Transport used to reach a node.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Transport {
    #[default]
    Ssh,
    Winrm,
    Docker,
    Local,
}

/// A managed node as reported by an information source.
///
/// `source` names the reporting plugin. `linked` and `sources` are filled in by
/// node linking; a plain inventory record leaves them at their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub transport: Transport,
    #[serde(default)]
    pub config: Map<String, Value>,
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_check_in: Option<DateTime<Utc>>,
    #[serde(default)]
    pub linked: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

impl Node {
    pub fn new(id: impl Into<String>, uri: impl Into<String>, source: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            uri: uri.into(),
            transport: Transport::default(),
            config: Map::new(),
            source: source.into(),
            certificate_status: None,
            status: None,
            last_check_in: None,
            linked: false,
            sources: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_certificate_status(mut self, status: impl Into<String>) -> Self {
        self.certificate_status = Some(status.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_last_check_in(mut self, at: DateTime<Utc>) -> Self {
        self.last_check_in = Some(at);
        self
    }
}

/// Facts gathered for one node by one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facts {
    pub node_id: String,
    pub source: String,
    pub gathered_at: DateTime<Utc>,
    #[serde(default)]
    pub values: Map<String, Value>,
}

impl Facts {
    pub fn new(
        node_id: impl Into<String>,
        source: impl Into<String>,
        values: Map<String, Value>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            source: source.into(),
            gathered_at: Utc::now(),
            values,
        }
    }

    /// Placeholder used when a source fails to return facts.
    pub fn empty(node_id: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(node_id, source, Map::new())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Kind of remote action an execution tool runs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ActionType {
    Command,
    Task,
    Script,
    Plan,
}

/// Request passed to [`ExecutionTool::execute_action`](crate::ExecutionTool::execute_action).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub action_type: ActionType,
    pub targets: Vec<String>,
    pub action: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl Action {
    pub fn command(targets: Vec<String>, command: impl Into<String>) -> Self {
        Self {
            action_type: ActionType::Command,
            targets,
            action: command.into(),
            parameters: Map::new(),
        }
    }
}

/// Lifecycle state of an executed action.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ActionStatus {
    Running,
    Success,
    Partial,
    Failed,
}

/// Per-node outcome inside an [`ActionResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeResult {
    pub node_id: String,
    pub status: ActionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of an action run by an execution tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub id: String,
    pub action_type: ActionType,
    pub targets: Vec<String>,
    pub action: String,
    pub status: ActionStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub results: Vec<NodeResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResult {
    /// A completed result for `action` with the given per-node outcomes.
    pub fn completed(action: &Action, status: ActionStatus, results: Vec<NodeResult>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            action_type: action.action_type,
            targets: action.targets.clone(),
            action: action.action.clone(),
            status,
            started_at: now,
            completed_at: Some(now),
            results,
            error: None,
        }
    }

    /// A failed result carrying the error message reported by the tool.
    pub fn failed(action: &Action, error: impl Into<String>) -> Self {
        let mut result = Self::completed(action, ActionStatus::Failed, Vec::new());
        result.error = Some(error.into());
        result
    }
}

/// Sensitivity classification of a capability.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RiskLevel {
    Read,
    Write,
    Execute,
    Admin,
}

/// The caller on whose behalf a capability runs. Supplied per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl User {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            roles: Vec::new(),
            permissions: Vec::new(),
        }
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == ADMIN_ROLE)
    }

    /// Whether this user may use something guarded by `required`.
    ///
    /// An empty requirement list is public. Otherwise any one of: admin role,
    /// wildcard permission, an explicit permission match, or a role whose name
    /// equals a required permission.
    pub fn is_authorized_for(&self, required: &[String]) -> bool {
        if required.is_empty() || self.is_admin() {
            return true;
        }
        if self.permissions.iter().any(|p| p == WILDCARD_PERMISSION) {
            return true;
        }
        required.iter().any(|needed| {
            self.permissions.iter().any(|p| p == needed) || self.roles.iter().any(|r| r == needed)
        })
    }
}
