// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability and widget definitions plus the handler contract.
//!
//! A capability is a named, permissioned unit of functionality
//! (`category.action`) backed by a [`CapabilityHandler`]. Widgets are
//! presentation hints linked to capabilities for authorization.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use crate::error::KeelError;
use crate::types::{RiskLevel, User};

/// Hierarchical, dot-delimited name with at least two segments.
static CAPABILITY_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z][a-z0-9_-]*(\.[a-z][a-z0-9_-]*)+$")
        .expect("capability name pattern is valid")
});

/// Returns true if `name` is a well-formed capability routing key.
pub fn is_valid_capability_name(name: &str) -> bool {
    CAPABILITY_NAME.is_match(name)
}

/// Validate a capability name, returning a structured error for empty or
/// malformed names.
pub fn validate_capability_name(name: &str) -> Result<(), KeelError> {
    if name.trim().is_empty() {
        return Err(KeelError::InvalidCapability {
            name: name.to_string(),
            reason: "capability name must not be empty".to_string(),
        });
    }
    if !is_valid_capability_name(name) {
        return Err(KeelError::InvalidCapability {
            name: name.to_string(),
            reason: "expected a dot-delimited name such as 'command.execute'".to_string(),
        });
    }
    Ok(())
}

/// Context passed to a capability handler alongside its arguments.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub user: User,
    pub correlation_id: String,
    pub start_time: DateTime<Utc>,
    pub capability_name: String,
    pub plugin_name: String,
}

/// Async handler backing a capability.
#[async_trait]
pub trait CapabilityHandler: Send + Sync {
    async fn handle(&self, args: Value, ctx: ExecutionContext) -> Result<Value, KeelError>;
}

/// Adapter turning an async closure into a [`CapabilityHandler`].
struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> CapabilityHandler for FnHandler<F>
where
    F: Fn(Value, ExecutionContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, KeelError>> + Send + 'static,
{
    async fn handle(&self, args: Value, ctx: ExecutionContext) -> Result<Value, KeelError> {
        (self.0)(args, ctx).await
    }
}

/// Wrap an async closure as a shareable capability handler.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn CapabilityHandler>
where
    F: Fn(Value, ExecutionContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, KeelError>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// A named, permissioned unit of functionality.
#[derive(Clone)]
pub struct Capability {
    pub category: String,
    pub name: String,
    pub description: String,
    pub risk_level: RiskLevel,
    /// Empty means public.
    pub required_permissions: Vec<String>,
    pub handler: Arc<dyn CapabilityHandler>,
}

impl Capability {
    /// Build a capability whose category is the first segment of `name`.
    pub fn new(
        name: impl Into<String>,
        risk_level: RiskLevel,
        handler: Arc<dyn CapabilityHandler>,
    ) -> Self {
        let name = name.into();
        let category = name.split('.').next().unwrap_or_default().to_string();
        Self {
            category,
            name,
            description: String::new(),
            risk_level,
            required_permissions: Vec::new(),
            handler,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    /// Handler-free view for listing surfaces.
    pub fn info(&self) -> CapabilityInfo {
        CapabilityInfo {
            category: self.category.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            risk_level: self.risk_level,
            required_permissions: self.required_permissions.clone(),
        }
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("category", &self.category)
            .field("name", &self.name)
            .field("risk_level", &self.risk_level)
            .field("required_permissions", &self.required_permissions)
            .finish_non_exhaustive()
    }
}

/// Serializable capability metadata without the handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityInfo {
    pub category: String,
    pub name: String,
    pub description: String,
    pub risk_level: RiskLevel,
    pub required_permissions: Vec<String>,
}

/// Layout hint for a widget.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WidgetSize {
    Small,
    #[default]
    Medium,
    Large,
    Full,
}

/// A UI component surfaced to the presentation layer. Never executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    /// Must be `"<pluginName>:<slug>"`.
    pub id: String,
    pub name: String,
    pub slots: Vec<String>,
    #[serde(default)]
    pub required_capabilities: Vec<String>,
    #[serde(default = "crate::capability::default_widget_priority")]
    pub priority: i32,
    #[serde(default)]
    pub size: WidgetSize,
}

pub(crate) fn default_widget_priority() -> i32 {
    crate::types::DEFAULT_PRIORITY
}

impl Widget {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            slots: Vec::new(),
            required_capabilities: Vec::new(),
            priority: default_widget_priority(),
            size: WidgetSize::default(),
        }
    }

    pub fn with_slots<I, S>(mut self, slots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.slots = slots.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_required_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_size(mut self, size: WidgetSize) -> Self {
        self.size = size;
        self
    }

    /// Check that the id is namespaced by `plugin_name`.
    pub fn validate_for(&self, plugin_name: &str) -> Result<(), KeelError> {
        let slug = self
            .id
            .strip_prefix(plugin_name)
            .and_then(|rest| rest.strip_prefix(':'));
        match slug {
            Some(slug) if !slug.is_empty() => Ok(()),
            _ => Err(KeelError::InvalidWidget {
                id: self.id.clone(),
                reason: format!("widget id must have the form '{plugin_name}:<slug>'"),
            }),
        }
    }
}
