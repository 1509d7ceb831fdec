// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tagged plugin handle used by the loader and the manager.

use std::fmt;
use std::sync::Arc;

use crate::capability::{Capability, Widget};
use crate::error::KeelError;
use crate::traits::execution::ExecutionTool;
use crate::traits::information::InformationSource;
use crate::types::{HealthStatus, IntegrationConfig, IntegrationType};

/// A plugin instance tagged with the capability set it provides.
///
/// `Both` holds two views of the same object so callers can reach either
/// capability set without downcasting.
#[derive(Clone)]
pub enum PluginHandle {
    Information(Arc<dyn InformationSource>),
    Execution(Arc<dyn ExecutionTool>),
    Both {
        information: Arc<dyn InformationSource>,
        execution: Arc<dyn ExecutionTool>,
    },
}

macro_rules! delegate {
    ($handle:expr, $plugin:ident => $body:expr) => {
        match $handle {
            PluginHandle::Information($plugin) => $body,
            PluginHandle::Execution($plugin) => $body,
            PluginHandle::Both {
                information: $plugin,
                ..
            } => $body,
        }
    };
}

impl PluginHandle {
    pub fn information<T: InformationSource>(plugin: Arc<T>) -> Self {
        PluginHandle::Information(plugin)
    }

    pub fn execution<T: ExecutionTool>(plugin: Arc<T>) -> Self {
        PluginHandle::Execution(plugin)
    }

    pub fn both<T: InformationSource + ExecutionTool>(plugin: Arc<T>) -> Self {
        PluginHandle::Both {
            information: plugin.clone(),
            execution: plugin,
        }
    }

    /// Classification derived from the variant.
    pub fn kind(&self) -> IntegrationType {
        match self {
            PluginHandle::Information(_) => IntegrationType::Information,
            PluginHandle::Execution(_) => IntegrationType::Execution,
            PluginHandle::Both { .. } => IntegrationType::Both,
        }
    }

    pub fn name(&self) -> &str {
        delegate!(self, p => p.name())
    }

    /// The type the plugin reports for itself.
    pub fn declared_type(&self) -> IntegrationType {
        delegate!(self, p => p.integration_type())
    }

    pub fn as_information_source(&self) -> Option<&Arc<dyn InformationSource>> {
        match self {
            PluginHandle::Information(p) => Some(p),
            PluginHandle::Both { information, .. } => Some(information),
            PluginHandle::Execution(_) => None,
        }
    }

    pub fn as_execution_tool(&self) -> Option<&Arc<dyn ExecutionTool>> {
        match self {
            PluginHandle::Execution(p) => Some(p),
            PluginHandle::Both { execution, .. } => Some(execution),
            PluginHandle::Information(_) => None,
        }
    }

    pub async fn initialize(&self, config: IntegrationConfig) -> Result<(), KeelError> {
        delegate!(self, p => p.initialize(config).await)
    }

    pub async fn health_check(&self) -> Result<HealthStatus, KeelError> {
        delegate!(self, p => p.health_check().await)
    }

    pub fn is_initialized(&self) -> bool {
        delegate!(self, p => p.is_initialized())
    }

    pub fn config(&self) -> Option<IntegrationConfig> {
        delegate!(self, p => p.config())
    }

    pub async fn shutdown(&self) -> Result<(), KeelError> {
        delegate!(self, p => p.shutdown().await)
    }

    pub fn capabilities(&self) -> Vec<Capability> {
        delegate!(self, p => p.capabilities())
    }

    pub fn widgets(&self) -> Vec<Widget> {
        delegate!(self, p => p.widgets())
    }
}

impl fmt::Debug for PluginHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginHandle")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .finish()
    }
}
