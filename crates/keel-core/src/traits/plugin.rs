// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base trait that all integration plugins must implement.

use async_trait::async_trait;

use crate::capability::{Capability, Widget};
use crate::error::KeelError;
use crate::types::{HealthStatus, IntegrationConfig, IntegrationType};

/// The base trait for all Keel integration plugins.
///
/// Provides identity, lifecycle, and health check. Plugins are shared behind
/// `Arc`, so lifecycle methods take `&self` and implementors keep their state
/// behind interior mutability.
#[async_trait]
pub trait IntegrationPlugin: Send + Sync + 'static {
    /// Stable, unique name of this plugin instance.
    fn name(&self) -> &str;

    /// Capability set the plugin declares for itself.
    fn integration_type(&self) -> IntegrationType;

    /// Prepare the plugin for use with its own copy of the configuration.
    async fn initialize(&self, config: IntegrationConfig) -> Result<(), KeelError>;

    /// Report the plugin's current health.
    async fn health_check(&self) -> Result<HealthStatus, KeelError>;

    /// Whether `initialize` has completed successfully.
    fn is_initialized(&self) -> bool;

    /// The configuration the plugin was initialized with, if any.
    fn config(&self) -> Option<IntegrationConfig>;

    /// Release any held resources.
    async fn shutdown(&self) -> Result<(), KeelError> {
        Ok(())
    }

    /// Capabilities this plugin contributes to the registry.
    fn capabilities(&self) -> Vec<Capability> {
        Vec::new()
    }

    /// Widgets this plugin contributes to the registry.
    fn widgets(&self) -> Vec<Widget> {
        Vec::new()
    }
}
