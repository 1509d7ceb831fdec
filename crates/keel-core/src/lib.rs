// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Keel integration kernel.
//!
//! This crate provides the plugin traits, the shared data model (nodes,
//! facts, health, users), capability and widget definitions, and the error
//! type used throughout the workspace. Every backend integration implements
//! traits defined here.

pub mod capability;
pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use capability::{
    handler_fn, is_valid_capability_name, validate_capability_name, Capability,
    CapabilityHandler, CapabilityInfo, ExecutionContext, Widget, WidgetSize,
};
pub use error::KeelError;
pub use types::{
    Action, ActionResult, ActionStatus, ActionType, Facts, HealthStatus, IntegrationConfig,
    IntegrationType, Node, NodeResult, RiskLevel, Transport, User, ADMIN_ROLE, DEFAULT_PRIORITY,
    WILDCARD_PERMISSION,
};

pub use traits::{ExecutionTool, InformationSource, IntegrationPlugin, PluginHandle};
