// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime side of the Keel integration kernel.
//!
//! [`IntegrationManager`] owns plugin lifecycles and serves the multi-source
//! views (aggregated inventory, linked inventory, node data, health). A
//! failing backend is reported in the result and never fails the call.

pub mod bootstrap;
pub mod health;
pub mod inventory;
pub mod linking;
pub mod manager;

pub use bootstrap::{plugin_sources, start, StartupReport};
pub use health::{HealthCheckCache, HealthCheckScheduler};
pub use inventory::{AggregatedInventory, LinkedInventory, NodeData, SourceInfo, SourceStatus};
pub use linking::{
    extract_hostname, find_matching_nodes, NodeLinkingService, DEFAULT_AUTHORITATIVE_SOURCE,
};
pub use manager::{IntegrationManager, ManagerOptions, PluginError, PluginSummary};
