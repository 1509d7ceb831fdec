// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Information source trait for inventory and fact providers.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::KeelError;
use crate::traits::plugin::IntegrationPlugin;
use crate::types::{Facts, Node};

/// A plugin exposing inventory, fact, and node-data queries.
///
/// Each call crosses a trust boundary and is expected to enforce its own
/// timeout.
#[async_trait]
pub trait InformationSource: IntegrationPlugin {
    /// All nodes known to this source.
    async fn get_inventory(&self) -> Result<Vec<Node>, KeelError>;

    /// Facts for a single node.
    async fn get_node_facts(&self, node_id: &str) -> Result<Facts, KeelError>;

    /// Source-specific data (reports, catalogs, events) for a node.
    async fn get_node_data(&self, node_id: &str, data_type: &str) -> Result<Value, KeelError> {
        let _ = node_id;
        Err(KeelError::plugin(
            self.name(),
            format!("data type '{data_type}' is not supported"),
        ))
    }
}
