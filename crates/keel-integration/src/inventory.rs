// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Multi-source inventory views.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use keel_core::{Facts, Node};
use serde::Serialize;

/// Per-source outcome of an aggregation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    Healthy,
    /// Answered, but its last known health check was unhealthy.
    Degraded,
    /// Failed or timed out; contributed no nodes.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    pub node_count: usize,
    pub last_sync: DateTime<Utc>,
    pub status: SourceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Deduplicated inventory: one record per node id, highest-priority source wins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedInventory {
    pub nodes: Vec<Node>,
    pub sources: BTreeMap<String, SourceInfo>,
}

/// Inventory merged by node identity, with every contributing source listed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkedInventory {
    pub nodes: Vec<Node>,
    pub sources: BTreeMap<String, SourceInfo>,
}

/// A node plus the facts every source holding it returned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeData {
    pub node: Node,
    /// Keyed by source name. A source whose fact lookup failed maps to empty facts.
    pub facts: BTreeMap<String, Facts>,
}

/// One source's answer during a fan-out, tagged for ordering.
#[derive(Debug)]
pub(crate) struct SourceInventory {
    pub(crate) name: String,
    pub(crate) priority: i32,
    /// Registration position, breaks priority ties.
    pub(crate) order: usize,
    pub(crate) nodes: Vec<Node>,
    pub(crate) info: SourceInfo,
}

/// Keep the first record per id after ordering sources by priority
/// (descending) then registration order.
pub(crate) fn deduplicate_by_priority(sources: &[SourceInventory]) -> Vec<Node> {
    let mut ranked: Vec<&SourceInventory> = sources.iter().collect();
    ranked.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.order.cmp(&b.order)));

    let mut seen = HashSet::new();
    let mut nodes = Vec::new();
    for source in ranked {
        for node in &source.nodes {
            if seen.insert(node.id.as_str()) {
                nodes.push(node.clone());
            }
        }
    }
    nodes
}
