// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A plugin that is both an information source and an execution tool.

use async_trait::async_trait;
use tokio::sync::Mutex;

use keel_core::{
    Action, ActionResult, ExecutionTool, Facts, InformationSource, IntegrationType, KeelError,
    Node,
};

use crate::lifecycle::{delegate_plugin, lifecycle_builders, MockLifecycle};
use crate::mock_tool::succeed;

/// Serves a fixed inventory and accepts actions, like an SSH plugin would.
pub struct MockHybridPlugin {
    pub(crate) lifecycle: MockLifecycle,
    nodes: Vec<Node>,
    executed: Mutex<Vec<Action>>,
}

impl MockHybridPlugin {
    pub fn new(name: &str) -> Self {
        Self {
            lifecycle: MockLifecycle::new(name),
            nodes: Vec::new(),
            executed: Mutex::new(Vec::new()),
        }
    }

    pub fn with_nodes(mut self, nodes: Vec<Node>) -> Self {
        self.nodes = nodes;
        self
    }

    pub async fn executed_actions(&self) -> Vec<Action> {
        self.executed.lock().await.clone()
    }
}

lifecycle_builders!(MockHybridPlugin);
delegate_plugin!(MockHybridPlugin, IntegrationType::Both);

#[async_trait]
impl InformationSource for MockHybridPlugin {
    async fn get_inventory(&self) -> Result<Vec<Node>, KeelError> {
        Ok(self.nodes.clone())
    }

    async fn get_node_facts(&self, node_id: &str) -> Result<Facts, KeelError> {
        Ok(Facts::empty(node_id, &self.lifecycle.name))
    }
}

#[async_trait]
impl ExecutionTool for MockHybridPlugin {
    async fn execute_action(&self, action: Action) -> Result<ActionResult, KeelError> {
        self.executed.lock().await.push(action.clone());
        Ok(succeed(&action, &self.lifecycle.name))
    }
}
