// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock execution tool for deterministic testing.
//!
//! `MockExecutionTool` captures every action it receives and reports success
//! for each target, unless told to fail.

use async_trait::async_trait;
use tokio::sync::Mutex;

use keel_core::{
    Action, ActionResult, ActionStatus, ExecutionTool, IntegrationType, KeelError, NodeResult,
};

use crate::lifecycle::{delegate_plugin, lifecycle_builders, MockLifecycle};

/// Build a per-target success result echoing the action.
pub(crate) fn succeed(action: &Action, tool: &str) -> ActionResult {
    let results = action
        .targets
        .iter()
        .map(|target| NodeResult {
            node_id: target.clone(),
            status: ActionStatus::Success,
            output: Some(format!("{tool}: {}", action.action)),
            error: None,
        })
        .collect();
    ActionResult::completed(action, ActionStatus::Success, results)
}

pub struct MockExecutionTool {
    pub(crate) lifecycle: MockLifecycle,
    executed: Mutex<Vec<Action>>,
    execution_error: Option<String>,
    supported: Vec<String>,
}

impl MockExecutionTool {
    pub fn new(name: &str) -> Self {
        Self {
            lifecycle: MockLifecycle::new(name),
            executed: Mutex::new(Vec::new()),
            execution_error: None,
            supported: vec!["command".to_string()],
        }
    }

    /// Make `execute_action` fail with `message`.
    pub fn failing_execution(mut self, message: &str) -> Self {
        self.execution_error = Some(message.to_string());
        self
    }

    /// Actions received so far, in call order.
    pub async fn executed_actions(&self) -> Vec<Action> {
        self.executed.lock().await.clone()
    }
}

lifecycle_builders!(MockExecutionTool);
delegate_plugin!(MockExecutionTool, IntegrationType::Execution);

#[async_trait]
impl ExecutionTool for MockExecutionTool {
    async fn execute_action(&self, action: Action) -> Result<ActionResult, KeelError> {
        self.executed.lock().await.push(action.clone());
        if let Some(message) = &self.execution_error {
            return Err(KeelError::plugin(&self.lifecycle.name, message.clone()));
        }
        Ok(succeed(&action, &self.lifecycle.name))
    }

    fn list_capabilities(&self) -> Vec<String> {
        self.supported.clone()
    }
}
