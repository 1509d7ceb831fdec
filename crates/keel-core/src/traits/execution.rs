// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Execution tool trait for remote action runners.

use async_trait::async_trait;

use crate::error::KeelError;
use crate::traits::plugin::IntegrationPlugin;
use crate::types::{Action, ActionResult};

/// A plugin that runs remote actions (commands, tasks, plans).
#[async_trait]
pub trait ExecutionTool: IntegrationPlugin {
    /// Run an action against its target nodes.
    async fn execute_action(&self, action: Action) -> Result<ActionResult, KeelError>;

    /// Names of the actions this tool understands.
    fn list_capabilities(&self) -> Vec<String> {
        Vec::new()
    }
}
