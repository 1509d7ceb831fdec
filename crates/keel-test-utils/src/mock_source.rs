// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock information source for deterministic testing.
//!
//! `MockInformationSource` serves a fixed inventory and per-node facts, and can
//! be told to fail or stall any of its calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use keel_core::{Facts, InformationSource, IntegrationType, KeelError, Node};

use crate::lifecycle::{delegate_plugin, lifecycle_builders, MockLifecycle};

/// A scripted inventory backend.
pub struct MockInformationSource {
    pub(crate) lifecycle: MockLifecycle,
    nodes: Mutex<Vec<Node>>,
    facts: HashMap<String, Map<String, Value>>,
    node_data: HashMap<(String, String), Value>,
    inventory_error: Option<String>,
    facts_error: Option<String>,
    inventory_delay: Option<Duration>,
    inventory_calls: AtomicUsize,
}

impl MockInformationSource {
    /// Create a healthy source with an empty inventory.
    pub fn new(name: &str) -> Self {
        Self {
            lifecycle: MockLifecycle::new(name),
            nodes: Mutex::new(Vec::new()),
            facts: HashMap::new(),
            node_data: HashMap::new(),
            inventory_error: None,
            facts_error: None,
            inventory_delay: None,
            inventory_calls: AtomicUsize::new(0),
        }
    }

    /// Serve these nodes from `get_inventory`.
    pub fn with_nodes(self, nodes: Vec<Node>) -> Self {
        Self {
            nodes: Mutex::new(nodes),
            ..self
        }
    }

    pub fn with_facts(mut self, node_id: &str, facts: Value) -> Self {
        let values = match facts {
            Value::Object(map) => map,
            other => Map::from_iter([("value".to_string(), other)]),
        };
        self.facts.insert(node_id.to_string(), values);
        self
    }

    pub fn with_node_data(mut self, node_id: &str, data_type: &str, data: Value) -> Self {
        self.node_data
            .insert((node_id.to_string(), data_type.to_string()), data);
        self
    }

    /// Make `get_inventory` fail with `message`.
    pub fn failing_inventory(mut self, message: &str) -> Self {
        self.inventory_error = Some(message.to_string());
        self
    }

    /// Make `get_node_facts` fail with `message`.
    pub fn failing_facts(mut self, message: &str) -> Self {
        self.facts_error = Some(message.to_string());
        self
    }

    /// Sleep before answering `get_inventory`.
    pub fn with_inventory_delay(mut self, delay: Duration) -> Self {
        self.inventory_delay = Some(delay);
        self
    }

    /// Replace the served inventory.
    pub async fn set_nodes(&self, nodes: Vec<Node>) {
        *self.nodes.lock().await = nodes;
    }

    pub fn inventory_calls(&self) -> usize {
        self.inventory_calls.load(Ordering::SeqCst)
    }
}

lifecycle_builders!(MockInformationSource);
delegate_plugin!(MockInformationSource, IntegrationType::Information);

#[async_trait]
impl InformationSource for MockInformationSource {
    async fn get_inventory(&self) -> Result<Vec<Node>, KeelError> {
        self.inventory_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.inventory_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.inventory_error {
            return Err(KeelError::plugin(&self.lifecycle.name, message.clone()));
        }
        Ok(self.nodes.lock().await.clone())
    }

    async fn get_node_facts(&self, node_id: &str) -> Result<Facts, KeelError> {
        if let Some(message) = &self.facts_error {
            return Err(KeelError::plugin(&self.lifecycle.name, message.clone()));
        }
        let values = self.facts.get(node_id).cloned().unwrap_or_default();
        Ok(Facts::new(node_id, &self.lifecycle.name, values))
    }

    async fn get_node_data(&self, node_id: &str, data_type: &str) -> Result<Value, KeelError> {
        self.node_data
            .get(&(node_id.to_string(), data_type.to_string()))
            .cloned()
            .ok_or_else(|| {
                KeelError::plugin(
                    &self.lifecycle.name,
                    format!("no '{data_type}' data for node '{node_id}'"),
                )
            })
    }
}
