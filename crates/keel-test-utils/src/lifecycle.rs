// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lifecycle bookkeeping shared by the mock plugins.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use keel_core::{Capability, HealthStatus, IntegrationConfig, KeelError, Widget};

/// Shared record of lifecycle events, as `"start <name>"` and `"done <name>"`.
pub type LifecycleLog = Arc<Mutex<Vec<String>>>;

pub(crate) struct MockLifecycle {
    pub(crate) name: String,
    initialized: AtomicBool,
    config: Mutex<Option<IntegrationConfig>>,
    pub(crate) init_error: Option<String>,
    pub(crate) init_delay: Option<Duration>,
    pub(crate) log: Option<LifecycleLog>,
    pub(crate) health: Result<HealthStatus, String>,
    pub(crate) capabilities: Vec<Capability>,
    pub(crate) widgets: Vec<Widget>,
    init_calls: AtomicUsize,
    health_calls: AtomicUsize,
    shutdown_calls: AtomicUsize,
}

impl MockLifecycle {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            initialized: AtomicBool::new(false),
            config: Mutex::new(None),
            init_error: None,
            init_delay: None,
            log: None,
            health: Ok(HealthStatus::healthy("mock healthy")),
            capabilities: Vec::new(),
            widgets: Vec::new(),
            init_calls: AtomicUsize::new(0),
            health_calls: AtomicUsize::new(0),
            shutdown_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) async fn initialize(&self, config: IntegrationConfig) -> Result<(), KeelError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        self.record("start");
        if let Some(delay) = self.init_delay {
            tokio::time::sleep(delay).await;
        }
        let result = match &self.init_error {
            Some(message) => Err(KeelError::plugin(&self.name, message.clone())),
            None => {
                *self.config.lock().unwrap_or_else(PoisonError::into_inner) = Some(config);
                self.initialized.store(true, Ordering::SeqCst);
                Ok(())
            }
        };
        self.record("done");
        result
    }

    fn record(&self, event: &str) {
        if let Some(log) = &self.log {
            log.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(format!("{event} {}", self.name));
        }
    }

    pub(crate) fn health_check(&self) -> Result<HealthStatus, KeelError> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        self.health
            .clone()
            .map_err(|message| KeelError::plugin(&self.name, message))
    }

    pub(crate) fn shutdown(&self) {
        self.shutdown_calls.fetch_add(1, Ordering::SeqCst);
        self.initialized.store(false, Ordering::SeqCst);
    }

    pub(crate) fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub(crate) fn config(&self) -> Option<IntegrationConfig> {
        self.config.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub(crate) fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn health_calls(&self) -> usize {
        self.health_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn shutdown_calls(&self) -> usize {
        self.shutdown_calls.load(Ordering::SeqCst)
    }
}

/// Implements the builder and counter methods every mock shares.
macro_rules! lifecycle_builders {
    ($mock:ty) => {
        impl $mock {
            /// Make `initialize` fail with `message`.
            pub fn failing_init(mut self, message: &str) -> Self {
                self.lifecycle.init_error = Some(message.to_string());
                self
            }

            /// Sleep inside `initialize` before completing.
            pub fn with_init_delay(mut self, delay: std::time::Duration) -> Self {
                self.lifecycle.init_delay = Some(delay);
                self
            }

            /// Append `initialize` start and completion events to `log`.
            pub fn with_lifecycle_log(mut self, log: crate::LifecycleLog) -> Self {
                self.lifecycle.log = Some(log);
                self
            }

            /// Report an unhealthy status from `health_check`.
            pub fn unhealthy(mut self, message: &str) -> Self {
                self.lifecycle.health = Ok(keel_core::HealthStatus::unhealthy(message));
                self
            }

            /// Make `health_check` itself fail with `message`.
            pub fn failing_health(mut self, message: &str) -> Self {
                self.lifecycle.health = Err(message.to_string());
                self
            }

            pub fn with_capability(mut self, capability: keel_core::Capability) -> Self {
                self.lifecycle.capabilities.push(capability);
                self
            }

            pub fn with_widget(mut self, widget: keel_core::Widget) -> Self {
                self.lifecycle.widgets.push(widget);
                self
            }

            pub fn init_calls(&self) -> usize {
                self.lifecycle.init_calls()
            }

            pub fn health_calls(&self) -> usize {
                self.lifecycle.health_calls()
            }

            pub fn shutdown_calls(&self) -> usize {
                self.lifecycle.shutdown_calls()
            }
        }
    };
}

/// Implements `IntegrationPlugin` by delegating to the embedded lifecycle.
macro_rules! delegate_plugin {
    ($mock:ty, $kind:expr) => {
        #[async_trait::async_trait]
        impl keel_core::IntegrationPlugin for $mock {
            fn name(&self) -> &str {
                &self.lifecycle.name
            }

            fn integration_type(&self) -> keel_core::IntegrationType {
                $kind
            }

            async fn initialize(
                &self,
                config: keel_core::IntegrationConfig,
            ) -> Result<(), keel_core::KeelError> {
                self.lifecycle.initialize(config).await
            }

            async fn health_check(&self) -> Result<keel_core::HealthStatus, keel_core::KeelError> {
                self.lifecycle.health_check()
            }

            fn is_initialized(&self) -> bool {
                self.lifecycle.is_initialized()
            }

            fn config(&self) -> Option<keel_core::IntegrationConfig> {
                self.lifecycle.config()
            }

            async fn shutdown(&self) -> Result<(), keel_core::KeelError> {
                self.lifecycle.shutdown();
                Ok(())
            }

            fn capabilities(&self) -> Vec<keel_core::Capability> {
                self.lifecycle.capabilities.clone()
            }

            fn widgets(&self) -> Vec<keel_core::Widget> {
                self.lifecycle.widgets.clone()
            }
        }
    };
}

pub(crate) use delegate_plugin;
pub(crate) use lifecycle_builders;
