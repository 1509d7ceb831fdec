// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Health-check cache and the optional periodic refresh task.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use keel_core::HealthStatus;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Last known health per plugin.
///
/// Entries never expire on their own; callers choose per call whether to use
/// them, and `clear` drops them all.
#[derive(Debug, Default)]
pub struct HealthCheckCache {
    entries: RwLock<HashMap<String, HealthStatus>>,
}

impl HealthCheckCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, plugin: &str) -> Option<HealthStatus> {
        self.entries.read().await.get(plugin).cloned()
    }

    pub async fn insert(&self, plugin: &str, status: HealthStatus) {
        self.entries.write().await.insert(plugin.to_string(), status);
    }

    pub async fn remove(&self, plugin: &str) -> Option<HealthStatus> {
        self.entries.write().await.remove(plugin)
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Return the cached status when `use_cache` is set and one exists,
    /// otherwise run `refresh` and store its result.
    pub async fn get_or_refresh<F, Fut>(
        &self,
        plugin: &str,
        use_cache: bool,
        refresh: F,
    ) -> HealthStatus
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = HealthStatus>,
    {
        if use_cache && let Some(cached) = self.get(plugin).await {
            return cached;
        }
        let status = refresh().await;
        self.insert(plugin, status.clone()).await;
        status
    }
}

struct ScheduledTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns at most one periodic background task.
#[derive(Default)]
pub struct HealthCheckScheduler {
    task: Mutex<Option<ScheduledTask>>,
}

impl HealthCheckScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn the periodic task. Returns `false` if one is already running.
    ///
    /// The first run happens one `interval` after start. The task exits when
    /// `tick` resolves to `false` or the scheduler is stopped.
    pub fn start<F, Fut>(&self, interval: Duration, mut tick: F) -> bool
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let mut slot = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|task| !task.handle.is_finished()) {
            debug!("health check scheduler already running");
            return false;
        }

        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // Skip the first immediate tick.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if !tick().await {
                            debug!("health check scheduler owner dropped");
                            break;
                        }
                    }
                    _ = task_cancel.cancelled() => {
                        break;
                    }
                }
            }
        });

        *slot = Some(ScheduledTask { cancel, handle });
        info!(interval_secs = interval.as_secs_f64(), "health check scheduler started");
        true
    }

    /// Stop the task and wait for it to exit. Returns `false` if none was running.
    pub async fn stop(&self) -> bool {
        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(task) = task else {
            return false;
        };
        task.cancel.cancel();
        let _ = task.handle.await;
        info!("health check scheduler stopped");
        true
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }
}

impl Drop for HealthCheckScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().unwrap_or_else(PoisonError::into_inner).take() {
            task.cancel.cancel();
        }
    }
}
