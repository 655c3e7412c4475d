//! # Cache Coordinator
//!
//! Owns one background task per running cache.
//!
//! ## Overview
//!
//! The `CacheCoordinator` spawns a [`CacheController`] loop for each parent
//! playlist it is asked to start, tracks the task's cancellation token, and
//! forgets the task once it reaches a terminal state. Each cache runs on its
//! own tokio task; a slow provider call for one cache never holds up another.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::CacheCoordinator;
//!
//! let coordinator = CacheCoordinator::new(provider, repository, event_bus);
//! let handle = coordinator.start("37i9dQZF1DXcBWIGoYBM5M").await?;
//!
//! // Later, from a signal handler
//! coordinator.stop_all().await;
//! let final_state = handle.await?;
//! ```

use crate::controller::{CacheController, ControllerOptions};
use crate::lifecycle::CacheState;
use crate::repository::CacheConfigRepository;
use crate::{Result, SyncError};
use bridge_traits::provider::PlaylistProvider;
use core_runtime::events::EventBus;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Running cache task tracking
struct ActiveCache {
    /// Distinguishes a restarted task from the one it replaced
    generation: u64,
    cancellation_token: CancellationToken,
}

/// Coordinator for every cache task in the process
pub struct CacheCoordinator {
    provider: Arc<dyn PlaylistProvider>,
    repository: Arc<dyn CacheConfigRepository>,
    event_bus: EventBus,
    options: ControllerOptions,

    /// Running tasks by parent playlist id
    active: Arc<Mutex<HashMap<String, ActiveCache>>>,
    next_generation: AtomicU64,
}

impl CacheCoordinator {
    pub fn new(
        provider: Arc<dyn PlaylistProvider>,
        repository: Arc<dyn CacheConfigRepository>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            provider,
            repository,
            event_bus,
            options: ControllerOptions::default(),
            active: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
        }
    }

    pub fn with_options(mut self, options: ControllerOptions) -> Self {
        self.options = options;
        self
    }

    /// Spawn the lifecycle loop for `parent_id`.
    ///
    /// The returned handle resolves to the task's terminal state.
    ///
    /// # Errors
    ///
    /// - [`SyncError::AlreadyRunning`] if a task for this parent is running
    /// - [`SyncError::CacheNotFound`] if the parent has no cache record
    /// - [`SyncError::Config`] if the record is invalid
    #[instrument(skip(self))]
    pub async fn start(&self, parent_id: &str) -> Result<JoinHandle<CacheState>> {
        let config = self
            .repository
            .read(parent_id)
            .await?
            .ok_or_else(|| SyncError::CacheNotFound {
                parent_id: parent_id.to_string(),
            })?;
        config.validate()?;

        let mut active = self.active.lock().await;
        if active.contains_key(parent_id) {
            return Err(SyncError::AlreadyRunning {
                parent_id: parent_id.to_string(),
            });
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let cancellation_token = CancellationToken::new();
        active.insert(
            parent_id.to_string(),
            ActiveCache {
                generation,
                cancellation_token: cancellation_token.clone(),
            },
        );

        let controller = CacheController::new(
            parent_id,
            Arc::clone(&self.provider),
            Arc::clone(&self.repository),
            self.event_bus.clone(),
        )
        .with_options(self.options.clone());

        let registry = Arc::clone(&self.active);
        let key = parent_id.to_string();
        let handle = tokio::spawn(async move {
            let state = controller.run(cancellation_token).await;

            let mut active = registry.lock().await;
            if active.get(&key).map(|a| a.generation) == Some(generation) {
                active.remove(&key);
            }

            info!(parent_id = %key, state = %state, "Cache task finished");
            state
        });

        info!(parent_id, "Started cache task");
        Ok(handle)
    }

    /// Start every active cache in the store.
    ///
    /// Caches that fail to start are logged and skipped.
    pub async fn start_all(&self) -> Result<Vec<(String, JoinHandle<CacheState>)>> {
        let mut handles = Vec::new();

        for config in self.repository.list_configs().await? {
            if !config.active {
                info!(parent_id = %config.parent_id, "Skipping inactive cache");
                continue;
            }
            match self.start(&config.parent_id).await {
                Ok(handle) => handles.push((config.parent_id, handle)),
                Err(e) => warn!(parent_id = %config.parent_id, error = %e, "Cache not started"),
            }
        }

        Ok(handles)
    }

    /// Cancel the task for `parent_id`. Takes effect at its next sleep.
    ///
    /// Returns `false` if no task was running.
    pub async fn stop(&self, parent_id: &str) -> bool {
        let active = self.active.lock().await;
        match active.get(parent_id) {
            Some(task) => {
                task.cancellation_token.cancel();
                info!(parent_id, "Cancelling cache task");
                true
            }
            None => false,
        }
    }

    pub async fn stop_all(&self) {
        let active = self.active.lock().await;
        for task in active.values() {
            task.cancellation_token.cancel();
        }
        info!(count = active.len(), "Cancelling all cache tasks");
    }

    pub async fn is_running(&self, parent_id: &str) -> bool {
        self.active.lock().await.contains_key(parent_id)
    }

    /// Parent ids of every running task, sorted.
    pub async fn running(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.active.lock().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}
