//! # Cache Lifecycle Controller
//!
//! Drives one managed cache through the [`CacheState`] machine.
//!
//! ## Cycle
//!
//! 1. `LOADING`: re-read the cache record; an inactive record stops the loop
//! 2. `HEALTH_CHECK`: the cache id must appear in the user's playlist list
//! 3. `ENSURING_CACHE_PLAYLIST`: create a replacement cache and persist its id
//! 4. `RECONCILING`: fetch parent, cache and history sets, plan, apply
//! 5. `SLEEPING`: wait `interval` seconds or until cancelled
//!
//! Authentication failures end the loop in `FATAL`. Any other failure is
//! logged, reported as [`CacheEvent::CycleFailed`] and retried next cycle.

use crate::aggregator::{aggregate_common_tracks, HistorySnapshot, TrackSet};
use crate::config::{cache_description, CacheConfig};
use crate::lifecycle::CacheState;
use crate::reconcile;
use crate::repository::CacheConfigRepository;
use crate::{Result, SyncError};
use bridge_traits::http::RetryPolicy;
use bridge_traits::provider::{PlaylistProvider, TrackId};
use core_runtime::events::{CacheEvent, CoreEvent, EventBus};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Tuning knobs shared by every controller a coordinator spawns.
#[derive(Debug, Clone, Default)]
pub struct ControllerOptions {
    /// Attempts and backoff for listing the user's playlists during the
    /// health check
    pub health_check_retry: RetryPolicy,
}

/// Summary of one successful cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub cache_id: String,
    /// A new cache playlist was created this cycle
    pub recreated: bool,
    pub added: usize,
    pub removed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Reconciled(CycleReport),
    /// The record has `active = false`
    Inactive,
}

/// Controller for a single parent/cache pair.
pub struct CacheController {
    parent_id: String,
    provider: Arc<dyn PlaylistProvider>,
    repository: Arc<dyn CacheConfigRepository>,
    event_bus: EventBus,
    options: ControllerOptions,
    state: CacheState,
    /// Interval from the last record that loaded, used after failed cycles
    interval: Option<Duration>,
}

impl CacheController {
    pub fn new(
        parent_id: impl Into<String>,
        provider: Arc<dyn PlaylistProvider>,
        repository: Arc<dyn CacheConfigRepository>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            parent_id: parent_id.into(),
            provider,
            repository,
            event_bus,
            options: ControllerOptions::default(),
            state: CacheState::Sleeping,
            interval: None,
        }
    }

    pub fn with_options(mut self, options: ControllerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn parent_id(&self) -> &str {
        &self.parent_id
    }

    pub fn state(&self) -> CacheState {
        self.state
    }

    fn transition(&mut self, next: CacheState) {
        if !self.state.can_transition_to(next) {
            warn!(
                parent_id = %self.parent_id,
                from = %self.state,
                to = %next,
                "Unexpected cache state transition"
            );
        }
        debug!(parent_id = %self.parent_id, state = %next, "Cache state");
        self.state = next;
    }

    fn emit(&self, event: CacheEvent) {
        // No subscribers is fine
        self.event_bus.emit(CoreEvent::Cache(event)).ok();
    }

    // ========================================================================
    // Loop
    // ========================================================================

    /// Run cycles until the record is deactivated, `cancel` fires while
    /// sleeping, or authentication fails. Returns the terminal state.
    #[instrument(skip(self, cancel), fields(parent_id = %self.parent_id))]
    pub async fn run(mut self, cancel: CancellationToken) -> CacheState {
        let mut first_cycle = true;

        loop {
            self.emit(CacheEvent::CycleStarted {
                parent_id: self.parent_id.clone(),
            });

            match self.run_cycle().await {
                Ok(CycleOutcome::Inactive) => {
                    info!("Cache deactivated, stopping");
                    return self.finish(CacheState::Stopped);
                }
                Ok(CycleOutcome::Reconciled(report)) => {
                    self.emit(CacheEvent::Reconciled {
                        parent_id: self.parent_id.clone(),
                        cache_id: report.cache_id,
                        added: report.added as u64,
                        removed: report.removed as u64,
                    });
                }
                Err(e) if e.is_fatal() => {
                    error!(error = %e, "Authentication failed, cache task cannot continue");
                    self.emit(CacheEvent::CycleFailed {
                        parent_id: self.parent_id.clone(),
                        message: e.to_string(),
                        retryable: false,
                    });
                    return self.finish(CacheState::Fatal);
                }
                Err(e) if e.is_config() && first_cycle => {
                    error!(error = %e, "Cache record unusable at startup");
                    self.emit(CacheEvent::CycleFailed {
                        parent_id: self.parent_id.clone(),
                        message: e.to_string(),
                        retryable: false,
                    });
                    return self.finish(CacheState::Fatal);
                }
                Err(e) => {
                    error!(state = %self.state, error = %e, "Cycle failed, retrying next cycle");
                    self.emit(CacheEvent::CycleFailed {
                        parent_id: self.parent_id.clone(),
                        message: e.to_string(),
                        retryable: true,
                    });
                }
            }

            first_cycle = false;
            self.transition(CacheState::Sleeping);

            let interval = self
                .interval
                .unwrap_or(Duration::from_secs(crate::config::DEFAULT_INTERVAL_SECS));
            debug!(seconds = interval.as_secs(), "Sleeping until next cycle");

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Cache task cancelled");
                    return self.finish(CacheState::Stopped);
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    fn finish(&mut self, state: CacheState) -> CacheState {
        self.transition(state);
        self.emit(CacheEvent::Stopped {
            parent_id: self.parent_id.clone(),
            state: state.to_string(),
        });
        state
    }

    // ========================================================================
    // Cycle
    // ========================================================================

    /// Run one `LOADING` to `RECONCILING` pass without sleeping.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome> {
        self.transition(CacheState::Loading);
        let mut config = self.load().await?;
        if !config.active {
            return Ok(CycleOutcome::Inactive);
        }

        self.transition(CacheState::HealthCheck);
        let healthy = match config.cache_id.as_deref() {
            Some(cache_id) => self.check_cache_health(cache_id).await?,
            None => false,
        };

        let recreated = !healthy;
        if recreated {
            self.transition(CacheState::EnsuringCachePlaylist);
            self.recreate_cache(&mut config).await?;
        }

        let cache_id = config
            .cache_id
            .clone()
            .ok_or_else(|| SyncError::Config(format!("{} has no cache playlist", self.parent_id)))?;

        self.transition(CacheState::Reconciling);
        let (added, removed) = self.reconcile(&config, &cache_id, recreated).await?;

        Ok(CycleOutcome::Reconciled(CycleReport {
            cache_id,
            recreated,
            added,
            removed,
        }))
    }

    async fn load(&mut self) -> Result<CacheConfig> {
        let config = self
            .repository
            .read(&self.parent_id)
            .await?
            .ok_or_else(|| SyncError::CacheNotFound {
                parent_id: self.parent_id.clone(),
            })?;
        config.validate()?;
        self.interval = Some(config.poll_interval());
        Ok(config)
    }

    /// Whether `cache_id` is in the user's playlist list.
    ///
    /// Transient failures are retried; when every attempt fails the cache is
    /// treated as missing.
    #[instrument(skip(self), fields(parent_id = %self.parent_id))]
    async fn check_cache_health(&self, cache_id: &str) -> Result<bool> {
        let policy = &self.options.health_check_retry;
        let attempts = policy.max_attempts.max(1);

        for attempt in 0..attempts {
            match self.provider.get_user_playlists().await {
                Ok(playlists) => {
                    let found = playlists.iter().any(|p| p.id == cache_id);
                    if !found {
                        warn!("Cache playlist is no longer in the user's library");
                    }
                    return Ok(found);
                }
                Err(e) => {
                    let e = SyncError::from(e);
                    if e.is_fatal() {
                        return Err(e);
                    }
                    warn!(attempt = attempt + 1, error = %e, "Health check failed");
                    if attempt + 1 < attempts {
                        tokio::time::sleep(policy.delay_for(attempt)).await;
                    }
                }
            }
        }

        warn!(attempts, "Health check exhausted retries, treating cache as missing");
        Ok(false)
    }

    /// Create a fresh, empty cache playlist and persist its id and the
    /// parent's current name.
    ///
    /// Only those two fields are patched onto the stored record so operator
    /// edits made during the cycle survive.
    #[instrument(skip(self, config), fields(parent_id = %self.parent_id))]
    async fn recreate_cache(&self, config: &mut CacheConfig) -> Result<()> {
        let parent = self.provider.get_playlist(&self.parent_id).await?;
        let owner_id = self.provider.get_current_user_id().await?;

        config.parent_name = parent.name;
        let new_cache_id = self
            .provider
            .create_playlist(
                &owner_id,
                &config.cache_name(),
                &cache_description(&config.parent_name),
            )
            .await?;
        let old_cache_id = config.cache_id.replace(new_cache_id.clone());

        if let Err(e) = self.persist_cache_id(&config.parent_name, &new_cache_id).await {
            error!(
                orphaned_cache_id = %new_cache_id,
                error = %e,
                "Created cache playlist but could not save it, the playlist is orphaned"
            );
            return Err(e);
        }

        info!(
            old_cache_id = old_cache_id.as_deref().unwrap_or("-"),
            cache_id = %new_cache_id,
            "Created cache playlist"
        );
        self.emit(CacheEvent::CacheRecreated {
            parent_id: self.parent_id.clone(),
            old_cache_id,
            new_cache_id,
        });
        Ok(())
    }

    async fn persist_cache_id(&self, parent_name: &str, cache_id: &str) -> Result<()> {
        let mut stored = self
            .repository
            .read(&self.parent_id)
            .await?
            .ok_or_else(|| SyncError::CacheNotFound {
                parent_id: self.parent_id.clone(),
            })?;
        stored.parent_name = parent_name.to_string();
        stored.cache_id = Some(cache_id.to_string());
        self.repository.write(&stored).await
    }

    /// Fetch, plan and apply. Returns `(added, removed)`.
    #[instrument(skip(self, config), fields(parent_id = %self.parent_id))]
    async fn reconcile(
        &self,
        config: &CacheConfig,
        cache_id: &str,
        cache_is_new: bool,
    ) -> Result<(usize, usize)> {
        let parent_tracks = self.fetch_parent_tracks(config).await?;

        let cache_tracks: Vec<TrackId> = if cache_is_new {
            Vec::new()
        } else {
            self.provider.get_playlist_track_ids(cache_id).await?
        };

        let global = self.repository.global_settings().await?;
        let repeat_source = config.effective_repeat_source(&global);
        let history = HistorySnapshot::fetch(self.provider.as_ref(), config, repeat_source).await;
        if let Some(SyncError::Auth(message)) = history.fatal_error() {
            return Err(SyncError::Auth(message.clone()));
        }
        let common = aggregate_common_tracks(&history, config);

        let plan = reconcile::plan(
            &parent_tracks,
            &cache_tracks,
            &common,
            config.minimum_retained_size,
        );

        debug!(
            parent = parent_tracks.len(),
            cache = cache_tracks.len(),
            common = common.len(),
            failed_signals = history.failures(),
            "Track sets fetched"
        );

        if plan.is_empty() {
            info!(cache_id, "Cache already up to date");
            return Ok((0, 0));
        }

        if !plan.to_add.is_empty() {
            self.provider
                .add_tracks(cache_id, &plan.additions())
                .await?;
        }
        if !plan.to_remove.is_empty() {
            self.provider
                .remove_all_occurrences(cache_id, &plan.to_remove)
                .await?;
        }

        info!(
            cache_id,
            added = plan.to_add.len(),
            removed = plan.to_remove.len(),
            "Cache reconciled"
        );
        Ok((plan.to_add.len(), plan.to_remove.len()))
    }

    /// Parent tracks unioned with every alternate source.
    async fn fetch_parent_tracks(&self, config: &CacheConfig) -> Result<TrackSet> {
        let mut tracks = TrackSet::new();
        let sources = std::iter::once(&self.parent_id).chain(config.alt_sources.iter());

        for playlist_id in sources {
            let ids = self.provider.get_playlist_track_ids(playlist_id).await?;
            tracks.extend(ids);
        }
        Ok(tracks)
    }
}
