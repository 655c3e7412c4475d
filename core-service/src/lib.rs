//! Core service façade and bootstrap helpers.
//!
//! This crate wires the host bridges from a [`CoreConfig`] (HTTP client,
//! token store) into the playlist cache core: the OAuth manager, the
//! streaming service connector, the JSON config store and the cache task
//! coordinator. Front ends such as the CLI only talk to [`CoreService`].

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::provider::{PlaylistProvider, PlaylistSummary};
use core_auth::{AuthManager, AuthState, OAuthConfig, OAuthFlowManager, TokenProvider};
use core_runtime::config::CoreConfig;
use core_runtime::events::EventBus;
use core_sync::{
    CacheConfig, CacheConfigRepository, CacheCoordinator, CacheState, JsonCacheConfigRepository,
    SyncError,
};
use provider_spotify::SpotifyConnector;
use tokio::task::JoinHandle;
use tracing::{info, instrument};

/// Changes requested for one cache record. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheUpdate {
    pub cache_id: Option<String>,
    pub use_long_term_window: Option<bool>,
    pub minimum_retained_size: Option<usize>,
    pub poll_interval_seconds: Option<u64>,
}

/// Primary façade exposed to front ends.
#[derive(Clone)]
pub struct CoreService {
    event_bus: EventBus,
    auth: Arc<AuthManager>,
    provider: Arc<dyn PlaylistProvider>,
    repository: Arc<dyn CacheConfigRepository>,
    coordinator: Arc<CacheCoordinator>,
}

impl CoreService {
    /// Build every component from a validated configuration.
    pub fn new(config: CoreConfig) -> Result<Self> {
        let http_client = config
            .http_client
            .clone()
            .ok_or_else(|| CoreError::CapabilityMissing {
                capability: "HttpClient".to_string(),
                message: "No HTTP client configured. Enable the 'desktop-shims' feature \
                          or inject one with CoreConfig::builder().http_client()."
                    .to_string(),
            })?;

        let event_bus = EventBus::new(config.event_buffer_size);

        let oauth = OAuthFlowManager::new(OAuthConfig::spotify(&config.oauth), Arc::clone(&http_client));
        let auth = Arc::new(AuthManager::new(
            oauth,
            Arc::clone(&config.secure_store),
            event_bus.clone(),
        ));

        let token_provider: Arc<dyn TokenProvider> = auth.clone();
        let provider: Arc<dyn PlaylistProvider> = Arc::new(
            SpotifyConnector::new(http_client, token_provider).with_timeout(config.http_timeout),
        );

        let repository: Arc<dyn CacheConfigRepository> =
            Arc::new(JsonCacheConfigRepository::new(config.config_path.clone()));

        info!(config_path = %config.config_path.display(), "Core service initialized");
        Ok(Self::from_parts(event_bus, auth, provider, repository))
    }

    /// Assemble a service from already constructed components.
    pub fn from_parts(
        event_bus: EventBus,
        auth: Arc<AuthManager>,
        provider: Arc<dyn PlaylistProvider>,
        repository: Arc<dyn CacheConfigRepository>,
    ) -> Self {
        let coordinator = Arc::new(CacheCoordinator::new(
            Arc::clone(&provider),
            Arc::clone(&repository),
            event_bus.clone(),
        ));
        Self {
            event_bus,
            auth,
            provider,
            repository,
            coordinator,
        }
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn auth(&self) -> &Arc<AuthManager> {
        &self.auth
    }

    pub fn coordinator(&self) -> &Arc<CacheCoordinator> {
        &self.coordinator
    }

    // ========================================================================
    // Authentication
    // ========================================================================

    /// Start the login flow and return the URL the user must open.
    pub async fn begin_login(&self) -> Result<String> {
        Ok(self.auth.begin_authorization().await?)
    }

    /// Finish the login flow from the URL the browser was redirected to.
    ///
    /// Returns the signed-in user's id.
    #[instrument(skip(self, redirect_url))]
    pub async fn complete_login(&self, redirect_url: &str) -> Result<String> {
        self.auth.complete_authorization(redirect_url).await?;
        let user_id = self.provider.get_current_user_id().await?;
        self.auth.announce_signed_in(user_id.clone());
        info!(user_id = %user_id, "Signed in");
        Ok(user_id)
    }

    /// Confirm the stored credentials work, returning the user id.
    pub async fn verify_session(&self) -> Result<String> {
        if self.auth.auth_state().await? == AuthState::SignedOut {
            return Err(core_auth::AuthError::NotAuthenticated.into());
        }
        Ok(self.provider.get_current_user_id().await?)
    }

    pub async fn logout(&self) -> Result<()> {
        Ok(self.auth.sign_out().await?)
    }

    // ========================================================================
    // Playlists and cache records
    // ========================================================================

    /// Every playlist in the user's library.
    pub async fn list_playlists(&self) -> Result<Vec<PlaylistSummary>> {
        Ok(self.provider.get_user_playlists().await?)
    }

    /// Every cache record in the config store.
    pub async fn list_caches(&self) -> Result<Vec<CacheConfig>> {
        Ok(self.repository.list_configs().await?)
    }

    /// Create or update the cache record for `parent_id`.
    ///
    /// The parent playlist must exist; its current name is stored with the
    /// record. A new record starts active.
    #[instrument(skip(self, update))]
    pub async fn add_cache(&self, parent_id: &str, update: CacheUpdate) -> Result<CacheConfig> {
        let parent = self.provider.get_playlist(parent_id).await?;

        let mut config = self
            .repository
            .read(parent_id)
            .await?
            .unwrap_or_else(|| CacheConfig::new(parent_id));

        config.parent_name = parent.name;
        if let Some(cache_id) = update.cache_id {
            config.cache_id = Some(cache_id).filter(|id| !id.trim().is_empty());
        }
        if let Some(long_term) = update.use_long_term_window {
            config.use_long_term_window = long_term;
        }
        if let Some(floor) = update.minimum_retained_size {
            config.minimum_retained_size = floor;
        }
        if let Some(interval) = update.poll_interval_seconds {
            config.poll_interval_seconds = interval;
        }

        self.repository.write(&config).await?;
        info!(parent_id, parent_name = %config.parent_name, "Cache record saved");
        Ok(config)
    }

    /// Flip the `active` flag. A running task notices at its next cycle.
    pub async fn set_active(&self, parent_id: &str, active: bool) -> Result<CacheConfig> {
        let mut config = self
            .repository
            .read(parent_id)
            .await?
            .ok_or_else(|| SyncError::CacheNotFound {
                parent_id: parent_id.to_string(),
            })?;
        config.active = active;
        self.repository.write(&config).await?;
        Ok(config)
    }

    // ========================================================================
    // Cache tasks
    // ========================================================================

    pub async fn start_cache(&self, parent_id: &str) -> Result<JoinHandle<CacheState>> {
        Ok(self.coordinator.start(parent_id).await?)
    }

    pub async fn start_all(&self) -> Result<Vec<(String, JoinHandle<CacheState>)>> {
        Ok(self.coordinator.start_all().await?)
    }

    /// Cancel every running cache task.
    pub async fn shutdown(&self) {
        self.coordinator.stop_all().await;
    }
}
