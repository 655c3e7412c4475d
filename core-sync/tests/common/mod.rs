//! Shared fakes for the core-sync integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::provider::{PlaylistProvider, PlaylistSummary, TimeRange, TrackId, TrackSummary};
use core_sync::{CacheConfig, CacheConfigRepository, GlobalSettings, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};
use tokio::sync::Mutex as AsyncMutex;

pub const USER_ID: &str = "listener";

pub fn ids(list: &[&str]) -> Vec<TrackId> {
    list.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// In-memory provider
// ============================================================================

/// Playlist service held entirely in memory.
///
/// Playlists keep their track order, so eviction order can be asserted.
#[derive(Default)]
pub struct FakeProvider {
    playlists: AsyncMutex<HashMap<String, (String, Vec<TrackId>)>>,
    /// Playlist ids in the user's library
    library: AsyncMutex<Vec<String>>,
    top_tracks: AsyncMutex<HashMap<TimeRange, Vec<TrackId>>>,
    recently_played: AsyncMutex<Vec<TrackId>>,
    unauthorized: AtomicBool,
    /// HTTP status returned by add/remove calls; 0 lets them through
    write_failure: AtomicU16,
    created: AtomicUsize,
    writes: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a playlist the user owns.
    pub async fn add_playlist(&self, id: &str, name: &str, tracks: &[&str]) {
        self.playlists
            .lock()
            .await
            .insert(id.to_string(), (name.to_string(), ids(tracks)));
        self.library.lock().await.push(id.to_string());
    }

    /// Remove a playlist from the user's library while keeping it readable.
    pub async fn unfollow(&self, id: &str) {
        self.library.lock().await.retain(|p| p != id);
    }

    pub async fn set_top_tracks(&self, range: TimeRange, tracks: &[&str]) {
        self.top_tracks.lock().await.insert(range, ids(tracks));
    }

    pub async fn set_recently_played(&self, tracks: &[&str]) {
        *self.recently_played.lock().await = ids(tracks);
    }

    pub fn revoke_access(&self) {
        self.unauthorized.store(true, Ordering::SeqCst);
    }

    /// Make every add/remove call fail with `status` until [`Self::allow_writes`].
    pub fn fail_writes(&self, status: u16) {
        self.write_failure.store(status, Ordering::SeqCst);
    }

    pub fn allow_writes(&self) {
        self.write_failure.store(0, Ordering::SeqCst);
    }

    pub async fn tracks(&self, id: &str) -> Option<Vec<TrackId>> {
        self.playlists.lock().await.get(id).map(|(_, t)| t.clone())
    }

    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Number of add/remove calls applied.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_auth(&self) -> BridgeResult<()> {
        if self.unauthorized.load(Ordering::SeqCst) {
            Err(BridgeError::Unauthorized("access token revoked".to_string()))
        } else {
            Ok(())
        }
    }

    fn check_write(&self) -> BridgeResult<()> {
        match self.write_failure.load(Ordering::SeqCst) {
            0 => Ok(()),
            status => Err(BridgeError::Http {
                status,
                message: "playlist write rejected".to_string(),
            }),
        }
    }

    fn summaries(tracks: &[TrackId]) -> Vec<TrackSummary> {
        tracks
            .iter()
            .map(|id| TrackSummary {
                id: id.clone(),
                name: format!("Track {}", id),
            })
            .collect()
    }
}

#[async_trait]
impl PlaylistProvider for FakeProvider {
    async fn get_current_user_id(&self) -> BridgeResult<String> {
        self.check_auth()?;
        Ok(USER_ID.to_string())
    }

    async fn get_user_playlists(&self) -> BridgeResult<Vec<PlaylistSummary>> {
        self.check_auth()?;
        let playlists = self.playlists.lock().await;
        let library = self.library.lock().await;
        Ok(library
            .iter()
            .filter_map(|id| {
                playlists.get(id).map(|(name, _)| PlaylistSummary {
                    id: id.clone(),
                    name: name.clone(),
                    owner_id: USER_ID.to_string(),
                })
            })
            .collect())
    }

    async fn get_playlist(&self, playlist_id: &str) -> BridgeResult<PlaylistSummary> {
        self.check_auth()?;
        let playlists = self.playlists.lock().await;
        let (name, _) = playlists
            .get(playlist_id)
            .ok_or_else(|| BridgeError::NotFound(playlist_id.to_string()))?;
        Ok(PlaylistSummary {
            id: playlist_id.to_string(),
            name: name.clone(),
            owner_id: USER_ID.to_string(),
        })
    }

    async fn get_playlist_track_ids(&self, playlist_id: &str) -> BridgeResult<Vec<TrackId>> {
        self.check_auth()?;
        self.tracks(playlist_id)
            .await
            .ok_or_else(|| BridgeError::NotFound(playlist_id.to_string()))
    }

    async fn get_top_tracks(&self, range: TimeRange) -> BridgeResult<Vec<TrackSummary>> {
        self.check_auth()?;
        let top = self.top_tracks.lock().await;
        Ok(Self::summaries(top.get(&range).map(Vec::as_slice).unwrap_or(&[])))
    }

    async fn get_recently_played(&self) -> BridgeResult<Vec<TrackSummary>> {
        self.check_auth()?;
        Ok(Self::summaries(&self.recently_played.lock().await))
    }

    async fn create_playlist(
        &self,
        owner_id: &str,
        name: &str,
        _description: &str,
    ) -> BridgeResult<String> {
        self.check_auth()?;
        assert_eq!(owner_id, USER_ID);
        let n = self.created.fetch_add(1, Ordering::SeqCst);
        let id = format!("created-{}", n);
        self.add_playlist(&id, name, &[]).await;
        Ok(id)
    }

    async fn add_tracks(&self, playlist_id: &str, track_ids: &[TrackId]) -> BridgeResult<()> {
        self.check_auth()?;
        self.check_write()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut playlists = self.playlists.lock().await;
        let (_, tracks) = playlists
            .get_mut(playlist_id)
            .ok_or_else(|| BridgeError::NotFound(playlist_id.to_string()))?;
        tracks.extend(track_ids.iter().cloned());
        Ok(())
    }

    async fn remove_all_occurrences(
        &self,
        playlist_id: &str,
        track_ids: &[TrackId],
    ) -> BridgeResult<()> {
        self.check_auth()?;
        self.check_write()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut playlists = self.playlists.lock().await;
        let (_, tracks) = playlists
            .get_mut(playlist_id)
            .ok_or_else(|| BridgeError::NotFound(playlist_id.to_string()))?;
        tracks.retain(|t| !track_ids.contains(t));
        Ok(())
    }
}

// ============================================================================
// In-memory config store
// ============================================================================

#[derive(Default)]
pub struct MemoryRepository {
    records: AsyncMutex<HashMap<String, CacheConfig>>,
    global: AsyncMutex<GlobalSettings>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, config: CacheConfig) {
        self.records
            .lock()
            .await
            .insert(config.parent_id.clone(), config);
    }

    pub async fn set_active(&self, parent_id: &str, active: bool) {
        if let Some(config) = self.records.lock().await.get_mut(parent_id) {
            config.active = active;
        }
    }
}

#[async_trait]
impl CacheConfigRepository for MemoryRepository {
    async fn read(&self, parent_id: &str) -> Result<Option<CacheConfig>> {
        Ok(self.records.lock().await.get(parent_id).cloned())
    }

    async fn write(&self, config: &CacheConfig) -> Result<()> {
        config.validate()?;
        self.insert(config.clone()).await;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.records.lock().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn global_settings(&self) -> Result<GlobalSettings> {
        Ok(self.global.lock().await.clone())
    }
}

/// A record for `parent_id` pointing at `cache_id`.
pub fn cache_record(parent_id: &str, cache_id: Option<&str>, floor: usize) -> CacheConfig {
    let mut config = CacheConfig::new(parent_id);
    config.parent_name = "Road Trip".to_string();
    config.cache_id = cache_id.map(str::to_string);
    config.minimum_retained_size = floor;
    config
}
