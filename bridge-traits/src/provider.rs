//! Playlist Provider Abstraction
//!
//! The narrow capability surface the cache controller needs from a
//! streaming-music service: reading listening signals and playlist contents,
//! and mutating a playlist's membership.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{BridgeError, Result};

/// Opaque track identifier assigned by the provider.
pub type TrackId = String;

/// Listening-history window used by the provider's top-tracks ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    /// Roughly the last four weeks
    ShortTerm,
    /// Roughly the last six months
    MediumTerm,
    /// Several years of history
    LongTerm,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::ShortTerm => "short_term",
            TimeRange::MediumTerm => "medium_term",
            TimeRange::LongTerm => "long_term",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "short_term" | "short" => Ok(TimeRange::ShortTerm),
            "medium_term" | "medium" => Ok(TimeRange::MediumTerm),
            "long_term" | "long" => Ok(TimeRange::LongTerm),
            other => Err(BridgeError::OperationFailed(format!(
                "Unknown time range: {}",
                other
            ))),
        }
    }
}

/// Playlist metadata as seen by the current user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
    /// Provider user id of the playlist owner
    pub owner_id: String,
}

/// Track identity plus a display name for logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSummary {
    pub id: TrackId,
    pub name: String,
}

/// Streaming-service capabilities consumed by the playlist cache.
///
/// Every read that the service paginates must be followed until the cursor is
/// exhausted. Errors carry the retryable/fatal distinction of
/// [`BridgeError::is_retryable`].
#[async_trait]
pub trait PlaylistProvider: Send + Sync {
    /// Id of the authenticated user.
    async fn get_current_user_id(&self) -> Result<String>;

    /// All playlists the user owns or follows.
    async fn get_user_playlists(&self) -> Result<Vec<PlaylistSummary>>;

    /// Metadata of a single playlist.
    ///
    /// Returns [`BridgeError::NotFound`] when the playlist no longer exists.
    async fn get_playlist(&self, playlist_id: &str) -> Result<PlaylistSummary>;

    /// Track ids of a playlist in playlist order (oldest addition first).
    async fn get_playlist_track_ids(&self, playlist_id: &str) -> Result<Vec<TrackId>>;

    /// The user's top tracks for the given window.
    async fn get_top_tracks(&self, range: TimeRange) -> Result<Vec<TrackSummary>>;

    /// The user's recently played tracks, most recent first.
    async fn get_recently_played(&self) -> Result<Vec<TrackSummary>>;

    /// Create a playlist owned by `owner_id`, returning its id.
    async fn create_playlist(&self, owner_id: &str, name: &str, description: &str)
        -> Result<String>;

    /// Append tracks to a playlist.
    async fn add_tracks(&self, playlist_id: &str, track_ids: &[TrackId]) -> Result<()>;

    /// Remove every occurrence of the given tracks from a playlist.
    async fn remove_all_occurrences(&self, playlist_id: &str, track_ids: &[TrackId])
        -> Result<()>;
}
