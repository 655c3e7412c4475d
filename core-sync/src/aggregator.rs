//! # Track-Set Aggregator
//!
//! Combines the listening signals the provider already computes into one
//! "commonly played" set. Any track present in any signal counts.
//!
//! Fetching and combining are separate: [`HistorySnapshot::fetch`] performs
//! the provider calls and records each signal's outcome independently, and
//! [`aggregate_common_tracks`] is a pure union over that snapshot. A signal
//! that failed contributes nothing.

use crate::config::CacheConfig;
use crate::SyncError;
use bridge_traits::provider::{PlaylistProvider, TimeRange, TrackId, TrackSummary};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, error};

/// Unordered, deduplicated track ids.
pub type TrackSet = BTreeSet<TrackId>;

/// Where a history signal came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalSource {
    TopTracks(TimeRange),
    RecentlyPlayed,
    RepeatPlaylist(String),
}

impl fmt::Display for SignalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalSource::TopTracks(range) => write!(f, "top tracks ({})", range),
            SignalSource::RecentlyPlayed => f.write_str("recently played"),
            SignalSource::RepeatPlaylist(id) => write!(f, "repeat playlist {}", id),
        }
    }
}

/// Outcome of fetching one signal.
#[derive(Debug)]
pub struct Signal {
    pub source: SignalSource,
    pub tracks: Result<TrackSet, SyncError>,
}

/// All listening signals gathered for one reconciliation cycle.
#[derive(Debug, Default)]
pub struct HistorySnapshot {
    pub signals: Vec<Signal>,
}

impl HistorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a signal.
    pub fn with_signal(mut self, source: SignalSource, tracks: Result<TrackSet, SyncError>) -> Self {
        self.signals.push(Signal { source, tracks });
        self
    }

    /// Fetch every signal `config` asks for.
    ///
    /// Short and medium term top tracks and recently played are always
    /// requested, long term only when enabled, and the repeat playlist only
    /// when one is configured.
    pub async fn fetch(
        provider: &dyn PlaylistProvider,
        config: &CacheConfig,
        repeat_source: Option<&str>,
    ) -> Self {
        let mut ranges = vec![TimeRange::ShortTerm, TimeRange::MediumTerm];
        if config.use_long_term_window {
            ranges.push(TimeRange::LongTerm);
        }

        let mut snapshot = Self::new();
        for range in ranges {
            let tracks = provider.get_top_tracks(range).await;
            snapshot = snapshot.with_signal(SignalSource::TopTracks(range), summaries_to_set(tracks));
        }

        let recent = provider.get_recently_played().await;
        snapshot = snapshot.with_signal(SignalSource::RecentlyPlayed, summaries_to_set(recent));

        if let Some(repeat_id) = repeat_source {
            let tracks = provider
                .get_playlist_track_ids(repeat_id)
                .await
                .map(|ids| ids.into_iter().collect())
                .map_err(SyncError::from);
            snapshot = snapshot.with_signal(SignalSource::RepeatPlaylist(repeat_id.to_string()), tracks);
        }

        snapshot
    }

    /// Number of signals that failed to fetch.
    pub fn failures(&self) -> usize {
        self.signals.iter().filter(|s| s.tracks.is_err()).count()
    }

    /// First fatal failure, if any signal hit one.
    pub fn fatal_error(&self) -> Option<&SyncError> {
        self.signals
            .iter()
            .filter_map(|s| s.tracks.as_ref().err())
            .find(|e| e.is_fatal())
    }
}

fn summaries_to_set(
    result: bridge_traits::error::Result<Vec<TrackSummary>>,
) -> Result<TrackSet, SyncError> {
    result
        .map(|tracks| tracks.into_iter().map(|t| t.id).collect())
        .map_err(SyncError::from)
}

/// Union of every successfully fetched signal.
///
/// Long-term top tracks are ignored unless `config` enables them. Failed
/// signals are logged and contribute the empty set.
pub fn aggregate_common_tracks(history: &HistorySnapshot, config: &CacheConfig) -> TrackSet {
    let mut common = TrackSet::new();

    for signal in &history.signals {
        if signal.source == SignalSource::TopTracks(TimeRange::LongTerm) && !config.use_long_term_window
        {
            continue;
        }

        match &signal.tracks {
            Ok(tracks) => {
                debug!(source = %signal.source, count = tracks.len(), "History signal");
                common.extend(tracks.iter().cloned());
            }
            Err(e) => {
                error!(
                    parent_id = %config.parent_id,
                    source = %signal.source,
                    error = %e,
                    "History signal unavailable, contributing no tracks"
                );
            }
        }
    }

    common
}
