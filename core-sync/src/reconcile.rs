//! # Reconciliation Engine
//!
//! Computes which tracks to add to and evict from a cache playlist.
//!
//! ## Rules
//!
//! 1. A track qualifies when it is in the parent set and in the commonly
//!    played set.
//! 2. Nothing qualifies: the plan is empty and the cache keeps its tracks.
//! 3. Qualifying tracks missing from the cache are added.
//! 4. Cache tracks that no longer qualify are evicted, oldest first, but only
//!    while the cache stays at or above the retention floor.

use crate::aggregator::TrackSet;
use bridge_traits::provider::TrackId;
use std::collections::HashSet;

/// Changes to apply to the cache playlist in one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    pub to_add: TrackSet,
    /// Evicted tracks in cache playlist order
    pub to_remove: Vec<TrackId>,
}

impl ReconciliationPlan {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    pub fn additions(&self) -> Vec<TrackId> {
        self.to_add.iter().cloned().collect()
    }
}

/// Compute the plan for one cycle.
///
/// `cache_tracks` is the cache playlist in playlist order (oldest added
/// first); duplicates count once. `minimum_retained_size` bounds eviction so
/// that the distinct cache size never drops below
/// `min(minimum_retained_size, current size)`.
pub fn plan(
    parent_tracks: &TrackSet,
    cache_tracks: &[TrackId],
    common_tracks: &TrackSet,
    minimum_retained_size: usize,
) -> ReconciliationPlan {
    let qualifying: TrackSet = parent_tracks
        .intersection(common_tracks)
        .cloned()
        .collect();

    if qualifying.is_empty() {
        return ReconciliationPlan::default();
    }

    let cache_set: HashSet<&TrackId> = cache_tracks.iter().collect();

    let to_add: TrackSet = qualifying
        .iter()
        .filter(|id| !cache_set.contains(id))
        .cloned()
        .collect();

    let max_removals = cache_set.len().saturating_sub(minimum_retained_size);

    let mut seen = HashSet::new();
    let to_remove: Vec<TrackId> = cache_tracks
        .iter()
        .filter(|id| !qualifying.contains(*id))
        .filter(|id| seen.insert(*id))
        .take(max_removals)
        .cloned()
        .collect();

    ReconciliationPlan { to_add, to_remove }
}
