//! # Cache Lifecycle State Machine
//!
//! ```text
//! LOADING → HEALTH_CHECK → ENSURING_CACHE_PLAYLIST → RECONCILING → SLEEPING
//!    ↑           │                                       ↑            │
//!    │           └───────────────────────────────────────┘            │
//!    └────────────────────────────────────────────────────────────────┘
//!
//! any state → FATAL    (authentication failure)
//! any state → STOPPED  (inactive config or cancellation)
//! ```

use crate::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CacheState {
    /// Re-reading the cache record
    Loading,
    /// Verifying the cache playlist exists in the user's library
    HealthCheck,
    /// Creating a replacement cache playlist
    EnsuringCachePlaylist,
    /// Fetching track sets and applying the plan
    Reconciling,
    /// Waiting for the next cycle
    Sleeping,
    /// Authentication failed; the task has ended
    Fatal,
    /// Stopped cooperatively
    Stopped,
}

impl CacheState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CacheState::Fatal | CacheState::Stopped)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheState::Loading => "LOADING",
            CacheState::HealthCheck => "HEALTH_CHECK",
            CacheState::EnsuringCachePlaylist => "ENSURING_CACHE_PLAYLIST",
            CacheState::Reconciling => "RECONCILING",
            CacheState::Sleeping => "SLEEPING",
            CacheState::Fatal => "FATAL",
            CacheState::Stopped => "STOPPED",
        }
    }

    /// Whether the machine may move from `self` to `next`.
    ///
    /// A failed cycle may go straight to `SLEEPING` from any active state.
    pub fn can_transition_to(&self, next: CacheState) -> bool {
        use CacheState::*;

        if self.is_terminal() {
            return false;
        }
        if matches!(next, Fatal | Stopped | Sleeping) {
            return true;
        }

        matches!(
            (self, next),
            (Sleeping, Loading)
                | (Loading, HealthCheck)
                | (HealthCheck, EnsuringCachePlaylist)
                | (HealthCheck, Reconciling)
                | (EnsuringCachePlaylist, Reconciling)
        )
    }
}

impl FromStr for CacheState {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "LOADING" => Ok(CacheState::Loading),
            "HEALTH_CHECK" => Ok(CacheState::HealthCheck),
            "ENSURING_CACHE_PLAYLIST" => Ok(CacheState::EnsuringCachePlaylist),
            "RECONCILING" => Ok(CacheState::Reconciling),
            "SLEEPING" => Ok(CacheState::Sleeping),
            "FATAL" => Ok(CacheState::Fatal),
            "STOPPED" => Ok(CacheState::Stopped),
            _ => Err(SyncError::Config(format!("unknown cache state: {}", s))),
        }
    }
}

impl std::fmt::Display for CacheState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let path = [
            CacheState::Loading,
            CacheState::HealthCheck,
            CacheState::EnsuringCachePlaylist,
            CacheState::Reconciling,
            CacheState::Sleeping,
            CacheState::Loading,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
        assert!(CacheState::HealthCheck.can_transition_to(CacheState::Reconciling));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!CacheState::Loading.can_transition_to(CacheState::Reconciling));
        assert!(!CacheState::Sleeping.can_transition_to(CacheState::HealthCheck));
        assert!(!CacheState::Fatal.can_transition_to(CacheState::Loading));
        assert!(!CacheState::Stopped.can_transition_to(CacheState::Stopped));
    }

    #[test]
    fn test_terminal_states() {
        assert!(CacheState::Fatal.is_terminal());
        assert!(CacheState::Stopped.is_terminal());
        assert!(!CacheState::Sleeping.is_terminal());
    }

    #[test]
    fn test_string_roundtrip() {
        for state in [
            CacheState::Loading,
            CacheState::HealthCheck,
            CacheState::EnsuringCachePlaylist,
            CacheState::Reconciling,
            CacheState::Sleeping,
            CacheState::Fatal,
            CacheState::Stopped,
        ] {
            assert_eq!(state.as_str().parse::<CacheState>().unwrap(), state);
        }
        assert_eq!(
            serde_json::to_string(&CacheState::HealthCheck).unwrap(),
            "\"HEALTH_CHECK\""
        );
        assert!("napping".parse::<CacheState>().is_err());
    }
}
