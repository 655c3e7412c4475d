//! # Playlist Cache Sync
//!
//! Keeps a cache playlist in step with what the user actually listens to.
//!
//! ## Overview
//!
//! For every configured parent playlist, a background task repeatedly:
//! - Re-reads the cache record from the JSON config store
//! - Checks that the cache playlist is still in the user's library, creating
//!   a new one when it is not
//! - Intersects the parent's tracks with the commonly played set
//! - Adds qualifying tracks and evicts stale ones without shrinking the cache
//!   below its configured floor
//!
//! ## Components
//!
//! - **Config** (`config`): serde model of the config file
//! - **Repository** (`repository`): JSON file persistence for cache records
//! - **Aggregator** (`aggregator`): union of listening history signals
//! - **Reconcile** (`reconcile`): pure add/evict planning
//! - **Lifecycle** (`lifecycle`): per-cache state machine
//! - **Controller** (`controller`): one cache's cycle loop
//! - **Coordinator** (`coordinator`): task registry and cancellation

pub mod aggregator;
pub mod config;
pub mod controller;
pub mod coordinator;
pub mod error;
pub mod lifecycle;
pub mod reconcile;
pub mod repository;

pub use aggregator::{aggregate_common_tracks, HistorySnapshot, Signal, SignalSource, TrackSet};
pub use config::{cache_description, CacheConfig, ConfigDocument, GlobalSettings};
pub use controller::{CacheController, ControllerOptions, CycleOutcome, CycleReport};
pub use coordinator::CacheCoordinator;
pub use error::{Result, SyncError};
pub use lifecycle::CacheState;
pub use reconcile::{plan, ReconciliationPlan};
pub use repository::{CacheConfigRepository, JsonCacheConfigRepository};
