//! # Host Bridge Traits
//!
//! Abstractions the playlist cache core depends on, implemented per host.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP execution
//! - [`SecureStore`](storage::SecureStore) - Credential persistence
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`PlaylistProvider`](provider::PlaylistProvider) - Streaming-service capabilities
//!
//! | Host     | Implementation Crate |
//! |----------|---------------------|
//! | Desktop  | `bridge-desktop`    |
//! | Spotify  | `provider-spotify`  |
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! convert transport and status failures into it and keep the retryable
//! distinction intact so callers can decide whether to try again.
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync` so implementations can be shared across
//! the per-cache tokio tasks.

pub mod error;
pub mod http;
pub mod provider;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use provider::{PlaylistProvider, PlaylistSummary, TimeRange, TrackId, TrackSummary};
pub use storage::SecureStore;
pub use time::{Clock, FixedClock, SystemClock};
