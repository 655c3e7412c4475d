//! # Spotify Provider
//!
//! Implements the `PlaylistProvider` trait for the Spotify Web API.
//!
//! ## Overview
//!
//! This module provides:
//! - Playlist, top track and listening history reads with pagination
//! - Batched playlist writes
//! - Rate limiting and exponential backoff

pub mod connector;
pub mod error;
pub mod types;

pub use connector::SpotifyConnector;
pub use error::{Result, SpotifyError};
