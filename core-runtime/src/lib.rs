//! # Core Runtime Module
//!
//! Foundational runtime infrastructure shared by the playlist cache crates:
//! - Logging and tracing bootstrap
//! - Configuration management
//! - Event bus for cache and auth notifications

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
