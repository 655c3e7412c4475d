//! # Core Authentication Module
//!
//! Spotify OAuth 2.0 with PKCE for the playlist cache daemon.
//!
//! - [`oauth`] builds authorization URLs, exchanges codes and refreshes tokens
//! - [`token_store`] persists the token set through a [`bridge_traits::storage::SecureStore`]
//! - [`manager`] ties both together and implements [`TokenProvider`] for API connectors

pub mod error;
pub mod manager;
pub mod oauth;
pub mod token_store;
pub mod types;

pub use error::{AuthError, Result};
pub use manager::{AuthManager, TokenProvider};
pub use oauth::{parse_redirect_url, AuthorizationResponse, OAuthConfig, OAuthFlowManager, PkceVerifier};
pub use token_store::TokenStore;
pub use types::{AuthState, OAuthTokens};
