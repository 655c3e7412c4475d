//! # Core Configuration Module
//!
//! Runtime configuration for the playlist cache service.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! holding every dependency and setting the service needs. It fails fast with
//! actionable messages when something required is missing, before any cache
//! task is started.
//!
//! ## Required Settings
//!
//! - OAuth client id registered with the streaming service
//! - `SecureStore` for token persistence (desktop default: JSON token file)
//!
//! ## Optional Settings (with defaults)
//!
//! - `HttpClient` (desktop default: reqwest)
//! - cache config path (`config.json`)
//! - redirect URI (`http://localhost:8080/`)
//! - HTTP timeout (30 s), event buffer size (100)
//!
//! When the `desktop-shims` feature is enabled, desktop-ready defaults for
//! `HttpClient` and `SecureStore` are injected automatically if not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .client_id("my-client-id")
//!     .config_path("/etc/playlist-cache/config.json")
//!     .build()?;
//! ```
//!
//! Settings can also be read from the environment:
//!
//! ```ignore
//! let config = CoreConfig::builder_from_env().build()?;
//! ```

use crate::error::{Error, Result};
use crate::logging::LoggingConfig;
use bridge_traits::{HttpClient, SecureStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default location of the cache config document.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Default OAuth redirect URI registered with the streaming service.
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8080/";

pub const ENV_CLIENT_ID: &str = "PLAYLIST_CACHE_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "PLAYLIST_CACHE_CLIENT_SECRET";
pub const ENV_REDIRECT_URI: &str = "PLAYLIST_CACHE_REDIRECT_URI";
pub const ENV_CONFIG_PATH: &str = "PLAYLIST_CACHE_CONFIG";
pub const ENV_TOKEN_PATH: &str = "PLAYLIST_CACHE_TOKENS";

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_HTTP_TIMEOUT: Duration = Duration::from_secs(300);
const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// OAuth client registration.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthClientConfig {
    pub client_id: String,
    /// Confidential clients send the secret on token requests; PKCE-only clients leave it unset.
    pub client_secret: Option<String>,
    pub redirect_uri: String,
}

impl std::fmt::Debug for OAuthClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClientConfig")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// Core configuration for the playlist cache service.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// JSON document holding `caches` and `global_settings`
    pub config_path: PathBuf,

    /// OAuth client registration
    pub oauth: OAuthClientConfig,

    /// HTTP client for API requests (optional with desktop default)
    pub http_client: Option<Arc<dyn HttpClient>>,

    /// Token persistence (required)
    pub secure_store: Arc<dyn SecureStore>,

    /// Per-request timeout applied by the provider connector
    pub http_timeout: Duration,

    /// Capacity of the runtime event bus
    pub event_buffer_size: usize,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("config_path", &self.config_path)
            .field("oauth", &self.oauth)
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "HttpClient { ... }"),
            )
            .field("secure_store", &"SecureStore { ... }")
            .field("http_timeout", &self.http_timeout)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("logging", &self.logging)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Creates a builder pre-populated from `PLAYLIST_CACHE_*` environment variables.
    pub fn builder_from_env() -> CoreConfigBuilder {
        CoreConfigBuilder::from_lookup(|key| std::env::var(key).ok())
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.config_path.as_os_str().is_empty() {
            return Err(Error::Config("Config path cannot be empty".to_string()));
        }

        if self.oauth.client_id.trim().is_empty() {
            return Err(Error::Config(format!(
                "OAuth client id cannot be empty. Set {} or use .client_id().",
                ENV_CLIENT_ID
            )));
        }

        let uri = &self.oauth.redirect_uri;
        if !(uri.starts_with("http://") || uri.starts_with("https://")) {
            return Err(Error::Config(format!(
                "Redirect URI must be an http(s) URL, got '{}'",
                uri
            )));
        }

        if self.http_timeout.is_zero() {
            return Err(Error::Config(
                "HTTP timeout must be greater than 0".to_string(),
            ));
        }

        if self.http_timeout > MAX_HTTP_TIMEOUT {
            return Err(Error::Config(
                "HTTP timeout exceeds maximum of 300 seconds".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn secure_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "SecureStore".to_string(),
        message: "SecureStore implementation is required for token persistence. \
                 Desktop: enable the 'desktop-shims' feature to use the default FileSecureStore, \
                 or inject an implementation with .secure_store()."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_secure_store(token_path: Option<PathBuf>) -> Result<Arc<dyn SecureStore>> {
    use bridge_desktop::FileSecureStore;

    let store = match token_path {
        Some(path) => FileSecureStore::new(path),
        None => FileSecureStore::in_data_dir().map_err(|e| Error::CapabilityMissing {
            capability: "SecureStore".to_string(),
            message: format!(
                "Cannot locate a data directory for tokens ({}). Set {}.",
                e, ENV_TOKEN_PATH
            ),
        })?,
    };

    let store: Arc<dyn SecureStore> = Arc::new(store);
    Ok(store)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_secure_store(_token_path: Option<PathBuf>) -> Result<Arc<dyn SecureStore>> {
    Err(secure_store_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(timeout: Duration) -> Result<Option<Arc<dyn HttpClient>>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::with_timeout(timeout).map_err(|e| Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: e.to_string(),
    })?;
    let client: Arc<dyn HttpClient> = Arc::new(client);
    Ok(Some(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_timeout: Duration) -> Result<Option<Arc<dyn HttpClient>>> {
    Ok(None)
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Call [`build()`](CoreConfigBuilder::build) to validate and create the final
/// config.
#[derive(Default)]
pub struct CoreConfigBuilder {
    config_path: Option<PathBuf>,
    token_path: Option<PathBuf>,
    client_id: Option<String>,
    client_secret: Option<String>,
    redirect_uri: Option<String>,
    http_client: Option<Arc<dyn HttpClient>>,
    secure_store: Option<Arc<dyn SecureStore>>,
    http_timeout: Option<Duration>,
    event_buffer_size: Option<usize>,
    logging: Option<LoggingConfig>,
}

impl CoreConfigBuilder {
    /// Populates the builder through a variable lookup function.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            config_path: get(ENV_CONFIG_PATH).map(PathBuf::from),
            token_path: get(ENV_TOKEN_PATH).map(PathBuf::from),
            client_id: get(ENV_CLIENT_ID),
            client_secret: get(ENV_CLIENT_SECRET),
            redirect_uri: get(ENV_REDIRECT_URI),
            ..Self::default()
        }
    }

    /// Sets the path of the cache config document.
    pub fn config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Sets the token file used by the default desktop `SecureStore`.
    ///
    /// Ignored when a store is injected with [`secure_store`](Self::secure_store).
    pub fn token_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.token_path = Some(path.into());
        self
    }

    /// Sets the OAuth client id (required).
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Sets the OAuth client secret.
    pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Sets the OAuth redirect URI.
    ///
    /// Default: `http://localhost:8080/`
    pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the reqwest-based client is used when the
    /// `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the secure store implementation.
    pub fn secure_store(mut self, store: Arc<dyn SecureStore>) -> Self {
        self.secure_store = Some(store);
        self
    }

    /// Sets the per-request HTTP timeout.
    ///
    /// Default: 30 seconds
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = Some(timeout);
        self
    }

    /// Sets the event bus capacity.
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Sets the logging configuration.
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// Returns an error if:
    /// - the OAuth client id is missing
    /// - no `SecureStore` is available
    /// - configuration values are invalid
    pub fn build(self) -> Result<CoreConfig> {
        let client_id = self.client_id.ok_or_else(|| {
            Error::Config(format!(
                "OAuth client id is required. Set {} or use .client_id().",
                ENV_CLIENT_ID
            ))
        })?;

        let http_timeout = self.http_timeout.unwrap_or(DEFAULT_HTTP_TIMEOUT);

        let secure_store = match self.secure_store {
            Some(store) => store,
            None => provide_default_secure_store(self.token_path)?,
        };

        let http_client = match self.http_client {
            Some(client) => Some(client),
            None => provide_default_http_client(http_timeout)?,
        };

        let config = CoreConfig {
            config_path: self
                .config_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH)),
            oauth: OAuthClientConfig {
                client_id,
                client_secret: self.client_secret,
                redirect_uri: self
                    .redirect_uri
                    .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
            },
            http_client,
            secure_store,
            http_timeout,
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            logging: self.logging.unwrap_or_default(),
        };

        config.validate()?;

        Ok(config)
    }
}
