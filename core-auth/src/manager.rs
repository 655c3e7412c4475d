//! Authentication manager
//!
//! Drives the interactive PKCE login, persists tokens, and hands out access
//! tokens that are refreshed shortly before they expire. Refreshes are
//! serialized so concurrent cache tasks never race on the refresh token.

use crate::error::{AuthError, Result};
use crate::oauth::{parse_redirect_url, OAuthFlowManager, PkceVerifier};
use crate::token_store::TokenStore;
use crate::types::AuthState;
use async_trait::async_trait;
use bridge_traits::storage::SecureStore;
use bridge_traits::time::{Clock, SystemClock};
use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info, instrument, warn};

/// Default timeout for token endpoint calls (2 minutes)
const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(120);

/// Refresh when the access token expires within this many seconds
const TOKEN_REFRESH_BUFFER_SECS: i64 = 300;

/// Source of bearer tokens for API connectors.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return an access token that is valid for at least a few minutes.
    async fn access_token(&self) -> Result<String>;
}

pub struct AuthManager {
    oauth: OAuthFlowManager,
    token_store: TokenStore,
    event_bus: EventBus,
    clock: Arc<dyn Clock>,
    /// Verifier of the authorization attempt awaiting its redirect
    pending: Mutex<Option<PkceVerifier>>,
    refresh_lock: Mutex<()>,
}

impl AuthManager {
    pub fn new(
        oauth: OAuthFlowManager,
        secure_store: Arc<dyn SecureStore>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            oauth,
            token_store: TokenStore::new(secure_store),
            event_bus,
            clock: Arc::new(SystemClock),
            pending: Mutex::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Use a different clock for expiry checks.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Start an authorization attempt and return the URL the user must open.
    ///
    /// A second call replaces the pending attempt.
    #[instrument(skip(self))]
    pub async fn begin_authorization(&self) -> Result<String> {
        let (auth_url, verifier) = self.oauth.build_auth_url()?;

        let mut pending = self.pending.lock().await;
        if pending.is_some() {
            debug!("Replacing pending authorization attempt");
        }
        *pending = Some(verifier);

        info!("Authorization flow initiated");
        Ok(auth_url)
    }

    /// Finish the pending attempt from the full redirect URL.
    pub async fn complete_authorization(&self, redirect_url: &str) -> Result<()> {
        let response = parse_redirect_url(redirect_url).inspect_err(|e| {
            self.emit(AuthEvent::AuthError {
                message: e.to_string(),
                recoverable: true,
            });
        })?;
        self.complete_with_code(&response.code, &response.state)
            .await
    }

    /// Finish the pending attempt from an authorization code and state.
    #[instrument(skip(self, code, state))]
    pub async fn complete_with_code(&self, code: &str, state: &str) -> Result<()> {
        let verifier = self
            .pending
            .lock()
            .await
            .take()
            .ok_or(AuthError::NoAuthorizationInProgress)?;

        let tokens = match timeout(
            DEFAULT_AUTH_TIMEOUT,
            self.oauth.exchange_code(code, state, &verifier),
        )
        .await
        {
            Ok(Ok(tokens)) => tokens,
            Ok(Err(e)) => {
                error!(error = %e, "Authorization code exchange failed");
                self.emit(AuthEvent::AuthError {
                    message: e.to_string(),
                    recoverable: !matches!(e, AuthError::StateMismatch { .. }),
                });
                return Err(e);
            }
            Err(_) => {
                error!("Token exchange timed out");
                self.emit(AuthEvent::AuthError {
                    message: "Token exchange timed out".to_string(),
                    recoverable: true,
                });
                return Err(AuthError::Network("token exchange timed out".to_string()));
            }
        };

        self.token_store.store_tokens(&tokens).await?;
        info!("Authorization completed");
        Ok(())
    }

    /// Return a valid access token, refreshing it when it is about to expire.
    ///
    /// # Errors
    ///
    /// [`AuthError::NotAuthenticated`] when no tokens are stored and
    /// [`AuthError::TokenRefreshFailed`] when the token endpoint rejects the
    /// refresh token. Both mean the user has to log in again.
    #[instrument(skip(self))]
    pub async fn get_valid_token(&self) -> Result<String> {
        let _guard = self.refresh_lock.lock().await;

        let tokens = self
            .token_store
            .retrieve_tokens()
            .await?
            .ok_or_else(|| {
                warn!("No stored tokens");
                AuthError::NotAuthenticated
            })?;

        if !tokens.is_expired_with_buffer(self.clock.now(), TOKEN_REFRESH_BUFFER_SECS) {
            debug!("Token is valid, no refresh needed");
            return Ok(tokens.access_token);
        }

        info!("Token expired or expiring soon, refreshing");
        self.emit(AuthEvent::TokenRefreshing);

        let refresh_token = tokens.refresh_token.ok_or_else(|| {
            error!("No refresh token available");
            AuthError::NoRefreshToken
        })?;

        let refreshed = match timeout(
            DEFAULT_AUTH_TIMEOUT,
            self.oauth.refresh_access_token(&refresh_token),
        )
        .await
        {
            Ok(result) => result.inspect_err(|e| {
                error!(error = %e, "Token refresh failed");
                self.emit(AuthEvent::AuthError {
                    message: format!("Token refresh failed: {}", e),
                    recoverable: !e.requires_login(),
                });
            })?,
            Err(_) => {
                error!("Token refresh timed out");
                self.emit(AuthEvent::AuthError {
                    message: "Token refresh timed out".to_string(),
                    recoverable: true,
                });
                return Err(AuthError::Network("token refresh timed out".to_string()));
            }
        };

        self.token_store.store_tokens(&refreshed).await?;
        self.emit(AuthEvent::TokenRefreshed {
            expires_at: refreshed.expires_at.timestamp(),
        });

        info!("Token refreshed successfully");
        Ok(refreshed.access_token)
    }

    /// Remove stored tokens.
    pub async fn sign_out(&self) -> Result<()> {
        self.pending.lock().await.take();
        self.token_store.delete_tokens().await?;
        self.emit(AuthEvent::SignedOut);
        Ok(())
    }

    pub async fn auth_state(&self) -> Result<AuthState> {
        if self.pending.lock().await.is_some() {
            return Ok(AuthState::SigningIn);
        }
        if self.token_store.has_tokens().await? {
            Ok(AuthState::SignedIn)
        } else {
            Ok(AuthState::SignedOut)
        }
    }

    /// Announce a completed sign-in once the caller knows the user id.
    pub fn announce_signed_in(&self, user_id: impl Into<String>) {
        self.emit(AuthEvent::SignedIn {
            user_id: user_id.into(),
        });
    }

    fn emit(&self, event: AuthEvent) {
        // No subscribers is fine
        let _ = self.event_bus.emit(CoreEvent::Auth(event));
    }
}

#[async_trait]
impl TokenProvider for AuthManager {
    async fn access_token(&self) -> Result<String> {
        self.get_valid_token().await
    }
}
