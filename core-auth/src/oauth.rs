//! OAuth 2.0 Authorization Flow Manager with PKCE Support
//!
//! This module implements RFC 6749 (OAuth 2.0) and RFC 7636 (PKCE) for the
//! Spotify accounts service.
//!
//! # Overview
//!
//! The OAuth flow manager handles:
//! - Building authorization URLs with PKCE challenge
//! - Parsing the redirect URL pasted back by the user
//! - Exchanging authorization codes for tokens
//! - Refreshing access tokens
//!
//! Sensitive values (tokens, codes, verifiers) are never logged.
//!
//! # Example
//!
//! ```no_run
//! use core_auth::oauth::{OAuthFlowManager, OAuthConfig};
//! use core_runtime::config::OAuthClientConfig;
//! use std::sync::Arc;
//!
//! # async fn example() -> core_auth::Result<()> {
//! # use bridge_traits::http::HttpClient;
//! # let http_client: Arc<dyn HttpClient> = todo!();
//! let client = OAuthClientConfig {
//!     client_id: "your-client-id".to_string(),
//!     client_secret: None,
//!     redirect_uri: "http://localhost:8080/".to_string(),
//! };
//!
//! let flow_manager = OAuthFlowManager::new(OAuthConfig::spotify(&client), http_client);
//! let (auth_url, pkce_verifier) = flow_manager.build_auth_url()?;
//! // Send the user to auth_url...
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::types::OAuthTokens;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, RetryPolicy};
use bridge_traits::time::{Clock, SystemClock};
use core_runtime::config::OAuthClientConfig;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};
use url::Url;

pub const SPOTIFY_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Scopes needed to read listening history and maintain playlists.
pub const SPOTIFY_SCOPES: &[&str] = &[
    "playlist-modify-public",
    "playlist-modify-private",
    "playlist-read-private",
    "playlist-read-collaborative",
    "user-read-recently-played",
    "user-top-read",
];

/// OAuth 2.0 provider configuration.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret (optional for public PKCE clients)
    pub client_secret: Option<String>,
    /// Redirect URI registered with the application
    pub redirect_uri: String,
    /// List of OAuth scopes to request
    pub scopes: Vec<String>,
    /// Authorization endpoint URL
    pub auth_url: String,
    /// Token endpoint URL
    pub token_url: String,
}

impl OAuthConfig {
    /// Spotify accounts endpoints with the scopes the cache reconciler needs.
    pub fn spotify(client: &OAuthClientConfig) -> Self {
        Self {
            client_id: client.client_id.clone(),
            client_secret: client.client_secret.clone(),
            redirect_uri: client.redirect_uri.clone(),
            scopes: SPOTIFY_SCOPES.iter().map(|s| s.to_string()).collect(),
            auth_url: SPOTIFY_AUTH_URL.to_string(),
            token_url: SPOTIFY_TOKEN_URL.to_string(),
        }
    }
}

/// PKCE (Proof Key for Code Exchange) verifier.
///
/// Holds the code verifier and the CSRF state for one authorization attempt.
/// Only the challenge derived from the verifier is sent to the authorization server.
#[derive(Debug, Clone)]
pub struct PkceVerifier {
    verifier: String,
    state: String,
}

impl PkceVerifier {
    /// Create a verifier from 32 random bytes and a state from 16 random bytes,
    /// both URL-safe base64 without padding.
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();

        let mut verifier_bytes = [0u8; 32];
        rng.fill(&mut verifier_bytes);
        let verifier = URL_SAFE_NO_PAD.encode(verifier_bytes);

        let mut state_bytes = [0u8; 16];
        rng.fill(&mut state_bytes);
        let state = URL_SAFE_NO_PAD.encode(state_bytes);

        Self { verifier, state }
    }

    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    /// S256 challenge: BASE64URL(SHA256(code_verifier))
    pub fn challenge(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }
}

impl Default for PkceVerifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Code and state extracted from an OAuth redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationResponse {
    pub code: String,
    pub state: String,
}

/// Parse the URL the browser was redirected to after authorization.
///
/// An `error` query parameter (for example `access_denied`) becomes
/// [`AuthError::AuthenticationFailed`].
pub fn parse_redirect_url(redirect: &str) -> Result<AuthorizationResponse> {
    let url = Url::parse(redirect.trim()).map_err(|e| AuthError::InvalidRedirect(e.to_string()))?;

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => return Err(AuthError::AuthenticationFailed(value.into_owned())),
            _ => {}
        }
    }

    match (code, state) {
        (Some(code), Some(state)) => Ok(AuthorizationResponse { code, state }),
        (None, _) => Err(AuthError::InvalidRedirect(
            "missing `code` parameter".to_string(),
        )),
        (_, None) => Err(AuthError::InvalidRedirect(
            "missing `state` parameter".to_string(),
        )),
    }
}

/// OAuth 2.0 flow manager.
///
/// Handles the authorization code flow with PKCE and token refresh.
pub struct OAuthFlowManager {
    config: OAuthConfig,
    http_client: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
}

impl OAuthFlowManager {
    pub fn new(config: OAuthConfig, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            config,
            http_client,
            clock: Arc::new(SystemClock),
            retry: RetryPolicy::default(),
        }
    }

    /// Use a different clock for computing token expiry.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Build the authorization URL with PKCE challenge.
    ///
    /// Returns the URL together with the verifier, which must be kept until
    /// the redirect comes back.
    #[instrument(skip(self))]
    pub fn build_auth_url(&self) -> Result<(String, PkceVerifier)> {
        let verifier = PkceVerifier::new();
        let challenge = verifier.challenge();

        let mut url = Url::parse(&self.config.auth_url)
            .map_err(|e| AuthError::InvalidConfig(format!("Invalid auth URL: {}", e)))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("client_id", &self.config.client_id);
            query.append_pair("redirect_uri", &self.config.redirect_uri);
            query.append_pair("response_type", "code");
            query.append_pair("scope", &self.config.scopes.join(" "));
            query.append_pair("state", verifier.state());
            query.append_pair("code_challenge", &challenge);
            query.append_pair("code_challenge_method", "S256");
        }

        debug!("Built authorization URL");

        Ok((url.to_string(), verifier))
    }

    /// Exchange an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The state doesn't match (CSRF protection)
    /// - The token endpoint rejects the code
    /// - Network errors occur
    #[instrument(skip(self, code, verifier))]
    pub async fn exchange_code(
        &self,
        code: &str,
        state: &str,
        verifier: &PkceVerifier,
    ) -> Result<OAuthTokens> {
        if state != verifier.state() {
            warn!("OAuth state mismatch");
            return Err(AuthError::StateMismatch {
                expected: verifier.state().to_string(),
                actual: state.to_string(),
            });
        }

        let mut params = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("code_verifier", verifier.verifier()),
        ];
        if let Some(ref client_secret) = self.config.client_secret {
            params.push(("client_secret", client_secret.as_str()));
        }

        let encoded_body = serde_urlencoded::to_string(&params)
            .map_err(|e| AuthError::Serialization(format!("Failed to encode token request: {}", e)))?;

        let request =
            HttpRequest::new(HttpMethod::Post, self.config.token_url.clone()).form(encoded_body);

        debug!("Exchanging authorization code for tokens");
        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if !response.is_success() {
            let status = response.status;
            let error_body = response
                .text()
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            warn!(status, error = %error_body, "Token exchange failed");

            return Err(AuthError::InvalidAuthCode(format!(
                "Token endpoint returned {}: {}",
                status, error_body
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .map_err(|e| AuthError::Serialization(format!("Failed to parse token response: {}", e)))?;

        info!(
            expires_in = token_response.expires_in,
            "Exchanged authorization code for tokens"
        );

        Ok(OAuthTokens::issued_at(
            token_response.access_token,
            token_response.refresh_token,
            token_response.expires_in,
            self.clock.now(),
        ))
    }

    /// Refresh an access token.
    ///
    /// Server errors are retried with exponential backoff. Client errors
    /// (revoked or invalid refresh token) fail immediately. When the response
    /// carries no new refresh token the old one is kept.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<OAuthTokens> {
        let mut params = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
        ];
        if let Some(ref client_secret) = self.config.client_secret {
            params.push(("client_secret", client_secret.as_str()));
        }

        let encoded_body = serde_urlencoded::to_string(&params)
            .map_err(|e| AuthError::Serialization(format!("Failed to encode token request: {}", e)))?;

        let mut attempts = 0;

        loop {
            attempts += 1;

            let request = HttpRequest::new(HttpMethod::Post, self.config.token_url.clone())
                .form(encoded_body.clone());

            let response = match self.http_client.execute(request).await {
                Ok(response) => response,
                Err(e) if e.is_retryable() && attempts < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(attempts);
                    warn!(attempts, error = %e, "Token refresh request failed, retrying");
                    sleep(delay).await;
                    continue;
                }
                Err(e) => return Err(AuthError::Network(e.to_string())),
            };

            if response.is_success() {
                let token_response: TokenResponse = response.json().map_err(|e| {
                    AuthError::Serialization(format!("Failed to parse token response: {}", e))
                })?;

                info!(
                    expires_in = token_response.expires_in,
                    "Refreshed access token"
                );

                return Ok(OAuthTokens::issued_at(
                    token_response.access_token,
                    token_response
                        .refresh_token
                        .or_else(|| Some(refresh_token.to_string())),
                    token_response.expires_in,
                    self.clock.now(),
                ));
            }

            let status = response.status;
            let error_body = response
                .text()
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            if response.is_client_error() {
                warn!(status, error = %error_body, "Token refresh rejected");
                return Err(AuthError::TokenRefreshFailed(format!(
                    "Token endpoint returned {}: {}",
                    status, error_body
                )));
            }

            // The refresh token may still be good; only a 4xx rejects it
            if attempts >= self.retry.max_attempts {
                return Err(AuthError::Network(format!(
                    "Token refresh failed after {} attempts. Last error: {} - {}",
                    attempts, status, error_body
                )));
            }

            let delay = self.retry.delay_for(attempts);
            warn!(
                status,
                attempts,
                delay_ms = delay.as_millis() as u64,
                "Token refresh failed, retrying"
            );
            sleep(delay).await;
        }
    }
}

/// JSON body returned by the token endpoint.
#[derive(Debug, Deserialize, Serialize)]
struct TokenResponse {
    access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
}

fn default_expires_in() -> i64 {
    3600
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::http::HttpResponse;
    use bridge_traits::time::FixedClock;
    use chrono::{TimeZone, Utc};
    use mockall::mock;
    use std::collections::HashMap;

    fn body(status: u16, json: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: json.as_bytes().to_vec().into(),
        }
    }

    mock! {
        HttpClient {}

        #[async_trait::async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    fn test_config() -> OAuthConfig {
        OAuthConfig::spotify(&OAuthClientConfig {
            client_id: "test-client".to_string(),
            client_secret: None,
            redirect_uri: "http://localhost:8080/".to_string(),
        })
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: std::time::Duration::from_millis(1),
            max_delay: std::time::Duration::from_millis(5),
        }
    }

    fn fixed_clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::new(Utc.timestamp_opt(1_700_000_000, 0).unwrap()))
    }

    fn form_fields(request: &HttpRequest) -> HashMap<String, String> {
        let raw = request.body.as_ref().map(|b| b.to_vec()).unwrap_or_default();
        serde_urlencoded::from_bytes(&raw).unwrap()
    }

    #[test]
    fn test_pkce_verifier_generation() {
        let verifier = PkceVerifier::new();
        assert!(!verifier.verifier().is_empty());
        assert!(!verifier.state().is_empty());
        assert_eq!(verifier.challenge(), verifier.challenge());

        let other = PkceVerifier::new();
        assert_ne!(verifier.verifier(), other.verifier());
        assert_ne!(verifier.state(), other.state());
    }

    #[test]
    fn test_pkce_challenge_matches_rfc_vector() {
        // RFC 7636 appendix B
        let verifier = PkceVerifier {
            verifier: "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk".to_string(),
            state: "s".to_string(),
        };
        assert_eq!(
            verifier.challenge(),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_spotify_config() {
        let config = test_config();
        assert_eq!(config.auth_url, SPOTIFY_AUTH_URL);
        assert_eq!(config.token_url, SPOTIFY_TOKEN_URL);
        assert!(config.scopes.contains(&"user-top-read".to_string()));
        assert!(config.scopes.contains(&"user-read-recently-played".to_string()));
    }

    #[test]
    fn test_build_auth_url() {
        let manager = OAuthFlowManager::new(test_config(), Arc::new(MockHttpClient::new()));
        let (url, verifier) = manager.build_auth_url().unwrap();

        let parsed = Url::parse(&url).unwrap();
        let pairs: HashMap<String, String> = parsed.query_pairs().into_owned().collect();

        assert_eq!(pairs["client_id"], "test-client");
        assert_eq!(pairs["redirect_uri"], "http://localhost:8080/");
        assert_eq!(pairs["response_type"], "code");
        assert_eq!(pairs["state"], verifier.state());
        assert_eq!(pairs["code_challenge"], verifier.challenge());
        assert_eq!(pairs["code_challenge_method"], "S256");
        assert!(pairs["scope"].contains("playlist-modify-private"));
    }

    #[test]
    fn test_build_auth_url_invalid_url() {
        let mut config = test_config();
        config.auth_url = "not a valid url".to_string();

        let manager = OAuthFlowManager::new(config, Arc::new(MockHttpClient::new()));
        assert!(matches!(
            manager.build_auth_url(),
            Err(AuthError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_parse_redirect_url() {
        let parsed = parse_redirect_url("http://localhost:8080/?code=abc&state=xyz").unwrap();
        assert_eq!(parsed.code, "abc");
        assert_eq!(parsed.state, "xyz");

        assert!(matches!(
            parse_redirect_url("http://localhost:8080/?error=access_denied&state=xyz"),
            Err(AuthError::AuthenticationFailed(_))
        ));
        assert!(matches!(
            parse_redirect_url("http://localhost:8080/?state=xyz"),
            Err(AuthError::InvalidRedirect(_))
        ));
        assert!(matches!(
            parse_redirect_url("nonsense"),
            Err(AuthError::InvalidRedirect(_))
        ));
    }

    #[tokio::test]
    async fn test_exchange_code_rejects_state_mismatch() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().never();

        let manager = OAuthFlowManager::new(test_config(), Arc::new(mock_http));
        let verifier = PkceVerifier::new();

        let result = manager.exchange_code("code", "wrong-state", &verifier).await;
        assert!(matches!(result, Err(AuthError::StateMismatch { .. })));
    }

    #[tokio::test]
    async fn test_exchange_code_success() {
        let verifier = PkceVerifier::new();
        let expected_verifier = verifier.verifier().to_string();

        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .withf(move |req| {
                let fields = form_fields(req);
                req.method == HttpMethod::Post
                    && req.url == SPOTIFY_TOKEN_URL
                    && fields.get("grant_type").map(String::as_str) == Some("authorization_code")
                    && fields.get("code").map(String::as_str) == Some("the-code")
                    && fields.get("code_verifier") == Some(&expected_verifier)
                    && !fields.contains_key("client_secret")
            })
            .times(1)
            .returning(|_| {
                Ok(body(
                    200,
                    r#"{"access_token":"access","refresh_token":"refresh","expires_in":3600,"token_type":"Bearer"}"#,
                ))
            });

        let clock = fixed_clock();
        let manager =
            OAuthFlowManager::new(test_config(), Arc::new(mock_http)).with_clock(clock.clone());

        let tokens = manager
            .exchange_code("the-code", verifier.state(), &verifier)
            .await
            .unwrap();

        assert_eq!(tokens.access_token, "access");
        assert_eq!(tokens.refresh_token.as_deref(), Some("refresh"));
        assert_eq!(tokens.expires_at.timestamp(), 1_700_000_000 + 3600);
    }

    #[tokio::test]
    async fn test_exchange_code_rejected() {
        let verifier = PkceVerifier::new();
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(body(400, r#"{"error":"invalid_grant"}"#)));

        let manager = OAuthFlowManager::new(test_config(), Arc::new(mock_http));
        let result = manager
            .exchange_code("bad", verifier.state(), &verifier)
            .await;
        assert!(matches!(result, Err(AuthError::InvalidAuthCode(_))));
    }

    #[tokio::test]
    async fn test_refresh_keeps_old_refresh_token() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .withf(|req| {
                let fields = form_fields(req);
                fields.get("grant_type").map(String::as_str) == Some("refresh_token")
                    && fields.get("refresh_token").map(String::as_str) == Some("old-refresh")
            })
            .times(1)
            .returning(|_| Ok(body(200, r#"{"access_token":"new-access","expires_in":1800}"#)));

        let manager = OAuthFlowManager::new(test_config(), Arc::new(mock_http))
            .with_clock(fixed_clock());

        let tokens = manager.refresh_access_token("old-refresh").await.unwrap();
        assert_eq!(tokens.access_token, "new-access");
        assert_eq!(tokens.refresh_token.as_deref(), Some("old-refresh"));
        assert_eq!(tokens.expires_at.timestamp(), 1_700_000_000 + 1800);
    }

    #[tokio::test]
    async fn test_refresh_retries_server_errors() {
        let mut mock_http = MockHttpClient::new();
        let mut seq = mockall::Sequence::new();
        mock_http
            .expect_execute()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Ok(body(503, "unavailable")));
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(body(200, r#"{"access_token":"third-time"}"#)));

        let manager = OAuthFlowManager::new(test_config(), Arc::new(mock_http))
            .with_retry_policy(fast_retry());

        let tokens = manager.refresh_access_token("r").await.unwrap();
        assert_eq!(tokens.access_token, "third-time");
    }

    #[tokio::test]
    async fn test_refresh_gives_up_after_max_attempts() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(3)
            .returning(|_| Ok(body(500, "boom")));

        let manager = OAuthFlowManager::new(test_config(), Arc::new(mock_http))
            .with_retry_policy(fast_retry());

        let err = manager.refresh_access_token("r").await.unwrap_err();
        assert!(matches!(err, AuthError::Network(_)));
        assert!(!err.requires_login());
    }

    #[tokio::test]
    async fn test_refresh_client_error_not_retried() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(body(400, r#"{"error":"invalid_grant"}"#)));

        let manager = OAuthFlowManager::new(test_config(), Arc::new(mock_http))
            .with_retry_policy(fast_retry());

        let err = manager.refresh_access_token("revoked").await.unwrap_err();
        assert!(matches!(err, AuthError::TokenRefreshFailed(_)));
        assert!(err.requires_login());
    }

    #[tokio::test]
    async fn test_refresh_transport_exhaustion_is_network_error() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(3)
            .returning(|_| Err(BridgeError::OperationFailed("connection reset".into())));

        let manager = OAuthFlowManager::new(test_config(), Arc::new(mock_http))
            .with_retry_policy(fast_retry());

        let err = manager.refresh_access_token("r").await.unwrap_err();
        assert!(matches!(err, AuthError::Network(_)));
        assert!(!err.requires_login());
    }

    #[tokio::test]
    async fn test_refresh_transport_error_retried() {
        let mut mock_http = MockHttpClient::new();
        let mut seq = mockall::Sequence::new();
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(BridgeError::OperationFailed("connection reset".into())));
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(body(200, r#"{"access_token":"ok"}"#)));

        let manager = OAuthFlowManager::new(test_config(), Arc::new(mock_http))
            .with_retry_policy(fast_retry());

        assert_eq!(
            manager.refresh_access_token("r").await.unwrap().access_token,
            "ok"
        );
    }

    #[test]
    fn test_token_response_deserialization_minimal() {
        let response: TokenResponse = serde_json::from_str(r#"{"access_token":"token"}"#).unwrap();
        assert_eq!(response.access_token, "token");
        assert_eq!(response.refresh_token, None);
        assert_eq!(response.expires_in, 3600);
    }
}
