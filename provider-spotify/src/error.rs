//! Error types for the Spotify provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Spotify Web API errors
#[derive(Error, Debug)]
pub enum SpotifyError {
    /// Access token missing, expired or rejected
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Token could not be obtained right now, a later attempt may work
    #[error("Token unavailable: {0}")]
    TokenUnavailable(String),

    /// API request returned an error
    #[error("Spotify API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded, retry after {retry_after_seconds:?} seconds")]
    RateLimitExceeded { retry_after_seconds: Option<u64> },

    /// Playlist or other resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

/// Result type for Spotify operations
pub type Result<T> = std::result::Result<T, SpotifyError>;

impl From<core_auth::AuthError> for SpotifyError {
    fn from(error: core_auth::AuthError) -> Self {
        if error.requires_login() {
            SpotifyError::AuthenticationFailed(error.to_string())
        } else {
            SpotifyError::TokenUnavailable(error.to_string())
        }
    }
}

impl From<SpotifyError> for BridgeError {
    fn from(error: SpotifyError) -> Self {
        match error {
            SpotifyError::AuthenticationFailed(msg) => BridgeError::Unauthorized(msg),
            SpotifyError::TokenUnavailable(msg) => BridgeError::OperationFailed(msg),
            SpotifyError::ApiError {
                status_code,
                message,
            } => match status_code {
                401 => BridgeError::Unauthorized(message),
                404 => BridgeError::NotFound(message),
                _ => BridgeError::Http {
                    status: status_code,
                    message,
                },
            },
            SpotifyError::RateLimitExceeded {
                retry_after_seconds,
            } => BridgeError::RateLimited {
                retry_after_secs: retry_after_seconds,
            },
            SpotifyError::NotFound(what) => BridgeError::NotFound(what),
            SpotifyError::ParseError(msg) => BridgeError::Serialization(msg),
            SpotifyError::BridgeError(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = SpotifyError::ApiError {
            status_code: 502,
            message: "Bad gateway".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Spotify API error (status 502): Bad gateway"
        );
    }

    #[test]
    fn test_error_conversion_keeps_retryability() {
        let server: BridgeError = SpotifyError::ApiError {
            status_code: 503,
            message: "unavailable".to_string(),
        }
        .into();
        assert!(server.is_retryable());

        let auth: BridgeError = SpotifyError::AuthenticationFailed("expired".to_string()).into();
        assert!(auth.is_unauthorized());
        assert!(!auth.is_retryable());

        let missing: BridgeError = SpotifyError::NotFound("playlist abc".to_string()).into();
        assert!(matches!(missing, BridgeError::NotFound(_)));

        let limited: BridgeError = SpotifyError::RateLimitExceeded {
            retry_after_seconds: Some(3),
        }
        .into();
        assert!(limited.is_retryable());
    }

    #[test]
    fn test_forbidden_is_not_an_auth_failure() {
        let forbidden: BridgeError = SpotifyError::ApiError {
            status_code: 403,
            message: "You cannot add tracks to a playlist you don't own.".to_string(),
        }
        .into();
        assert!(matches!(forbidden, BridgeError::Http { status: 403, .. }));
        assert!(!forbidden.is_unauthorized());
        assert!(!forbidden.is_retryable());

        let expired: BridgeError = SpotifyError::ApiError {
            status_code: 401,
            message: "The access token expired".to_string(),
        }
        .into();
        assert!(expired.is_unauthorized());
    }

    #[test]
    fn test_auth_error_mapping() {
        let login: SpotifyError = core_auth::AuthError::NotAuthenticated.into();
        assert!(matches!(login, SpotifyError::AuthenticationFailed(_)));

        let transient: SpotifyError = core_auth::AuthError::Network("timeout".into()).into();
        assert!(matches!(transient, SpotifyError::TokenUnavailable(_)));
        let bridged: BridgeError = transient.into();
        assert!(bridged.is_retryable());
        assert!(!bridged.is_unauthorized());
    }
}
