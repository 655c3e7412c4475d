use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("Secure storage unavailable: {0}")]
    SecureStorageUnavailable(String),

    #[error("Not authenticated, run the login command first")]
    NotAuthenticated,

    #[error("Stored tokens have no refresh token")]
    NoRefreshToken,

    #[error("Stored tokens are corrupted: {0}")]
    TokenCorrupted(String),

    #[error("OAuth state mismatch: expected {expected}, got {actual}")]
    StateMismatch { expected: String, actual: String },

    #[error("Invalid authorization code: {0}")]
    InvalidAuthCode(String),

    #[error("No authorization flow in progress")]
    NoAuthorizationInProgress,

    #[error("Invalid redirect URL: {0}")]
    InvalidRedirect(String),

    #[error("Invalid OAuth configuration: {0}")]
    InvalidConfig(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AuthError {
    /// Errors that cannot be fixed without the user signing in again.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            AuthError::NotAuthenticated
                | AuthError::NoRefreshToken
                | AuthError::TokenCorrupted(_)
                | AuthError::TokenRefreshFailed(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
