use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// OAuth 2.0 token set.
///
/// Tokens should be stored securely and never logged. The `Debug` implementation
/// redacts both token values.
///
/// # Examples
///
/// ```
/// use core_auth::OAuthTokens;
/// use chrono::Utc;
///
/// let tokens = OAuthTokens::issued_at(
///     "access".to_string(),
///     Some("refresh".to_string()),
///     3600,
///     Utc::now(),
/// );
/// assert!(!tokens.is_expired_at(Utc::now()));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthTokens {
    /// The access token used for API requests
    pub access_token: String,
    /// The refresh token used to obtain new access tokens
    pub refresh_token: Option<String>,
    /// When the access token expires
    pub expires_at: DateTime<Utc>,
}

impl OAuthTokens {
    /// Create a token set that expires `expires_in` seconds after `now`.
    pub fn issued_at(
        access_token: String,
        refresh_token: Option<String>,
        expires_in: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: now + Duration::seconds(expires_in),
        }
    }

    /// Rebuild a token set from persisted parts.
    pub fn from_parts(
        access_token: String,
        refresh_token: Option<String>,
        expires_at_unix: i64,
    ) -> Option<Self> {
        let expires_at = DateTime::<Utc>::from_timestamp(expires_at_unix, 0)?;
        Some(Self {
            access_token,
            refresh_token,
            expires_at,
        })
    }

    /// Expired, or expiring within the default five minute buffer.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.is_expired_with_buffer(now, 300)
    }

    pub fn is_expired_with_buffer(&self, now: DateTime<Utc>, buffer_seconds: i64) -> bool {
        now + Duration::seconds(buffer_seconds) >= self.expires_at
    }

    /// Time remaining before expiry, `None` once expired.
    pub fn time_until_expiry(&self, now: DateTime<Utc>) -> Option<Duration> {
        let remaining = self.expires_at - now;
        if remaining > Duration::zero() {
            Some(remaining)
        } else {
            None
        }
    }
}

// Custom Debug implementation to avoid logging tokens
impl fmt::Debug for OAuthTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthTokens")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Authentication state as seen by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// No tokens stored
    SignedOut,
    /// Authorization URL issued, waiting for the redirect
    SigningIn,
    /// Valid tokens stored
    SignedIn,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::SignedIn)
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AuthState::SignedOut => "signed out",
            AuthState::SigningIn => "signing in",
            AuthState::SignedIn => "signed in",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_expiry_uses_buffer() {
        let tokens = OAuthTokens::issued_at("a".into(), None, 3600, at(1_000));

        assert!(!tokens.is_expired_at(at(1_000)));
        // 299s before expiry is inside the five minute buffer
        assert!(tokens.is_expired_at(at(1_000 + 3600 - 299)));
        assert!(!tokens.is_expired_with_buffer(at(1_000 + 3600 - 299), 0));
        assert!(tokens.is_expired_with_buffer(at(1_000 + 3600), 0));
    }

    #[test]
    fn test_time_until_expiry() {
        let tokens = OAuthTokens::issued_at("a".into(), None, 60, at(0));
        assert_eq!(tokens.time_until_expiry(at(30)), Some(Duration::seconds(30)));
        assert_eq!(tokens.time_until_expiry(at(61)), None);
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let tokens = OAuthTokens::issued_at(
            "secret-access".into(),
            Some("secret-refresh".into()),
            60,
            at(0),
        );
        let debug = format!("{:?}", tokens);
        assert!(!debug.contains("secret-access"));
        assert!(!debug.contains("secret-refresh"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_from_parts_roundtrip() {
        let tokens = OAuthTokens::from_parts("a".into(), Some("r".into()), 5_000).unwrap();
        assert_eq!(tokens.expires_at.timestamp(), 5_000);
    }
}
