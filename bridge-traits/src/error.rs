use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    /// Non-success HTTP status returned by a remote service.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The remote service rejected the credentials (HTTP 401/403).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The remote service asked the caller to slow down (HTTP 429).
    #[error("Rate limited, retry after {retry_after_secs:?}s")]
    RateLimited { retry_after_secs: Option<u64> },

    /// The requested remote resource does not exist (HTTP 404).
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether repeating the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            BridgeError::RateLimited { .. } | BridgeError::Io(_) => true,
            BridgeError::Http { status, .. } => *status >= 500,
            BridgeError::OperationFailed(_) => true,
            BridgeError::NotAvailable(_)
            | BridgeError::Unauthorized(_)
            | BridgeError::NotFound(_)
            | BridgeError::Serialization(_) => false,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, BridgeError::Unauthorized(_))
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(BridgeError::RateLimited {
            retry_after_secs: Some(2)
        }
        .is_retryable());
        assert!(BridgeError::Http {
            status: 503,
            message: "unavailable".to_string()
        }
        .is_retryable());
        assert!(!BridgeError::Http {
            status: 400,
            message: "bad request".to_string()
        }
        .is_retryable());
        assert!(!BridgeError::Unauthorized("expired".to_string()).is_retryable());
        assert!(!BridgeError::NotFound("playlist".to_string()).is_retryable());
    }
}
