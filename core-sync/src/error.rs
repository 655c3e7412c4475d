use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Provider error: {message}")]
    Provider { message: String, retryable: bool },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("No cache configured for parent playlist {parent_id}")]
    CacheNotFound { parent_id: String },

    #[error("Cache task already running for parent playlist {parent_id}")]
    AlreadyRunning { parent_id: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SyncError {
    /// Whether the same operation may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Provider { retryable, .. } => *retryable,
            SyncError::Io(_) => true,
            _ => false,
        }
    }

    /// Errors that end a cache task no matter which state it is in.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SyncError::Auth(_))
    }

    /// Errors caused by the cache record or the config file itself.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            SyncError::Config(_) | SyncError::CacheNotFound { .. } | SyncError::Serialization(_)
        )
    }
}

impl From<BridgeError> for SyncError {
    fn from(error: BridgeError) -> Self {
        match error {
            BridgeError::Unauthorized(message) => SyncError::Auth(message),
            other => SyncError::Provider {
                retryable: other.is_retryable(),
                message: other.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
