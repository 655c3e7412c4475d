use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Authentication error: {0}")]
    Auth(#[from] core_auth::AuthError),

    #[error("Sync error: {0}")]
    Sync(#[from] core_sync::SyncError),

    #[error("Provider error: {0}")]
    Provider(#[from] bridge_traits::BridgeError),
}

impl CoreError {
    /// Whether the user has to run the login flow before retrying.
    pub fn requires_login(&self) -> bool {
        match self {
            CoreError::Auth(e) => e.requires_login(),
            CoreError::Sync(e) => e.is_fatal(),
            CoreError::Provider(e) => e.is_unauthorized(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
