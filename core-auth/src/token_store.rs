//! Persistent token storage on top of [`SecureStore`].
//!
//! Tokens are serialized as JSON under a single well-known key. Corrupted
//! entries are deleted on read so the next `login` starts clean.

use crate::error::{AuthError, Result};
use crate::types::OAuthTokens;
use bridge_traits::storage::SecureStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Secure-store key holding the Spotify token set.
pub const TOKEN_KEY: &str = "spotify.tokens";

#[derive(Serialize, Deserialize)]
struct StoredTokens {
    access_token: String,
    refresh_token: Option<String>,
    /// Unix epoch seconds
    expires_at: i64,
}

pub struct TokenStore {
    secure_store: Arc<dyn SecureStore>,
    key: String,
}

impl TokenStore {
    pub fn new(secure_store: Arc<dyn SecureStore>) -> Self {
        Self {
            secure_store,
            key: TOKEN_KEY.to_string(),
        }
    }

    pub async fn store_tokens(&self, tokens: &OAuthTokens) -> Result<()> {
        let stored = StoredTokens {
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            expires_at: tokens.expires_at.timestamp(),
        };

        let json = serde_json::to_vec(&stored).map_err(|e| {
            warn!(error = %e, "Failed to serialize tokens");
            AuthError::Serialization(e.to_string())
        })?;

        self.secure_store
            .set_secret(&self.key, &json)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to store tokens in secure storage");
                AuthError::SecureStorageUnavailable(e.to_string())
            })?;

        info!(
            has_refresh_token = stored.refresh_token.is_some(),
            "Tokens stored securely"
        );

        Ok(())
    }

    pub async fn retrieve_tokens(&self) -> Result<Option<OAuthTokens>> {
        let data = self.secure_store.get_secret(&self.key).await.map_err(|e| {
            warn!(error = %e, "Failed to retrieve tokens from secure storage");
            AuthError::SecureStorageUnavailable(e.to_string())
        })?;

        let Some(data) = data else {
            debug!("No tokens found in storage");
            return Ok(None);
        };

        let parsed = serde_json::from_slice::<StoredTokens>(&data)
            .map_err(|e| e.to_string())
            .and_then(|stored| {
                OAuthTokens::from_parts(
                    stored.access_token,
                    stored.refresh_token,
                    stored.expires_at,
                )
                .ok_or_else(|| "expiry timestamp out of range".to_string())
            });

        match parsed {
            Ok(tokens) => {
                debug!(
                    has_refresh_token = tokens.refresh_token.is_some(),
                    expires_at = %tokens.expires_at,
                    "Tokens retrieved"
                );
                Ok(Some(tokens))
            }
            Err(reason) => {
                warn!(error = %reason, "Stored tokens are corrupted, removing them");

                if let Err(delete_err) = self.secure_store.delete_secret(&self.key).await {
                    warn!(error = %delete_err, "Failed to delete corrupted token data");
                }

                Err(AuthError::TokenCorrupted(reason))
            }
        }
    }

    pub async fn delete_tokens(&self) -> Result<()> {
        self.secure_store
            .delete_secret(&self.key)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to delete tokens from secure storage");
                AuthError::SecureStorageUnavailable(e.to_string())
            })?;

        info!("Tokens deleted");
        Ok(())
    }

    pub async fn has_tokens(&self) -> Result<bool> {
        self.secure_store
            .has_secret(&self.key)
            .await
            .map_err(|e| AuthError::SecureStorageUnavailable(e.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory secure store shared by the crate's unit tests.
    #[derive(Default)]
    pub(crate) struct MemoryStore {
        entries: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl MemoryStore {
        pub(crate) fn insert_raw(&self, key: &str, value: &[u8]) {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_vec());
        }
    }

    #[async_trait]
    impl SecureStore for MemoryStore {
        async fn set_secret(&self, key: &str, value: &[u8]) -> BridgeResult<()> {
            self.insert_raw(key, value);
            Ok(())
        }

        async fn get_secret(&self, key: &str) -> BridgeResult<Option<Vec<u8>>> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn delete_secret(&self, key: &str) -> BridgeResult<()> {
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }

        async fn list_keys(&self) -> BridgeResult<Vec<String>> {
            Ok(self.entries.lock().unwrap().keys().cloned().collect())
        }
    }

    fn sample_tokens() -> OAuthTokens {
        OAuthTokens::issued_at(
            "access".into(),
            Some("refresh".into()),
            3600,
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_store_and_retrieve() {
        let store = TokenStore::new(Arc::new(MemoryStore::default()));
        assert!(!store.has_tokens().await.unwrap());

        store.store_tokens(&sample_tokens()).await.unwrap();
        assert!(store.has_tokens().await.unwrap());

        let tokens = store.retrieve_tokens().await.unwrap().unwrap();
        assert_eq!(tokens, sample_tokens());
    }

    #[tokio::test]
    async fn test_retrieve_missing() {
        let store = TokenStore::new(Arc::new(MemoryStore::default()));
        assert!(store.retrieve_tokens().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupted_tokens_are_removed() {
        let backing = Arc::new(MemoryStore::default());
        backing.insert_raw(TOKEN_KEY, b"{not json");

        let store = TokenStore::new(backing.clone());
        let result = store.retrieve_tokens().await;
        assert!(matches!(result, Err(AuthError::TokenCorrupted(_))));
        assert!(!store.has_tokens().await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_tokens() {
        let store = TokenStore::new(Arc::new(MemoryStore::default()));
        store.store_tokens(&sample_tokens()).await.unwrap();
        store.delete_tokens().await.unwrap();
        assert!(store.retrieve_tokens().await.unwrap().is_none());
    }
}
