//! File-backed credential storage
//!
//! Secrets are kept base64-encoded in a single JSON object on disk. On Unix the
//! file is created with `0600` permissions.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bridge_traits::{
    error::{BridgeError, Result},
    storage::SecureStore,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, error};

/// JSON file secure store
///
/// All reads and writes go through an async mutex so concurrent token refreshes
/// from different tasks never interleave their read-modify-write cycles.
pub struct FileSecureStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSecureStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Store under the platform data directory, e.g. `~/.local/share/playlist-cache/tokens.json`.
    pub fn in_data_dir() -> Result<Self> {
        let dir = dirs::data_dir().ok_or_else(|| {
            BridgeError::NotAvailable("No data directory on this platform".to_string())
        })?;
        Ok(Self::new(dir.join("playlist-cache").join("tokens.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        let data = serde_json::to_vec_pretty(entries)?;
        tokio::fs::write(&tmp, data).await?;
        restrict_permissions(&tmp).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[async_trait]
impl SecureStore for FileSecureStore {
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), STANDARD.encode(value));
        self.persist(&entries).await?;

        debug!(key = key, "Stored secret");
        Ok(())
    }

    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let _guard = self.lock.lock().await;
        let entries = self.load().await?;

        match entries.get(key) {
            Some(encoded) => {
                let decoded = STANDARD.decode(encoded).map_err(|e| {
                    error!(key = key, error = %e, "Failed to decode secret");
                    BridgeError::OperationFailed(format!("Failed to decode secret: {}", e))
                })?;
                Ok(Some(decoded))
            }
            None => {
                debug!(key = key, "Secret not found");
                Ok(None)
            }
        }
    }

    async fn delete_secret(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        if entries.remove(key).is_some() {
            self.persist(&entries).await?;
            debug!(key = key, "Deleted secret");
        }
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.into_keys().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_set_and_get_secret() {
        let dir = TempDir::new().unwrap();
        let store = FileSecureStore::new(dir.path().join("tokens.json"));

        store.set_secret("spotify.tokens", b"secret-value").await.unwrap();

        assert_eq!(
            store.get_secret("spotify.tokens").await.unwrap(),
            Some(b"secret-value".to_vec())
        );
        assert!(store.has_secret("spotify.tokens").await.unwrap());
        assert_eq!(store.list_keys().await.unwrap(), vec!["spotify.tokens"]);
    }

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileSecureStore::new(dir.path().join("nested").join("tokens.json"));

        assert_eq!(store.get_secret("absent").await.unwrap(), None);
        store.delete_secret("absent").await.unwrap();
        assert!(store.list_keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_secret() {
        let dir = TempDir::new().unwrap();
        let store = FileSecureStore::new(dir.path().join("tokens.json"));

        store.set_secret("a", b"1").await.unwrap();
        store.set_secret("b", b"2").await.unwrap();
        store.delete_secret("a").await.unwrap();

        assert_eq!(store.get_secret("a").await.unwrap(), None);
        assert_eq!(store.get_secret("b").await.unwrap(), Some(b"2".to_vec()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_is_user_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tokens.json");
        let store = FileSecureStore::new(&path);
        store.set_secret("k", b"v").await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
