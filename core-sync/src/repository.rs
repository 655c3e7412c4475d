//! # Cache Config Repository
//!
//! Persistence for [`CacheConfig`] records. The JSON implementation keeps the
//! whole document in one file, serializes read-modify-write cycles within the
//! process and replaces the file atomically.

use crate::config::{CacheConfig, ConfigDocument, GlobalSettings};
use crate::{Result, SyncError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

/// Storage of cache records keyed by parent playlist id.
#[async_trait]
pub trait CacheConfigRepository: Send + Sync {
    /// Read one record, `None` when the parent has no cache configured.
    async fn read(&self, parent_id: &str) -> Result<Option<CacheConfig>>;

    /// Insert or replace the record for `config.parent_id`.
    async fn write(&self, config: &CacheConfig) -> Result<()>;

    /// Ids of every configured parent playlist.
    async fn list_all(&self) -> Result<Vec<String>>;

    async fn global_settings(&self) -> Result<GlobalSettings>;

    /// Every record, in `list_all` order.
    async fn list_configs(&self) -> Result<Vec<CacheConfig>> {
        let mut configs = Vec::new();
        for parent_id in self.list_all().await? {
            if let Some(config) = self.read(&parent_id).await? {
                configs.push(config);
            }
        }
        Ok(configs)
    }
}

/// JSON file implementation of [`CacheConfigRepository`]
pub struct JsonCacheConfigRepository {
    path: PathBuf,
    /// Serializes read-modify-write cycles
    lock: Mutex<()>,
}

impl JsonCacheConfigRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file reads as an empty document.
    async fn load(&self) -> Result<ConfigDocument> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => ConfigDocument::from_json(&json).map_err(|e| {
                SyncError::Config(format!("{}: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Config file missing, using empty document");
                Ok(ConfigDocument::default())
            }
            Err(e) => Err(SyncError::Io(e)),
        }
    }

    async fn save(&self, document: &ConfigDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, document.to_json()?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl CacheConfigRepository for JsonCacheConfigRepository {
    #[instrument(skip(self))]
    async fn read(&self, parent_id: &str) -> Result<Option<CacheConfig>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.cache(parent_id))
    }

    #[instrument(skip(self, config), fields(parent_id = %config.parent_id))]
    async fn write(&self, config: &CacheConfig) -> Result<()> {
        config.validate()?;

        let _guard = self.lock.lock().await;
        let mut document = self.load().await?;
        document.upsert(config.clone());
        self.save(&document).await?;

        info!(
            cache_id = config.cache_id.as_deref().unwrap_or("-"),
            active = config.active,
            "Cache config written"
        );
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.caches.into_keys().collect())
    }

    async fn global_settings(&self) -> Result<GlobalSettings> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.global_settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn repo_in(dir: &TempDir) -> JsonCacheConfigRepository {
        JsonCacheConfigRepository::new(dir.path().join("config.json"))
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let repo = repo_in(&dir);

        assert!(repo.read("p1").await.unwrap().is_none());
        assert!(repo.list_all().await.unwrap().is_empty());
        assert_eq!(repo.global_settings().await.unwrap(), GlobalSettings::default());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let repo = repo_in(&dir);

        let mut config = CacheConfig::new("p1");
        config.cache_id = Some("c1".to_string());
        config.minimum_retained_size = 10;
        repo.write(&config).await.unwrap();

        assert_eq!(repo.read("p1").await.unwrap(), Some(config));
        assert_eq!(repo.list_all().await.unwrap(), vec!["p1".to_string()]);
        assert!(!dir.path().join("config.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_write_preserves_other_records_and_unknown_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"global_settings":{"repeat_rewind_playlist_id":"rr"},
                "caches":{"other":{"cache_id":"c9","custom":1}},
                "owner":"me"}"#,
        )
        .unwrap();
        let repo = JsonCacheConfigRepository::new(&path);

        repo.write(&CacheConfig::new("p1")).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["owner"], "me");
        assert_eq!(raw["caches"]["other"]["custom"], 1);
        assert_eq!(raw["caches"]["other"]["cache_id"], "c9");
        assert_eq!(raw["global_settings"]["repeat_rewind_playlist_id"], "rr");
        assert_eq!(repo.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_record_rejected() {
        let dir = TempDir::new().unwrap();
        let repo = repo_in(&dir);

        let mut config = CacheConfig::new("p1");
        config.poll_interval_seconds = 0;
        assert!(matches!(repo.write(&config).await, Err(SyncError::Config(_))));
        assert!(!repo.path().exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let repo = JsonCacheConfigRepository::new(&path);
        assert!(matches!(repo.read("p1").await, Err(SyncError::Config(_))));
    }

    #[tokio::test]
    async fn test_concurrent_writes_keep_every_record() {
        let dir = TempDir::new().unwrap();
        let repo = Arc::new(repo_in(&dir));

        let mut handles = Vec::new();
        for i in 0..8 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.write(&CacheConfig::new(format!("p{}", i))).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(repo.list_all().await.unwrap().len(), 8);
        assert_eq!(repo.list_configs().await.unwrap().len(), 8);
    }
}
