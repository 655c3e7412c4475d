//! # Cache Configuration Records
//!
//! Serde model of the JSON config file:
//!
//! ```json
//! {
//!   "global_settings": { "repeat_rewind_playlist_id": "..." },
//!   "caches": {
//!     "<parent_id>": {
//!       "parent_name": "Road Trip",
//!       "cache_id": "...",
//!       "long_term_top_tracks": false,
//!       "cache_minimum_size": 0,
//!       "interval": 3600,
//!       "active": true
//!     }
//!   }
//! }
//! ```
//!
//! Fields this crate does not know about are kept in `extra` maps and written
//! back unchanged.

use crate::{Result, SyncError};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;

/// Default reconciliation cadence in seconds
pub const DEFAULT_INTERVAL_SECS: u64 = 3600;

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_active() -> bool {
    true
}

/// Treat `""` the same as a missing id.
fn non_empty_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|id| !id.trim().is_empty()))
}

// ============================================================================
// CacheConfig
// ============================================================================

/// One managed parent/cache relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Source playlist id. Stored as the key of the `caches` object.
    #[serde(skip)]
    pub parent_id: String,

    /// Parent playlist name, refreshed whenever the cache is created
    #[serde(default)]
    pub parent_name: String,

    /// Maintained playlist; `None` triggers creation
    #[serde(
        default,
        deserialize_with = "non_empty_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub cache_id: Option<String>,

    #[serde(rename = "long_term_top_tracks", default)]
    pub use_long_term_window: bool,

    /// Eviction never shrinks the cache below this size
    #[serde(rename = "cache_minimum_size", default)]
    pub minimum_retained_size: usize,

    #[serde(rename = "interval", default = "default_interval")]
    pub poll_interval_seconds: u64,

    #[serde(default = "default_active")]
    pub active: bool,

    /// Extra playlists unioned into the parent track set
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alt_sources: Vec<String>,

    /// Overrides `global_settings.repeat_rewind_playlist_id`
    #[serde(
        default,
        deserialize_with = "non_empty_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub repeat_source_id: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CacheConfig {
    /// A new active record with default thresholds and no cache playlist yet.
    pub fn new(parent_id: impl Into<String>) -> Self {
        Self {
            parent_id: parent_id.into(),
            parent_name: String::new(),
            cache_id: None,
            use_long_term_window: false,
            minimum_retained_size: 0,
            poll_interval_seconds: DEFAULT_INTERVAL_SECS,
            active: true,
            alt_sources: Vec::new(),
            repeat_source_id: None,
            extra: Map::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.parent_id.trim().is_empty() {
            return Err(SyncError::Config("parent playlist id is empty".to_string()));
        }
        if self.poll_interval_seconds == 0 {
            return Err(SyncError::Config(format!(
                "interval for {} must be a positive number of seconds",
                self.parent_id
            )));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    /// Name given to a newly created cache playlist.
    pub fn cache_name(&self) -> String {
        format!("{} cache", self.parent_name)
    }

    /// Per-cache repeat source, falling back to the global one.
    pub fn effective_repeat_source<'a>(&'a self, global: &'a GlobalSettings) -> Option<&'a str> {
        self.repeat_source_id
            .as_deref()
            .or(global.repeat_rewind_playlist_id.as_deref())
    }
}

/// Description written on every cache playlist this tool creates.
pub fn cache_description(parent_name: &str) -> String {
    format!(
        "This playlist is maintained by my playlist_cache script which runs an hourly job to \
         compare my most recently played music with the songs in {} and maintain this \
         playlist with any matching tracks.",
        parent_name
    )
}

// ============================================================================
// Global settings and document
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalSettings {
    #[serde(
        default,
        deserialize_with = "non_empty_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub repeat_rewind_playlist_id: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The whole config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default)]
    pub global_settings: GlobalSettings,

    #[serde(default)]
    pub caches: BTreeMap<String, CacheConfig>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConfigDocument {
    pub fn from_json(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut document: ConfigDocument = serde_json::from_str(json)?;
        for (parent_id, cache) in document.caches.iter_mut() {
            cache.parent_id = parent_id.clone();
        }
        Ok(document)
    }

    /// Pretty-printed JSON with a trailing newline.
    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    pub fn cache(&self, parent_id: &str) -> Option<CacheConfig> {
        self.caches.get(parent_id).cloned()
    }

    pub fn upsert(&mut self, config: CacheConfig) {
        self.caches.insert(config.parent_id.clone(), config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "global_settings": { "repeat_rewind_playlist_id": "rr1", "theme": "dark" },
        "caches": {
            "parent1": {
                "parent_name": "Road Trip",
                "cache_id": "cache1",
                "long_term_top_tracks": true,
                "cache_minimum_size": 25,
                "interval": 600,
                "active": true,
                "alt_sources": ["alt1"],
                "notes": "kept"
            },
            "parent2": {
                "cache_id": ""
            }
        },
        "version": 2
    }"#;

    #[test]
    fn test_parse_full_record() {
        let doc = ConfigDocument::from_json(SAMPLE).unwrap();
        let cache = doc.cache("parent1").unwrap();

        assert_eq!(cache.parent_id, "parent1");
        assert_eq!(cache.parent_name, "Road Trip");
        assert_eq!(cache.cache_id.as_deref(), Some("cache1"));
        assert!(cache.use_long_term_window);
        assert_eq!(cache.minimum_retained_size, 25);
        assert_eq!(cache.poll_interval(), Duration::from_secs(600));
        assert_eq!(cache.alt_sources, vec!["alt1".to_string()]);
        assert_eq!(cache.extra.get("notes"), Some(&Value::from("kept")));
        assert_eq!(
            doc.global_settings.repeat_rewind_playlist_id.as_deref(),
            Some("rr1")
        );
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let doc = ConfigDocument::from_json(SAMPLE).unwrap();
        let cache = doc.cache("parent2").unwrap();

        assert_eq!(cache.cache_id, None);
        assert!(!cache.use_long_term_window);
        assert_eq!(cache.minimum_retained_size, 0);
        assert_eq!(cache.poll_interval_seconds, DEFAULT_INTERVAL_SECS);
        assert!(cache.active);
        assert!(cache.alt_sources.is_empty());
    }

    #[test]
    fn test_unknown_fields_survive_rewrite() {
        let doc = ConfigDocument::from_json(SAMPLE).unwrap();
        let rewritten = ConfigDocument::from_json(&doc.to_json().unwrap()).unwrap();

        assert_eq!(rewritten, doc);
        assert_eq!(rewritten.extra.get("version"), Some(&Value::from(2)));
        assert_eq!(
            rewritten.global_settings.extra.get("theme"),
            Some(&Value::from("dark"))
        );
    }

    #[test]
    fn test_parent_id_not_serialized_inside_record() {
        let mut doc = ConfigDocument::default();
        doc.upsert(CacheConfig::new("p9"));
        let json: Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();

        assert!(json["caches"]["p9"].get("parent_id").is_none());
        assert!(json["caches"]["p9"].get("cache_id").is_none());
        assert_eq!(json["caches"]["p9"]["interval"], Value::from(3600));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut cache = CacheConfig::new("p");
        cache.poll_interval_seconds = 0;
        assert!(matches!(cache.validate(), Err(SyncError::Config(_))));

        assert!(CacheConfig::new("p").validate().is_ok());
        assert!(CacheConfig::new(" ").validate().is_err());
    }

    #[test]
    fn test_repeat_source_override() {
        let global = GlobalSettings {
            repeat_rewind_playlist_id: Some("global".to_string()),
            extra: Map::new(),
        };
        let mut cache = CacheConfig::new("p");
        assert_eq!(cache.effective_repeat_source(&global), Some("global"));

        cache.repeat_source_id = Some("local".to_string());
        assert_eq!(cache.effective_repeat_source(&global), Some("local"));
    }

    #[test]
    fn test_cache_naming() {
        let mut cache = CacheConfig::new("p");
        cache.parent_name = "Road Trip".to_string();
        assert_eq!(cache.cache_name(), "Road Trip cache");
        assert!(cache_description("Road Trip").contains("the songs in Road Trip and maintain"));
    }

    #[test]
    fn test_empty_file_is_empty_document() {
        assert_eq!(ConfigDocument::from_json("  ").unwrap(), ConfigDocument::default());
    }
}
