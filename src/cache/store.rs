//! File-backed key-value store for raw API responses
//!
//! Provides a `JsonCache` that keeps a flat mapping from opaque string keys to
//! arbitrary JSON values and persists the whole mapping to a single file.

use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when persisting the cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// Writing the cache file or creating its directory failed
    #[error("Failed to write cache file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The mapping could not be serialized
    #[error("Failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Flat key-value cache backed by one JSON document
///
/// Keys are looked up by exact string match. Entries never expire and are
/// never evicted; every insert rewrites the whole backing file.
#[derive(Debug, Clone)]
pub struct JsonCache {
    /// File the mapping is persisted to
    path: PathBuf,
    /// The in-memory mapping
    entries: Map<String, Value>,
}

impl JsonCache {
    /// Loads the cache stored at `path`
    ///
    /// Returns an empty cache if the file is missing, unreadable, or does not
    /// hold a JSON object. The failure is not surfaced to the caller.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match read_entries(&path) {
            Ok(entries) => entries,
            Err(reason) => {
                tracing::debug!(path = %path.display(), %reason, "starting with an empty cache");
                Map::new()
            }
        };
        Self { path, entries }
    }

    /// Creates an empty cache that will be persisted to `path`
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Map::new(),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serializes the full mapping and overwrites the backing file
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err(CacheError)` if serialization, directory creation, or the write fails
    pub fn save(&self) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| CacheError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_string(&self.entries)?;
        fs::write(&self.path, json).map_err(|source| CacheError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Returns the value stored under `key`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Whether `key` is present
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Stores `value` under `key` and immediately persists the whole mapping
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Result<(), CacheError> {
        self.entries.insert(key.into(), value);
        self.save()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn read_entries(path: &Path) -> Result<Map<String, Value>, String> {
    let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
    match serde_json::from_str::<Value>(&content).map_err(|e| e.to_string())? {
        Value::Object(entries) => Ok(entries),
        _ => Err("top level is not a JSON object".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_cache() -> (JsonCache, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cache = JsonCache::load(temp_dir.path().join("cache.json"));
        (cache, temp_dir)
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let (cache, _temp_dir) = create_test_cache();
        assert!(cache.is_empty());
        assert!(!cache.path().exists());
    }

    #[test]
    fn test_load_invalid_json_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cache.json");
        fs::write(&path, "{not json").unwrap();

        let cache = JsonCache::load(&path);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_load_non_object_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cache.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let cache = JsonCache::load(&path);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_insert_persists_immediately() {
        let (mut cache, _temp_dir) = create_test_cache();
        cache
            .insert("48104NANApizza", json!([{"name": "Pizza House"}]))
            .expect("Insert should succeed");

        let content = fs::read_to_string(cache.path()).expect("Should read file");
        assert!(content.contains("48104NANApizza"));
        assert!(content.contains("Pizza House"));
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let (mut cache, _temp_dir) = create_test_cache();
        let markup = json!("<html><body>menu</body></html>");
        let results = json!([{"locations": [{"latLng": {"lat": 42.28, "lng": -83.74}}]}]);

        cache.insert("https://www.yelp.com/biz/a", markup.clone()).unwrap();
        cache.insert("geocode-key", results.clone()).unwrap();

        let reloaded = JsonCache::load(cache.path());
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get("https://www.yelp.com/biz/a"), Some(&markup));
        assert_eq!(reloaded.get("geocode-key"), Some(&results));
    }

    #[test]
    fn test_keys_match_exactly() {
        let (mut cache, _temp_dir) = create_test_cache();
        cache.insert("48104NANApizza", json!([])).unwrap();

        assert!(cache.contains("48104NANApizza"));
        assert!(!cache.contains("48104NANAPizza"));
        assert!(!cache.contains("48104NANApizza "));
        assert!(cache.get("48104nanapizza").is_none());
    }

    #[test]
    fn test_save_creates_directory_if_missing() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested").join("dir").join("cache.json");
        let mut cache = JsonCache::empty(&nested);

        cache.insert("key", json!(1)).expect("Insert should succeed");

        assert!(nested.exists(), "Cache file should be created with its parents");
    }

    #[test]
    fn test_save_failure_propagates() {
        let temp_dir = TempDir::new().unwrap();
        // The backing path is a directory, so the write must fail
        let mut cache = JsonCache::empty(temp_dir.path());

        let result = cache.insert("key", json!(1));
        assert!(matches!(result, Err(CacheError::Io { .. })));
    }
}
