//! File-backed JSON cache with TTL expiry.
//!
//! Tool results (search responses, scraped pages) are cached as individual
//! JSON files keyed by a SHA-256 hash of the logical key. Entries carry a
//! creation timestamp and expire after the configured TTL; expired or
//! corrupted files are purged on read and treated as absent. Writes never
//! fail the caller.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// On-disk envelope for one cache entry.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    timestamp: DateTime<Utc>,
    value: Value,
}

/// A shared, TTL'd JSON file cache.
///
/// Safe for concurrent use by independent runs: every lookup touches an
/// independent file and the filesystem provides the only coordination.
pub struct FileCache {
    cache_dir: PathBuf,
    ttl: Duration,
}

impl FileCache {
    /// Create a cache rooted at `cache_dir` with the given TTL in hours.
    ///
    /// The directory is created eagerly; failure to create it is deferred
    /// to individual operations (which then behave as misses).
    pub fn new(cache_dir: impl Into<PathBuf>, ttl_hours: u64) -> Self {
        let cache_dir = cache_dir.into();
        if let Err(e) = std::fs::create_dir_all(&cache_dir) {
            tracing::warn!(dir = %cache_dir.display(), "failed to create cache dir: {e}");
        }
        Self {
            cache_dir,
            ttl: Duration::hours(ttl_hours as i64),
        }
    }

    fn cache_path(&self, key: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        self.cache_dir.join(format!("{:x}.json", hasher.finalize()))
    }

    /// Look up a value, returning `None` when absent, expired, or corrupted.
    pub async fn get(&self, key: &str) -> Option<Value> {
        let path = self.cache_path(key);
        let raw = tokio::fs::read_to_string(&path).await.ok()?;

        match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) if Utc::now() - entry.timestamp <= self.ttl => Some(entry.value),
            Ok(_) => {
                // Expired.
                remove_quietly(&path).await;
                None
            }
            Err(e) => {
                tracing::debug!(key, "purging corrupted cache entry: {e}");
                remove_quietly(&path).await;
                None
            }
        }
    }

    /// Store a value. Failures are logged and swallowed.
    pub async fn set(&self, key: &str, value: Value) {
        let path = self.cache_path(key);
        let entry = CacheEntry {
            timestamp: Utc::now(),
            value,
        };
        let serialized = match serde_json::to_string_pretty(&entry) {
            Ok(s) => s,
            Err(e) => {
                tracing::debug!(key, "failed to serialize cache entry: {e}");
                return;
            }
        };
        if let Err(e) = tokio::fs::write(&path, serialized).await {
            tracing::debug!(key, "failed to write cache entry: {e}");
        }
    }

    /// Whether a live entry exists for `key`.
    pub async fn exists(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }

    /// Remove one entry, or every entry when `key` is `None`.
    pub async fn clear(&self, key: Option<&str>) {
        match key {
            Some(key) => remove_quietly(&self.cache_path(key)).await,
            None => {
                let Ok(mut entries) = tokio::fs::read_dir(&self.cache_dir).await else {
                    return;
                };
                while let Ok(Some(entry)) = entries.next_entry().await {
                    let path = entry.path();
                    if path.extension().is_some_and(|ext| ext == "json") {
                        remove_quietly(&path).await;
                    }
                }
            }
        }
    }
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::debug!(path = %path.display(), "failed to remove cache file: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_cache(ttl_hours: u64) -> (tempfile::TempDir, FileCache) {
        let dir = tempfile::TempDir::new().unwrap();
        let cache = FileCache::new(dir.path(), ttl_hours);
        (dir, cache)
    }

    #[tokio::test]
    async fn round_trips_values() {
        let (_dir, cache) = temp_cache(24);
        cache.set("search:rust", json!({"results": [1, 2]})).await;
        let value = cache.get("search:rust").await.unwrap();
        assert_eq!(value["results"][1], 2);
        assert!(cache.exists("search:rust").await);
        assert!(!cache.exists("search:other").await);
    }

    #[tokio::test]
    async fn expired_entries_are_purged() {
        let (_dir, cache) = temp_cache(0);
        cache.set("k", json!("v")).await;
        // TTL of zero hours: the entry is stale as soon as any time passes.
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn corrupted_entries_are_treated_as_absent() {
        let (dir, cache) = temp_cache(24);
        cache.set("k", json!("v")).await;
        // Corrupt the single file on disk.
        let file = std::fs::read_dir(dir.path())
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
            .path();
        std::fs::write(&file, "{not json").unwrap();

        assert!(cache.get("k").await.is_none());
        assert!(!file.exists());
    }

    #[tokio::test]
    async fn clear_removes_entries() {
        let (_dir, cache) = temp_cache(24);
        cache.set("a", json!(1)).await;
        cache.set("b", json!(2)).await;
        cache.clear(Some("a")).await;
        assert!(cache.get("a").await.is_none());
        assert!(cache.get("b").await.is_some());
        cache.clear(None).await;
        assert!(cache.get("b").await.is_none());
    }
}
