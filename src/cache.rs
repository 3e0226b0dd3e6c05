use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::clock::Clock;

pub const DEFAULT_TTL_HOURS: i64 = 24;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub timestamp: DateTime<Utc>,
    pub payload: T,
}

/// Key/value cache whose entries expire `ttl` after being written.
///
/// Expiry is enforced when reading: a stale entry is reported as a miss but
/// stays in the map (and on disk) until the same key is written again.
/// When backed by a file, the whole map is rewritten after every `put`.
/// There is no cross-process locking, so two writers can lose each
/// other's entries; callers only use this for results that can be refetched.
pub struct TtlCache<T> {
    path: Option<PathBuf>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
}

impl<T> TtlCache<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync,
{
    pub fn in_memory(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: None,
            ttl,
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Opens a file-backed cache. A missing or unreadable file starts empty.
    pub async fn open(path: impl AsRef<Path>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match Self::load(&path).await {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("starting with an empty cache for {}: {:#}", path.display(), e);
                HashMap::new()
            }
        };
        log::info!("loaded {} cache entries from {}", entries.len(), path.display());

        Self {
            path: Some(path),
            ttl,
            clock,
            entries: RwLock::new(entries),
        }
    }

    async fn load(path: &Path) -> Result<HashMap<String, CacheEntry<T>>> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Ok(HashMap::new());
        }
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub async fn get(&self, key: &str) -> Option<T> {
        let now = self.clock.now();
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| now - entry.timestamp < self.ttl)
            .map(|entry| entry.payload.clone())
    }

    pub async fn put(&self, key: &str, payload: T) -> Result<()> {
        let entry = CacheEntry {
            timestamp: self.clock.now(),
            payload,
        };

        let snapshot = {
            let mut entries = self.entries.write().await;
            entries.insert(key.to_string(), entry);
            match &self.path {
                Some(_) => Some(
                    serde_json::to_string_pretty(&*entries).context("failed to encode cache")?,
                ),
                None => None,
            }
        };

        if let (Some(path), Some(json)) = (&self.path, snapshot) {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        Ok(())
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn ttl() -> Duration {
        Duration::hours(DEFAULT_TTL_HOURS)
    }

    #[tokio::test]
    async fn entries_expire_after_ttl_but_are_kept() {
        let clock = Arc::new(ManualClock::default());
        let cache: TtlCache<Vec<String>> = TtlCache::in_memory(ttl(), clock.clone());

        cache.put("acme||", vec!["a".into()]).await.unwrap();
        clock.advance(Duration::hours(23) + Duration::minutes(59));
        assert_eq!(cache.get("acme||").await, Some(vec!["a".to_string()]));

        clock.advance(Duration::minutes(1));
        assert_eq!(cache.get("acme||").await, None);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn rewriting_a_key_refreshes_it() {
        let clock = Arc::new(ManualClock::default());
        let cache: TtlCache<u32> = TtlCache::in_memory(ttl(), clock.clone());

        cache.put("k", 1).await.unwrap();
        clock.advance(Duration::hours(25));
        assert_eq!(cache.get("k").await, None);

        cache.put("k", 2).await.unwrap();
        assert_eq!(cache.get("k").await, Some(2));
    }

    #[tokio::test]
    async fn file_cache_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.json");
        let clock = Arc::new(ManualClock::default());

        let cache: TtlCache<String> = TtlCache::open(&path, ttl(), clock.clone()).await;
        assert!(cache.is_empty().await);
        cache.put("stripe", "payload".to_string()).await.unwrap();

        let reopened: TtlCache<String> = TtlCache::open(&path, ttl(), clock.clone()).await;
        assert_eq!(reopened.get("stripe").await, Some("payload".to_string()));

        clock.advance(Duration::hours(24));
        assert_eq!(reopened.get("stripe").await, None);
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "{not json").unwrap();

        let cache: TtlCache<String> =
            TtlCache::open(&path, ttl(), Arc::new(ManualClock::default())).await;
        assert!(cache.is_empty().await);
    }
}
