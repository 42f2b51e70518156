//! Snapshot Cache
//!
//! Best-effort local copy of the last enriched snapshot. Reads degrade to a miss
//! and writes/invalidations swallow store failures; the cache is never a
//! correctness dependency.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::store::KeyValueStore;
use crate::config::Credentials;
use crate::domain::SyncData;

/// Millisecond wall clock; injectable for staleness tests
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(|| chrono::Utc::now().timestamp_millis())
}

#[derive(Deserialize)]
struct CacheEntry {
    data: SyncData,
    timestamp: i64,
}

#[derive(Serialize)]
struct CacheEntryRef<'a> {
    data: &'a SyncData,
    timestamp: i64,
}

pub struct SnapshotCache {
    store: Arc<dyn KeyValueStore>,
    max_age: Duration,
    clock: Clock,
}

impl SnapshotCache {
    pub fn new(store: Arc<dyn KeyValueStore>, max_age: Duration) -> Self {
        Self {
            store,
            max_age,
            clock: system_clock(),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// One slot per provider endpoint, container and token
    pub fn key(credentials: &Credentials) -> String {
        format!("tabshelf_snapshot::{}", credentials.scope_key())
    }

    fn is_fresh(&self, timestamp: i64) -> bool {
        let age = (self.clock)().saturating_sub(timestamp);
        let max_age = i64::try_from(self.max_age.as_millis()).unwrap_or(i64::MAX);
        age < max_age
    }

    /// Cached snapshot if present, parsable and younger than `max_age`
    pub async fn read(&self, credentials: &Credentials) -> Option<SyncData> {
        let key = Self::key(credentials);
        let json = match self.store.get(&key).await {
            Ok(Some(json)) => json,
            Ok(None) => {
                log::debug!("snapshot cache miss: no entry");
                return None;
            }
            Err(e) => {
                log::warn!("snapshot cache read failed, treating as miss: {}", e);
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&json) {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("snapshot cache entry unparsable, treating as miss: {}", e);
                return None;
            }
        };

        if !self.is_fresh(entry.timestamp) {
            log::debug!("snapshot cache miss: entry from {} is stale", entry.timestamp);
            return None;
        }

        log::debug!(
            "snapshot cache hit: {} cards from {}",
            entry.data.cards.len(),
            entry.timestamp
        );
        Some(entry.data)
    }

    /// Persist `data` stamped with the current time
    pub async fn write(&self, credentials: &Credentials, data: &SyncData) {
        let entry = CacheEntryRef {
            data,
            timestamp: (self.clock)(),
        };
        let json = match serde_json::to_string(&entry) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("snapshot cache serialize failed: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.set(&Self::key(credentials), &json).await {
            log::warn!("snapshot cache write failed: {}", e);
        }
    }

    pub async fn invalidate(&self, credentials: &Credentials) {
        if let Err(e) = self.store.remove(&Self::key(credentials)).await {
            log::warn!("snapshot cache invalidate failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Provider;
    use crate::domain::{Card, Space, SyncError, SyncResult};
    use crate::repository::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicI64, Ordering};

    const HOUR_MS: i64 = 60 * 60 * 1000;

    fn creds() -> Credentials {
        Credentials::new(Provider::Github, "gist", "token")
    }

    fn sample() -> SyncData {
        let mut card = Card::new(1, 10, "百度", "https://baidu.com");
        card.favicon = Some("https://icons/baidu.png".to_string());
        SyncData {
            spaces: vec![Space::new(1, "Home", 0.0)],
            cards: vec![card],
            ..Default::default()
        }
    }

    fn cache_at(store: Arc<dyn KeyValueStore>, now: Arc<AtomicI64>) -> SnapshotCache {
        SnapshotCache::new(store, Duration::from_secs(3600))
            .with_clock(Arc::new(move || now.load(Ordering::SeqCst)))
    }

    #[tokio::test]
    async fn test_write_then_read_returns_same_value() {
        let now = Arc::new(AtomicI64::new(1_000_000));
        let cache = cache_at(Arc::new(MemoryStore::new()), now.clone());

        cache.write(&creds(), &sample()).await;
        now.fetch_add(HOUR_MS - 1, Ordering::SeqCst);

        assert_eq!(cache.read(&creds()).await, Some(sample()));
    }

    #[tokio::test]
    async fn test_read_after_max_age_misses() {
        let now = Arc::new(AtomicI64::new(1_000_000));
        let cache = cache_at(Arc::new(MemoryStore::new()), now.clone());

        cache.write(&creds(), &sample()).await;
        now.fetch_add(HOUR_MS, Ordering::SeqCst);

        assert_eq!(cache.read(&creds()).await, None);
    }

    #[tokio::test]
    async fn test_invalidate_then_read_misses() {
        let now = Arc::new(AtomicI64::new(1_000_000));
        let cache = cache_at(Arc::new(MemoryStore::new()), now);

        cache.write(&creds(), &sample()).await;
        cache.invalidate(&creds()).await;

        assert_eq!(cache.read(&creds()).await, None);
    }

    #[tokio::test]
    async fn test_credentials_do_not_share_slot() {
        let now = Arc::new(AtomicI64::new(0));
        let cache = cache_at(Arc::new(MemoryStore::new()), now);

        cache.write(&creds(), &sample()).await;

        let other_token = Credentials::new(Provider::Github, "gist", "other");
        let other_provider = Credentials::new(Provider::Gitee, "gist", "token");
        assert_eq!(cache.read(&other_token).await, None);
        assert_eq!(cache.read(&other_provider).await, None);
    }

    #[tokio::test]
    async fn test_unparsable_entry_is_miss() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(&SnapshotCache::key(&creds()), "not json")
            .await
            .unwrap();
        let cache = cache_at(store, Arc::new(AtomicI64::new(0)));

        assert_eq!(cache.read(&creds()).await, None);
    }

    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> SyncResult<Option<String>> {
            Err(SyncError::CacheIo("disk gone".to_string()))
        }

        async fn set(&self, _key: &str, _value: &str) -> SyncResult<()> {
            Err(SyncError::CacheIo("disk gone".to_string()))
        }

        async fn remove(&self, _key: &str) -> SyncResult<()> {
            Err(SyncError::CacheIo("disk gone".to_string()))
        }
    }

    #[tokio::test]
    async fn test_store_failures_are_swallowed() {
        let cache = cache_at(Arc::new(BrokenStore), Arc::new(AtomicI64::new(0)));

        cache.write(&creds(), &sample()).await;
        cache.invalidate(&creds()).await;
        assert_eq!(cache.read(&creds()).await, None);
    }
}
