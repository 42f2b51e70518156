//! Sync Orchestrator
//!
//! cache read -> (miss) fetch -> decode -> favicon enrichment -> cache write.
//! Holds no state between calls apart from what the cache persists.

use std::sync::Arc;

use super::codec::decode_snapshot;
use super::favicon::FaviconServices;
use super::remote::SnapshotSource;
use crate::config::Credentials;
use crate::domain::{SyncData, SyncResult};
use crate::repository::SnapshotCache;

pub struct SyncOrchestrator {
    source: Arc<dyn SnapshotSource>,
    cache: SnapshotCache,
    favicons: FaviconServices,
}

impl SyncOrchestrator {
    pub fn new(source: Arc<dyn SnapshotSource>, cache: SnapshotCache, favicons: FaviconServices) -> Self {
        Self {
            source,
            cache,
            favicons,
        }
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    /// Current snapshot: the cached copy while fresh, otherwise a new fetch.
    ///
    /// Cached snapshots were enriched before they were written and are returned as is.
    pub async fn get_snapshot(&self, credentials: &Credentials) -> SyncResult<SyncData> {
        if let Some(data) = self.cache.read(credentials).await {
            return Ok(data);
        }
        self.fetch_fresh(credentials).await
    }

    /// Drop the cached copy and fetch again
    pub async fn refresh(&self, credentials: &Credentials) -> SyncResult<SyncData> {
        log::info!("manual refresh of {}", credentials.blob_id);
        self.cache.invalidate(credentials).await;
        self.fetch_fresh(credentials).await
    }

    async fn fetch_fresh(&self, credentials: &Credentials) -> SyncResult<SyncData> {
        let blobs = self.source.fetch_blobs(credentials).await.map_err(|e| {
            log::warn!("snapshot fetch failed: {}", e);
            e
        })?;

        let mut data = decode_snapshot(&blobs).map_err(|e| {
            log::warn!("snapshot rejected: {}", e);
            e
        })?;
        self.favicons.enrich(&mut data);

        log::info!(
            "snapshot ready: {} spaces, {} collections, {} cards",
            data.spaces.len(),
            data.collections.len(),
            data.cards.len()
        );

        self.cache.write(credentials, &data).await;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Provider;
    use crate::domain::{BlobName, BlobSet, Card, FetchErrorKind, Space, SyncError};
    use crate::repository::{KeyValueStore, MemoryStore};
    use crate::sync::codec::{compress, encode_snapshot};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct FakeSource {
        response: Mutex<SyncResult<BlobSet>>,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn new(response: SyncResult<BlobSet>) -> Arc<Self> {
            Arc::new(Self {
                response: Mutex::new(response),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SnapshotSource for FakeSource {
        async fn fetch_blobs(&self, _credentials: &Credentials) -> SyncResult<BlobSet> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.lock().unwrap().clone()
        }
    }

    fn creds() -> Credentials {
        Credentials::new(Provider::Github, "gist", "token")
    }

    fn snapshot() -> SyncData {
        SyncData {
            spaces: vec![Space::new(1, "Home", 0.0)],
            cards: vec![Card::new(1, 1, "Rust", "https://www.rust-lang.org/learn")],
            ..Default::default()
        }
    }

    fn orchestrator(source: Arc<FakeSource>, store: Arc<MemoryStore>) -> SyncOrchestrator {
        SyncOrchestrator::new(
            source,
            SnapshotCache::new(store, Duration::from_secs(3600)),
            FaviconServices::new("https://proxy/", "https://icons/s2"),
        )
    }

    #[tokio::test]
    async fn test_miss_fetches_enriches_and_caches() {
        let source = FakeSource::new(encode_snapshot(&snapshot()));
        let sync = orchestrator(source.clone(), Arc::new(MemoryStore::new()));

        let data = sync.get_snapshot(&creds()).await.unwrap();
        assert_eq!(source.calls(), 1);
        assert_eq!(
            data.cards[0].favicon.as_deref(),
            Some("https://icons/s2?domain=www%2Erust%2Dlang%2Eorg&sz=32")
        );

        let cached = sync.cache().read(&creds()).await.unwrap();
        assert_eq!(cached, data);
    }

    #[tokio::test]
    async fn test_hit_skips_network() {
        let source = FakeSource::new(encode_snapshot(&snapshot()));
        let sync = orchestrator(source.clone(), Arc::new(MemoryStore::new()));

        let first = sync.get_snapshot(&creds()).await.unwrap();
        let second = sync.get_snapshot(&creds()).await.unwrap();

        assert_eq!(source.calls(), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_refresh_bypasses_cache() {
        let source = FakeSource::new(encode_snapshot(&snapshot()));
        let sync = orchestrator(source.clone(), Arc::new(MemoryStore::new()));

        sync.get_snapshot(&creds()).await.unwrap();
        sync.refresh(&creds()).await.unwrap();

        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_fetch_error_propagates_and_caches_nothing() {
        let store = Arc::new(MemoryStore::new());
        let source = FakeSource::new(Err(SyncError::fetch(FetchErrorKind::Unauthorized, "401")));
        let sync = orchestrator(source, store.clone());

        let err = sync.get_snapshot(&creds()).await.unwrap_err();
        assert_eq!(err.fetch_kind(), Some(FetchErrorKind::Unauthorized));
        assert_eq!(store.get(&SnapshotCache::key(&creds())).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_malformed_blob_rejects_fetch() {
        let mut blobs = encode_snapshot(&snapshot()).unwrap();
        blobs.insert(BlobName::Labels, compress("{\"not\": \"an array\"}"));
        let sync = orchestrator(FakeSource::new(Ok(blobs)), Arc::new(MemoryStore::new()));

        let err = sync.get_snapshot(&creds()).await.unwrap_err();
        assert!(matches!(err, SyncError::MalformedSnapshot { ref blob, .. } if blob == "labels"));
        assert_eq!(sync.cache().read(&creds()).await, None);
    }
}
