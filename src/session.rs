//! Bookmark Session
//!
//! Caller-facing state: the current snapshot, its tree, the selected space and
//! a search index over that space. Fetch or parse failures clear everything
//! and leave only the error, recoverable by another `load` or `refresh`.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::{Credentials, SyncConfig};
use crate::domain::{
    CollectionWithCards, RecordId, Space, SpaceWithCollections, SyncData, SyncError, SyncResult,
};
use crate::repository::{resolve_selected, FileStore, KeyValueStore, SelectionStore, SnapshotCache};
use crate::search::{PinyinTransliterator, SearchIndex, Transliterator};
use crate::sync::{CoalescedSync, FaviconServices, GistSource, SyncOrchestrator};
use crate::tree::{find_space, TreeMemo};

/// Sub-directory of the data dir holding cache and selection files
pub const STORE_DIR_NAME: &str = "store";

#[derive(Default)]
struct SessionState {
    memo: TreeMemo,
    snapshot: Option<Arc<SyncData>>,
    tree: Arc<Vec<SpaceWithCollections>>,
    selected: Option<RecordId>,
    index: Option<SearchIndex>,
    error: Option<SyncError>,
}

impl SessionState {
    fn selected_space(&self) -> Option<&SpaceWithCollections> {
        self.selected.and_then(|id| find_space(&self.tree, id))
    }

    fn rebuild_index(&mut self, transliterator: &dyn Transliterator, threshold: f64) {
        self.index = self
            .selected_space()
            .map(|space| SearchIndex::build(&space.collections, transliterator, threshold));
    }

    fn clear(&mut self) {
        self.snapshot = None;
        self.tree = Arc::default();
        self.selected = None;
        self.index = None;
    }
}

pub struct BookmarkSession {
    sync: CoalescedSync,
    selection: SelectionStore,
    transliterator: Arc<dyn Transliterator>,
    threshold: f64,
    state: Mutex<SessionState>,
}

impl BookmarkSession {
    pub fn new(
        sync: CoalescedSync,
        store: Arc<dyn KeyValueStore>,
        transliterator: Arc<dyn Transliterator>,
        threshold: f64,
    ) -> Self {
        Self {
            sync,
            selection: SelectionStore::new(store),
            transliterator,
            threshold,
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Production wiring: gist source, file-backed store under `data_dir`, pinyin search
    pub fn from_config(config: &SyncConfig, data_dir: &Path) -> SyncResult<Self> {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(data_dir.join(STORE_DIR_NAME)));
        let source = Arc::new(GistSource::new(config.http_timeout())?);
        let orchestrator = SyncOrchestrator::new(
            source,
            SnapshotCache::new(store.clone(), config.cache_max_age()),
            FaviconServices::from_config(config),
        );

        Ok(Self::new(
            CoalescedSync::new(orchestrator),
            store,
            Arc::new(PinyinTransliterator),
            config.search_threshold(),
        ))
    }

    /// Current snapshot (cache or network), then publish it
    pub async fn load(&self, credentials: &Credentials) -> SyncResult<()> {
        let result = self.sync.get_snapshot(credentials).await;
        self.publish(result).await
    }

    /// Manual refresh: bypasses the cache
    pub async fn refresh(&self, credentials: &Credentials) -> SyncResult<()> {
        let result = self.sync.refresh(credentials).await;
        self.publish(result).await
    }

    async fn publish(&self, result: SyncResult<Arc<SyncData>>) -> SyncResult<()> {
        let stored = self.selection.load().await;
        let mut state = self.state.lock().await;

        match result {
            Ok(data) => {
                let tree = state.memo.get_or_build(&data);
                state.selected = resolve_selected(&tree, stored.as_deref()).map(|s| s.space.id);
                state.tree = tree;
                state.snapshot = Some(data);
                state.error = None;
                state.rebuild_index(self.transliterator.as_ref(), self.threshold);
                if let Some(space) = state.selected_space() {
                    log::info!(
                        "space '{}' selected: {} cards indexed",
                        space.space.title,
                        space.card_count()
                    );
                }
                Ok(())
            }
            Err(e) => {
                log::warn!("session cleared after sync failure: {}", e);
                state.clear();
                state.error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Switch spaces; unknown ids are ignored and return `false`
    pub async fn select_space(&self, space_id: RecordId) -> bool {
        {
            let mut state = self.state.lock().await;
            if find_space(&state.tree, space_id).is_none() {
                log::debug!("ignoring selection of unknown space {}", space_id);
                return false;
            }
            state.selected = Some(space_id);
            state.rebuild_index(self.transliterator.as_ref(), self.threshold);
        }
        self.selection.save(space_id).await;
        true
    }

    pub async fn snapshot(&self) -> Option<Arc<SyncData>> {
        self.state.lock().await.snapshot.clone()
    }

    pub async fn tree(&self) -> Arc<Vec<SpaceWithCollections>> {
        self.state.lock().await.tree.clone()
    }

    /// Spaces in tree order, for the space picker
    pub async fn spaces(&self) -> Vec<Space> {
        let state = self.state.lock().await;
        state.tree.iter().map(|s| s.space.clone()).collect()
    }

    pub async fn selected_space(&self) -> Option<SpaceWithCollections> {
        self.state.lock().await.selected_space().cloned()
    }

    pub async fn last_error(&self) -> Option<SyncError> {
        self.state.lock().await.error.clone()
    }

    /// Cards of the selected space matching `query`, grouped by collection
    pub async fn search(&self, query: &str) -> Vec<CollectionWithCards> {
        let state = self.state.lock().await;
        match (state.selected_space(), &state.index) {
            (Some(space), Some(index)) => index.search_grouped(query, &space.collections),
            _ => Vec::new(),
        }
    }
}
