//! Selected Space
//!
//! The user's current space is a single persisted string. An unset, unparsable
//! or stale id falls back to the first space in tree order.

use std::sync::Arc;

use super::store::KeyValueStore;
use crate::domain::{RecordId, SpaceWithCollections};

pub const SELECTED_SPACE_KEY: &str = "tabshelf_selected_space_id";

pub struct SelectionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SelectionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Raw persisted value; read failures count as unset
    pub async fn load(&self) -> Option<String> {
        match self.store.get(SELECTED_SPACE_KEY).await {
            Ok(value) => value,
            Err(e) => {
                log::warn!("failed to read selected space: {}", e);
                None
            }
        }
    }

    pub async fn save(&self, space_id: RecordId) {
        if let Err(e) = self
            .store
            .set(SELECTED_SPACE_KEY, &space_id.to_string())
            .await
        {
            log::warn!("failed to persist selected space: {}", e);
        }
    }
}

/// Space matching `stored`, or the first space when it is unset or gone
pub fn resolve_selected<'a>(
    tree: &'a [SpaceWithCollections],
    stored: Option<&str>,
) -> Option<&'a SpaceWithCollections> {
    let wanted = stored.and_then(|s| s.trim().parse::<RecordId>().ok());
    wanted
        .and_then(|id| tree.iter().find(|s| s.space.id == id))
        .or_else(|| tree.first())
}
