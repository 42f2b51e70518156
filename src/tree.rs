//! Tree Builder
//!
//! Denormalizes the flat snapshot into Space -> Collection -> Card nesting.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{
    index_by_id, Card, Collection, CollectionWithCards, RecordId, SpaceWithCollections, SyncData,
};

/// Build the display tree.
///
/// Children are grouped by parent id in flat-sequence order, then stable-sorted by
/// `order`. Orphans (unknown parent id) are dropped, as are label ids with no label.
pub fn build_tree(data: &SyncData) -> Vec<SpaceWithCollections> {
    let labels = index_by_id(&data.labels);

    // Build parent -> children maps
    let mut collections_by_space: HashMap<RecordId, Vec<&Collection>> = HashMap::new();
    for collection in &data.collections {
        if let Some(space_id) = collection.space_id {
            collections_by_space.entry(space_id).or_default().push(collection);
        }
    }
    let mut cards_by_collection: HashMap<RecordId, Vec<&Card>> = HashMap::new();
    for card in &data.cards {
        if let Some(collection_id) = card.collection_id {
            cards_by_collection.entry(collection_id).or_default().push(card);
        }
    }

    let mut spaces: Vec<_> = data.spaces.iter().collect();
    spaces.sort_by(|a, b| a.order.total_cmp(&b.order));

    // `remove` so a duplicated parent id cannot list the same child twice
    spaces
        .into_iter()
        .map(|space| {
            let mut collections = collections_by_space.remove(&space.id).unwrap_or_default();
            collections.sort_by(|a, b| a.order.total_cmp(&b.order));

            let collections = collections
                .into_iter()
                .map(|collection| {
                    let mut cards = cards_by_collection
                        .remove(&collection.id)
                        .unwrap_or_default();
                    cards.sort_by(|a, b| a.order.total_cmp(&b.order));

                    CollectionWithCards {
                        collection: collection.clone(),
                        cards: cards.into_iter().cloned().collect(),
                        labels: collection
                            .label_ids
                            .iter()
                            .filter_map(|id| labels.get(id).map(|l| (*l).clone()))
                            .collect(),
                    }
                })
                .collect();

            SpaceWithCollections {
                space: space.clone(),
                collections,
            }
        })
        .collect()
}

pub fn find_space(tree: &[SpaceWithCollections], id: RecordId) -> Option<&SpaceWithCollections> {
    tree.iter().find(|s| s.space.id == id)
}

/// Reuses the last tree while the caller keeps handing in the same snapshot `Arc`
#[derive(Default)]
pub struct TreeMemo {
    last: Option<(Arc<SyncData>, Arc<Vec<SpaceWithCollections>>)>,
}

impl TreeMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(&mut self, data: &Arc<SyncData>) -> Arc<Vec<SpaceWithCollections>> {
        if let Some((source, tree)) = &self.last {
            if Arc::ptr_eq(source, data) {
                return tree.clone();
            }
        }
        let tree = Arc::new(build_tree(data));
        self.last = Some((data.clone(), tree.clone()));
        tree
    }
}
