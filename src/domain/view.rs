//! Derived tree types handed to presentation

use serde::Serialize;

use super::records::{Card, Collection, Label, Space};

/// A collection with its sorted cards and resolved labels
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionWithCards {
    #[serde(flatten)]
    pub collection: Collection,
    pub cards: Vec<Card>,
    pub labels: Vec<Label>,
}

/// A space with its sorted collections
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpaceWithCollections {
    #[serde(flatten)]
    pub space: Space,
    pub collections: Vec<CollectionWithCards>,
}

impl SpaceWithCollections {
    /// All cards of the space in tree order
    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.collections.iter().flat_map(|c| c.cards.iter())
    }

    pub fn card_count(&self) -> usize {
        self.collections.iter().map(|c| c.cards.len()).sum()
    }
}
