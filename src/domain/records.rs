//! Snapshot Records
//!
//! Flat relational rows as stored in the remote blob container. Parents are
//! referenced by id (`space_id`, `collection_id`, `label_ids`, `favicon_id`).

use serde::{Deserialize, Serialize};

use super::entity::{Entity, RecordId};
use super::wire;

/// Top-level grouping, root of the tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    pub id: RecordId,
    #[serde(default, deserialize_with = "wire::string")]
    pub title: String,
    #[serde(default, deserialize_with = "wire::order")]
    pub order: f64,
    #[serde(
        default,
        deserialize_with = "wire::optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub icon: Option<String>,
}

impl Space {
    pub fn new(id: RecordId, title: &str, order: f64) -> Self {
        Self {
            id,
            title: title.to_string(),
            order,
            icon: None,
        }
    }
}

impl Entity for Space {
    fn id(&self) -> RecordId {
        self.id
    }
}

/// A group of cards inside one space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: RecordId,
    #[serde(default, deserialize_with = "wire::string")]
    pub title: String,
    #[serde(default, deserialize_with = "wire::optional_id")]
    pub space_id: Option<RecordId>,
    #[serde(default, deserialize_with = "wire::order")]
    pub order: f64,
    #[serde(default, deserialize_with = "wire::id_list")]
    pub label_ids: Vec<RecordId>,
}

impl Collection {
    pub fn new(id: RecordId, title: &str, space_id: RecordId, order: f64) -> Self {
        Self {
            id,
            title: title.to_string(),
            space_id: Some(space_id),
            order,
            label_ids: Vec::new(),
        }
    }
}

impl Entity for Collection {
    fn id(&self) -> RecordId {
        self.id
    }
}

/// A label attached to collections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: RecordId,
    #[serde(default, deserialize_with = "wire::string")]
    pub title: String,
    /// Color (hex, e.g., "#FF5733")
    #[serde(default, deserialize_with = "wire::string")]
    pub color: String,
}

impl Label {
    pub fn new(id: RecordId, title: &str, color: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            color: color.to_string(),
        }
    }
}

impl Entity for Label {
    fn id(&self) -> RecordId {
        self.id
    }
}

/// A saved tab
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: RecordId,
    #[serde(default, deserialize_with = "wire::string")]
    pub title: String,
    #[serde(
        default,
        deserialize_with = "wire::optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub custom_title: Option<String>,
    #[serde(
        default,
        deserialize_with = "wire::optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub custom_description: Option<String>,
    #[serde(default, deserialize_with = "wire::string")]
    pub url: String,
    #[serde(default, deserialize_with = "wire::string")]
    pub description: String,
    #[serde(default, deserialize_with = "wire::optional_id")]
    pub collection_id: Option<RecordId>,
    #[serde(default, deserialize_with = "wire::order")]
    pub order: f64,
    #[serde(
        default,
        deserialize_with = "wire::optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub favicon_id: Option<RecordId>,
    /// Inline icon on the wire; the resolved display icon after enrichment
    #[serde(
        default,
        deserialize_with = "wire::optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub favicon: Option<String>,
}

impl Card {
    pub fn new(id: RecordId, collection_id: RecordId, title: &str, url: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            custom_title: None,
            custom_description: None,
            url: url.to_string(),
            description: String::new(),
            collection_id: Some(collection_id),
            order: 0.0,
            favicon_id: None,
            favicon: None,
        }
    }

    /// `custom_title` when the user set one, otherwise the page title
    pub fn effective_title(&self) -> &str {
        match self.custom_title.as_deref() {
            Some(t) if !t.trim().is_empty() => t,
            _ => &self.title,
        }
    }

    pub fn effective_description(&self) -> &str {
        match self.custom_description.as_deref() {
            Some(d) if !d.trim().is_empty() => d,
            _ => &self.description,
        }
    }
}

impl Entity for Card {
    fn id(&self) -> RecordId {
        self.id
    }
}

/// Favicon lookup table entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favicon {
    pub id: RecordId,
    #[serde(default, deserialize_with = "wire::string")]
    pub url: String,
}

impl Entity for Favicon {
    fn id(&self) -> RecordId {
        self.id
    }
}
