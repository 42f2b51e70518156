//! Flat snapshot and its compressed on-the-wire form

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::records::{Card, Collection, Favicon, Label, Space};

/// One complete flat fetch result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncData {
    #[serde(default)]
    pub spaces: Vec<Space>,
    #[serde(default)]
    pub collections: Vec<Collection>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub favicons: Vec<Favicon>,
}

/// The five fixed payload names inside a blob container
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BlobName {
    Spaces,
    Collections,
    Labels,
    Cards,
    Favicons,
}

impl BlobName {
    pub const ALL: [BlobName; 5] = [
        BlobName::Spaces,
        BlobName::Collections,
        BlobName::Labels,
        BlobName::Cards,
        BlobName::Favicons,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlobName::Spaces => "spaces",
            BlobName::Collections => "collections",
            BlobName::Labels => "labels",
            BlobName::Cards => "cards",
            BlobName::Favicons => "favicons",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        BlobName::ALL.into_iter().find(|b| b.as_str() == name)
    }
}

/// Compressed payloads keyed by blob name. Missing names mean "empty".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlobSet {
    payloads: BTreeMap<BlobName, String>,
}

impl BlobSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: BlobName, payload: String) {
        self.payloads.insert(name, payload);
    }

    pub fn get(&self, name: BlobName) -> Option<&str> {
        self.payloads.get(&name).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    /// Keep only the five known names out of an arbitrary file map
    pub fn from_files<I>(files: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut set = Self::new();
        for (name, payload) in files {
            if let Some(blob) = BlobName::parse(&name) {
                set.insert(blob, payload);
            }
        }
        set
    }
}
