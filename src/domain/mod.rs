//! Domain Layer
//!
//! Snapshot records as they arrive on the wire, the derived tree views and the
//! error taxonomy. Nothing here performs I/O.

mod entity;
mod error;
mod records;
mod snapshot;
mod view;
pub(crate) mod wire;

pub use entity::{index_by_id, Entity, RecordId};
pub use error::{FetchErrorKind, SyncError, SyncResult};
pub use records::{Card, Collection, Favicon, Label, Space};
pub use snapshot::{BlobName, BlobSet, SyncData};
pub use view::{CollectionWithCards, SpaceWithCollections};
