//! Repository Layer
//!
//! Local persistence: key-value stores, the snapshot cache and the selected space.

mod cache;
mod selection;
mod store;

pub use cache::{system_clock, Clock, SnapshotCache};
pub use selection::{resolve_selected, SelectionStore, SELECTED_SPACE_KEY};
pub use store::{FileStore, KeyValueStore, MemoryStore};
