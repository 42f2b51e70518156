//! TabShelf Core
//!
//! Read-only sync, tree and search core for a Spaces -> Collections -> Cards
//! bookmark snapshot.
//!
//! Layered architecture:
//! - domain: Records, derived tree types and errors
//! - repository: Local persistence (key-value store, snapshot cache, selection)
//! - sync: Remote fetch, decoding, favicon enrichment, request coalescing
//! - tree: Flat records -> display tree
//! - search: Fuzzy search with pinyin projection
//! - session: Caller-facing state tying it all together

pub mod config;
pub mod domain;
pub mod repository;
pub mod search;
pub mod session;
pub mod sync;
pub mod tree;

use std::path::Path;

pub use config::{load_config, save_config, Credentials, Provider, SyncConfig};
pub use domain::{
    Card, Collection, CollectionWithCards, Favicon, FetchErrorKind, Label, Space,
    SpaceWithCollections, SyncData, SyncError, SyncResult,
};
pub use session::BookmarkSession;

pub const APP_NAME: &str = "TabShelf";

/// Install the rolling file logger. Uses `config.log_dir`, or `<data_dir>/logs`.
pub fn init_logging(config: &SyncConfig, data_dir: &Path) -> Result<(), rolling_logger::LoggerError> {
    let log_dir = config
        .log_dir
        .clone()
        .unwrap_or_else(|| data_dir.join("logs"));
    rolling_logger::init_logger(log_dir, APP_NAME)?;
    let _ = rolling_logger::info(&format!("{} core {} started", APP_NAME, env!("CARGO_PKG_VERSION")));
    Ok(())
}
