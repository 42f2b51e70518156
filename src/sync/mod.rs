//! Sync Layer
//!
//! Remote fetch, payload decoding, favicon enrichment and request coalescing.

mod coalesce;
mod codec;
mod favicon;
mod orchestrator;
mod remote;

pub use coalesce::{CoalesceKey, CoalescedSync, RequestCoalescer, RequestKind};
pub use codec::{compress, decode_snapshot, decompress, encode_snapshot};
pub use favicon::FaviconServices;
pub use orchestrator::SyncOrchestrator;
pub use remote::{GistSource, SnapshotSource};
