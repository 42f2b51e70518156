//! Key-Value Persistence
//!
//! Async string store used by the snapshot cache and the selection state.
//! `FileStore` keeps one file per key; `MemoryStore` backs tests.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{SyncError, SyncResult};

/// Core persistence trait
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> SyncResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> SyncResult<()>;

    /// Removing a missing key is not an error
    async fn remove(&self, key: &str) -> SyncResult<()>;
}

fn io_error(path: &Path, e: std::io::Error) -> SyncError {
    SyncError::CacheIo(format!("{}: {}", path.display(), e))
}

/// One JSON file per key under a directory
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Keys contain `::` and provider URLs, so file names are their digest
    fn path_for(&self, key: &str) -> PathBuf {
        let digest = blake3::hash(key.as_bytes());
        self.dir.join(format!("{}.json", digest.to_hex()))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> SyncResult<Option<String>> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> SyncResult<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error(&self.dir, e))?;

        // Write-then-rename so a reader never sees a half-written entry
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value)
            .await
            .map_err(|e| io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| io_error(&path, e))
    }

    async fn remove(&self, key: &str) -> SyncResult<()> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&path, e)),
        }
    }
}

/// In-process store
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> SyncResult<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> SyncResult<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> SyncResult<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("cache"));

        assert_eq!(store.get("a::b").await.unwrap(), None);

        store.set("a::b", "{\"x\":1}").await.unwrap();
        assert_eq!(store.get("a::b").await.unwrap().as_deref(), Some("{\"x\":1}"));

        store.set("a::b", "2").await.unwrap();
        assert_eq!(store.get("a::b").await.unwrap().as_deref(), Some("2"));

        store.remove("a::b").await.unwrap();
        assert_eq!(store.get("a::b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_remove_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.remove("never-written").await.expect("remove missing key");
    }

    #[tokio::test]
    async fn test_file_store_keys_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.set("github::1", "one").await.unwrap();
        store.set("gitee::1", "two").await.unwrap();

        assert_eq!(store.get("github::1").await.unwrap().as_deref(), Some("one"));
        assert_eq!(store.get("gitee::1").await.unwrap().as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_file_store_unwritable_dir_errors() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file, not a dir").unwrap();

        let store = FileStore::new(blocker.join("cache"));
        let err = store.set("k", "v").await.unwrap_err();
        assert!(matches!(err, SyncError::CacheIo(_)));
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryStore::new();
        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        store.remove("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }
}
