//! Request Coalescing
//!
//! Overlapping calls for the same key share one in-flight future. Every joined
//! caller receives a clone of the same result or the same error.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;

use super::orchestrator::SyncOrchestrator;
use crate::config::Credentials;
use crate::domain::{SyncData, SyncResult};

type InFlight<V> = Shared<BoxFuture<'static, SyncResult<V>>>;

pub struct RequestCoalescer<K, V> {
    in_flight: Mutex<HashMap<K, (u64, InFlight<V>)>>,
    next_ticket: AtomicU64,
}

impl<K, V> Default for RequestCoalescer<K, V> {
    fn default() -> Self {
        Self {
            in_flight: Mutex::new(HashMap::new()),
            next_ticket: AtomicU64::new(0),
        }
    }
}

impl<K, V> RequestCoalescer<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the request already running for `key`, or start one with `make`.
    ///
    /// `make` is only called when nothing is in flight for `key`.
    pub async fn run<F, Fut>(&self, key: K, make: F) -> SyncResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = SyncResult<V>> + Send + 'static,
    {
        let (ticket, shared) = {
            let mut in_flight = self.in_flight.lock().await;
            match in_flight.get(&key) {
                Some((ticket, shared)) => (*ticket, shared.clone()),
                None => {
                    let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
                    let shared = make().boxed().shared();
                    in_flight.insert(key.clone(), (ticket, shared.clone()));
                    (ticket, shared)
                }
            }
        };

        let result = shared.await;

        // A newer request may already own the slot
        let mut in_flight = self.in_flight.lock().await;
        if matches!(in_flight.get(&key), Some((t, _)) if *t == ticket) {
            in_flight.remove(&key);
        }
        result
    }

    pub async fn in_flight(&self) -> usize {
        self.in_flight.lock().await.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Snapshot,
    Refresh,
}

/// (providerId, blobId, credentialsHash) plus the kind of request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CoalesceKey {
    pub provider_id: String,
    pub blob_id: String,
    pub credentials_hash: String,
    pub kind: RequestKind,
}

impl CoalesceKey {
    pub fn new(credentials: &Credentials, kind: RequestKind) -> Self {
        Self {
            provider_id: credentials.provider_id(),
            blob_id: credentials.blob_id.clone(),
            credentials_hash: credentials.token_hash(),
            kind,
        }
    }
}

/// [`SyncOrchestrator`] behind a coalescer; what UI-facing callers hold
pub struct CoalescedSync {
    inner: Arc<SyncOrchestrator>,
    requests: RequestCoalescer<CoalesceKey, Arc<SyncData>>,
}

impl CoalescedSync {
    pub fn new(inner: SyncOrchestrator) -> Self {
        Self {
            inner: Arc::new(inner),
            requests: RequestCoalescer::new(),
        }
    }

    pub async fn get_snapshot(&self, credentials: &Credentials) -> SyncResult<Arc<SyncData>> {
        let key = CoalesceKey::new(credentials, RequestKind::Snapshot);
        let inner = self.inner.clone();
        let credentials = credentials.clone();
        self.requests
            .run(key, move || async move {
                inner.get_snapshot(&credentials).await.map(Arc::new)
            })
            .await
    }

    /// Refreshes coalesce with each other but never with plain snapshot reads
    pub async fn refresh(&self, credentials: &Credentials) -> SyncResult<Arc<SyncData>> {
        let key = CoalesceKey::new(credentials, RequestKind::Refresh);
        let inner = self.inner.clone();
        let credentials = credentials.clone();
        self.requests
            .run(key, move || async move {
                inner.refresh(&credentials).await.map(Arc::new)
            })
            .await
    }
}
