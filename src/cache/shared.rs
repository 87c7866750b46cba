//! Shared Cache Module
//!
//! Cloneable handle to one `CacheStore` guarded by a `FairRwLock`. Lookups
//! take the shared side; insertion and eviction take the exclusive side.

use std::sync::Arc;

use crate::cache::{Admission, CacheEntry, CacheStats, CacheStore, FairRwLock};

// == Shared Cache ==
/// Thread-safe cache handle shared by every worker.
#[derive(Debug, Clone)]
pub struct SharedCache {
    inner: Arc<FairRwLock<CacheStore>>,
}

impl SharedCache {
    // == Constructor ==
    /// Creates a cache with the given aggregate budget and per-object ceiling.
    pub fn new(max_cache_size: usize, max_object_size: usize) -> Self {
        Self::from_store(CacheStore::new(max_cache_size, max_object_size))
    }

    /// Wraps an existing store.
    pub fn from_store(store: CacheStore) -> Self {
        Self {
            inner: Arc::new(FairRwLock::new(store)),
        }
    }

    // == Try Get ==
    /// Returns a copy of the payload cached under `uri`, if any.
    ///
    /// Check and copy happen in one critical section, so the entry cannot be
    /// evicted between finding it and reading it.
    ///
    /// Runs under the shared side of the lock and ages entries with atomics,
    /// so concurrent hits may interleave their aging passes. Eviction order
    /// is then only approximately least-recently-used.
    pub async fn try_get(&self, uri: &str) -> Option<Vec<u8>> {
        self.inner.read().await.get(uri)
    }

    /// Returns true if `uri` is cached. Prefer `try_get` when the payload is
    /// needed: the answer may be stale as soon as the lock is released.
    pub async fn contains(&self, uri: &str) -> bool {
        self.inner.read().await.contains(uri)
    }

    // == Admit ==
    /// Evicts as needed and inserts `payload`, holding the write lock for the
    /// whole sequence.
    pub async fn admit(&self, uri: String, payload: Vec<u8>) -> Admission {
        self.inner.write().await.admit(uri, payload)
    }

    /// Inserts without evicting. See `CacheStore::insert`.
    pub async fn insert(&self, uri: String, payload: Vec<u8>) -> bool {
        self.inner.write().await.insert(uri, payload)
    }

    /// Removes the least recently used entry.
    ///
    /// # Panics
    /// Panics if the cache is empty.
    pub async fn evict_one(&self) -> CacheEntry {
        self.inner.write().await.evict_one()
    }

    /// Statistics snapshot.
    pub async fn stats(&self) -> CacheStats {
        self.inner.read().await.stats()
    }

    pub async fn total_size(&self) -> usize {
        self.inner.read().await.total_size()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn max_cache_size(&self) -> usize {
        self.inner.read().await.max_cache_size()
    }
}
