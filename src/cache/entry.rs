//! Cache Entry Module
//!
//! Defines a single cached response and its recency counter.

use std::sync::atomic::{AtomicU64, Ordering};

// == Cache Entry ==
/// A cached response body keyed by request URI.
///
/// `recency` is 0 right after the entry is used and grows by one every time
/// another entry is read or a new entry is inserted. The entry with the
/// largest value is the least recently used one. The counter is atomic so
/// that concurrent readers holding the shared side of the cache lock can
/// age entries without exclusive access.
#[derive(Debug)]
pub struct CacheEntry {
    /// Request URI
    pub key: String,
    /// Response bytes as received from upstream
    pub payload: Vec<u8>,
    /// Accesses to other entries since this one was last used
    recency: AtomicU64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a fresh entry with recency 0.
    pub fn new(key: String, payload: Vec<u8>) -> Self {
        Self {
            key,
            payload,
            recency: AtomicU64::new(0),
        }
    }

    /// Byte length of the payload.
    pub fn size(&self) -> usize {
        self.payload.len()
    }

    /// Current recency counter.
    pub fn recency(&self) -> u64 {
        self.recency.load(Ordering::Acquire)
    }

    // == Touch ==
    /// Marks the entry as just used.
    pub(crate) fn touch(&self) {
        self.recency.store(0, Ordering::Release);
    }

    // == Age ==
    /// Records that some other entry was used.
    pub(crate) fn age(&self) {
        self.recency.fetch_add(1, Ordering::AcqRel);
    }

    #[cfg(test)]
    pub(crate) fn set_recency(&self, value: u64) {
        self.recency.store(value, Ordering::Release);
    }
}
