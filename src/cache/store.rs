//! Cache Store Module
//!
//! Size-bounded response cache with recency-based eviction. The store itself
//! is not synchronized: `&self` methods are safe under the shared side of
//! the cache lock and `&mut self` methods need the exclusive side (see
//! `SharedCache`).

use crate::cache::{CacheCounters, CacheEntry, CacheStats};

// == Admission Outcome ==
/// One entry removed while making room for a new object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eviction {
    pub key: String,
    pub size: usize,
    /// Cache size right after this eviction
    pub total_size_after: usize,
}

/// Result of `CacheStore::admit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Object stored; `evicted` lists what was removed first, in order.
    Admitted {
        evicted: Vec<Eviction>,
        total_size: usize,
    },
    /// Object exceeds the per-object ceiling; store untouched.
    TooLarge { size: usize },
}

// == Cache Store ==
/// Response cache keyed by request URI.
#[derive(Debug)]
pub struct CacheStore {
    /// Live entries in insertion order, oldest first
    entries: Vec<CacheEntry>,
    /// Sum of `entries[i].size()`
    total_size: usize,
    /// Aggregate byte budget
    max_cache_size: usize,
    /// Per-object admission ceiling
    max_object_size: usize,
    /// Hit / miss / eviction counters
    counters: CacheCounters,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store.
    ///
    /// # Arguments
    /// * `max_cache_size` - Aggregate byte budget
    /// * `max_object_size` - Largest payload that may be admitted
    ///
    /// # Panics
    /// Panics if `max_object_size > max_cache_size`, since such an object
    /// could never be made to fit.
    pub fn new(max_cache_size: usize, max_object_size: usize) -> Self {
        assert!(
            max_object_size <= max_cache_size,
            "max_object_size ({}) exceeds max_cache_size ({})",
            max_object_size,
            max_cache_size
        );
        Self {
            entries: Vec::new(),
            total_size: 0,
            max_cache_size,
            max_object_size,
            counters: CacheCounters::new(),
        }
    }

    // == Contains ==
    /// Returns true if a live entry is keyed by `key`. Does not age anything.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|entry| entry.key == key)
    }

    // == Get ==
    /// Returns a copy of the payload stored under `key`.
    ///
    /// On a hit the matched entry's recency is reset to 0 and every other
    /// entry ages by one. On a miss nothing is mutated.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let Some(hit) = self.entries.iter().position(|entry| entry.key == key) else {
            self.counters.record_miss();
            return None;
        };

        for (idx, entry) in self.entries.iter().enumerate() {
            if idx == hit {
                entry.touch();
            } else {
                entry.age();
            }
        }

        self.counters.record_hit();
        Some(self.entries[hit].payload.clone())
    }

    // == Insert ==
    /// Stores `payload` under `key` without enforcing the aggregate budget.
    ///
    /// Every existing entry ages by one and the new entry starts at 0. An
    /// entry already stored under `key` is replaced. Payloads larger than
    /// the per-object ceiling are refused and `false` is returned.
    pub fn insert(&mut self, key: String, payload: Vec<u8>) -> bool {
        if payload.len() > self.max_object_size {
            self.counters.record_rejection();
            return false;
        }

        self.remove(&key);

        for entry in &self.entries {
            entry.age();
        }

        self.total_size += payload.len();
        self.entries.push(CacheEntry::new(key, payload));
        true
    }

    // == Evict One ==
    /// Removes and returns the least recently used entry (largest recency).
    ///
    /// Among entries tied on the largest recency, the one inserted earliest
    /// goes first.
    ///
    /// # Panics
    /// Panics if the store is empty.
    pub fn evict_one(&mut self) -> CacheEntry {
        let mut victim: Option<(usize, u64)> = None;
        for (idx, entry) in self.entries.iter().enumerate() {
            let recency = entry.recency();
            match victim {
                Some((_, best)) if recency <= best => {}
                _ => victim = Some((idx, recency)),
            }
        }

        let Some((idx, _)) = victim else {
            panic!("evict_one called on an empty cache store");
        };

        let entry = self.entries.remove(idx);
        self.total_size -= entry.size();
        self.counters.record_eviction();
        entry
    }

    // == Admit ==
    /// Evicts least recently used entries until `payload` fits in the
    /// budget, then inserts it.
    ///
    /// Runs entirely under one `&mut` borrow, so callers holding the write
    /// side of the cache lock get the whole evict-then-insert sequence as a
    /// single transaction.
    pub fn admit(&mut self, key: String, payload: Vec<u8>) -> Admission {
        let size = payload.len();
        if size > self.max_object_size {
            self.counters.record_rejection();
            return Admission::TooLarge { size };
        }

        // A stale copy of the same URI must not count against the budget
        self.remove(&key);

        let mut evicted = Vec::new();
        // Terminates: once empty, total_size is 0 and size <= max_object_size <= max_cache_size
        while self.total_size + size > self.max_cache_size {
            let entry = self.evict_one();
            evicted.push(Eviction {
                size: entry.size(),
                key: entry.key,
                total_size_after: self.total_size,
            });
        }

        self.insert(key, payload);
        Admission::Admitted {
            evicted,
            total_size: self.total_size,
        }
    }

    // == Remove ==
    /// Drops the entry stored under `key`, if any. Returns its size.
    fn remove(&mut self, key: &str) -> Option<usize> {
        let idx = self.entries.iter().position(|entry| entry.key == key)?;
        let entry = self.entries.remove(idx);
        self.total_size -= entry.size();
        Some(entry.size())
    }

    /// Recency counter of the entry under `key`.
    pub fn recency_of(&self, key: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(CacheEntry::recency)
    }

    /// Keys of live entries, oldest insertion first.
    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.key.clone()).collect()
    }

    /// Current statistics snapshot.
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.entries.len(), self.total_size)
    }

    /// Sum of live payload sizes.
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    pub fn max_cache_size(&self) -> usize {
        self.max_cache_size
    }

    pub fn max_object_size(&self) -> usize {
        self.max_object_size
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MAX_CACHE_SIZE, MAX_OBJECT_SIZE};

    fn bytes(n: usize) -> Vec<u8> {
        vec![b'x'; n]
    }

    #[test]
    fn test_store_new() {
        let store = CacheStore::new(MAX_CACHE_SIZE, MAX_OBJECT_SIZE);
        assert!(store.is_empty());
        assert_eq!(store.total_size(), 0);
    }

    #[test]
    #[should_panic(expected = "exceeds max_cache_size")]
    fn test_store_rejects_inconsistent_limits() {
        let _ = CacheStore::new(100, 200);
    }

    #[test]
    fn test_cache_hit_and_miss() {
        let mut store = CacheStore::new(MAX_CACHE_SIZE, MAX_OBJECT_SIZE);
        store.admit("/a.html".to_string(), bytes(500));

        let hit = store.get("/a.html").unwrap();
        assert_eq!(hit.len(), 500);
        assert!(store.get("/b.html").is_none());

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_contains_does_not_age() {
        let mut store = CacheStore::new(MAX_CACHE_SIZE, MAX_OBJECT_SIZE);
        store.insert("/a".to_string(), bytes(1));
        store.insert("/b".to_string(), bytes(1));

        assert!(store.contains("/a"));
        assert!(!store.contains("/zzz"));
        assert_eq!(store.recency_of("/a"), Some(1));
        assert_eq!(store.recency_of("/b"), Some(0));
    }

    #[test]
    fn test_get_ages_others_and_resets_hit() {
        let mut store = CacheStore::new(MAX_CACHE_SIZE, MAX_OBJECT_SIZE);
        store.insert("/a".to_string(), bytes(1));
        store.insert("/b".to_string(), bytes(1));
        store.insert("/c".to_string(), bytes(1));
        // a=2, b=1, c=0

        store.get("/a");
        assert_eq!(store.recency_of("/a"), Some(0));
        assert_eq!(store.recency_of("/b"), Some(2));
        assert_eq!(store.recency_of("/c"), Some(1));
    }

    #[test]
    fn test_get_miss_mutates_nothing() {
        let mut store = CacheStore::new(MAX_CACHE_SIZE, MAX_OBJECT_SIZE);
        store.insert("/a".to_string(), bytes(1));
        store.insert("/b".to_string(), bytes(1));

        assert!(store.get("/nope").is_none());
        assert_eq!(store.recency_of("/a"), Some(1));
        assert_eq!(store.recency_of("/b"), Some(0));
    }

    #[test]
    fn test_get_returns_independent_copy() {
        let mut store = CacheStore::new(MAX_CACHE_SIZE, MAX_OBJECT_SIZE);
        store.insert("/a".to_string(), b"original".to_vec());

        let mut copy = store.get("/a").unwrap();
        copy[0] = b'X';

        assert_eq!(store.get("/a").unwrap(), b"original".to_vec());
    }

    #[test]
    fn test_insert_replaces_same_key() {
        let mut store = CacheStore::new(MAX_CACHE_SIZE, MAX_OBJECT_SIZE);
        store.insert("/a".to_string(), bytes(10));
        store.insert("/a".to_string(), bytes(30));

        assert_eq!(store.len(), 1);
        assert_eq!(store.total_size(), 30);
    }

    #[test]
    fn test_insert_rejects_oversized() {
        let mut store = CacheStore::new(MAX_CACHE_SIZE, MAX_OBJECT_SIZE);
        assert!(!store.insert("/big".to_string(), bytes(MAX_OBJECT_SIZE + 1)));
        assert!(store.is_empty());
        assert_eq!(store.stats().rejected, 1);
    }

    #[test]
    fn test_insert_accepts_exact_ceiling() {
        let mut store = CacheStore::new(MAX_CACHE_SIZE, MAX_OBJECT_SIZE);
        assert!(store.insert("/edge".to_string(), bytes(MAX_OBJECT_SIZE)));
        assert_eq!(store.total_size(), MAX_OBJECT_SIZE);
    }

    #[test]
    fn test_evict_one_removes_largest_recency() {
        let mut store = CacheStore::new(MAX_CACHE_SIZE, MAX_OBJECT_SIZE);
        store.insert("/a".to_string(), bytes(10));
        store.insert("/b".to_string(), bytes(20));
        store.insert("/c".to_string(), bytes(30));
        store.get("/a");
        // a=0, b=2, c=1

        let evicted = store.evict_one();
        assert_eq!(evicted.key, "/b");
        assert_eq!(store.len(), 2);
        assert_eq!(store.total_size(), 40);
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_evict_one_tie_prefers_oldest_insertion() {
        let mut store = CacheStore::new(MAX_CACHE_SIZE, MAX_OBJECT_SIZE);
        store.insert("/first".to_string(), bytes(1));
        store.insert("/second".to_string(), bytes(1));
        store.insert("/third".to_string(), bytes(1));
        for entry in &store.entries {
            entry.set_recency(7);
        }

        assert_eq!(store.evict_one().key, "/first");
        assert_eq!(store.evict_one().key, "/second");
        assert_eq!(store.evict_one().key, "/third");
    }

    #[test]
    #[should_panic(expected = "empty cache store")]
    fn test_evict_one_on_empty_panics() {
        let mut store = CacheStore::new(MAX_CACHE_SIZE, MAX_OBJECT_SIZE);
        store.evict_one();
    }

    #[test]
    fn test_admit_eviction_under_pressure() {
        let mut store = CacheStore::new(1000, 500);
        store.insert("/old".to_string(), bytes(400));
        store.insert("/fresh".to_string(), bytes(400));
        for _ in 0..4 {
            store.get("/fresh");
        }
        assert_eq!(store.recency_of("/old"), Some(5));
        assert_eq!(store.recency_of("/fresh"), Some(0));

        let outcome = store.admit("/c".to_string(), bytes(400));

        assert_eq!(
            outcome,
            Admission::Admitted {
                evicted: vec![Eviction {
                    key: "/old".to_string(),
                    size: 400,
                    total_size_after: 400,
                }],
                total_size: 800,
            }
        );
        assert_eq!(store.keys(), vec!["/fresh".to_string(), "/c".to_string()]);
        assert_eq!(store.total_size(), 800);
    }

    #[test]
    fn test_admit_evicts_several_until_fit() {
        let mut store = CacheStore::new(100, 100);
        store.admit("/a".to_string(), bytes(30));
        store.admit("/b".to_string(), bytes(30));
        store.admit("/c".to_string(), bytes(30));

        let outcome = store.admit("/d".to_string(), bytes(70));
        match outcome {
            Admission::Admitted { evicted, total_size } => {
                let keys: Vec<_> = evicted.iter().map(|e| e.key.as_str()).collect();
                // 90 + 70 > 100, 60 + 70 > 100, 30 + 70 fits
                assert_eq!(keys, vec!["/a", "/b"]);
                assert_eq!(total_size, 100);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_admit_oversized_leaves_store_unchanged() {
        let mut store = CacheStore::new(MAX_CACHE_SIZE, MAX_OBJECT_SIZE);
        store.admit("/small".to_string(), bytes(100));

        let outcome = store.admit("/big".to_string(), bytes(200_000));

        assert_eq!(outcome, Admission::TooLarge { size: 200_000 });
        assert_eq!(store.keys(), vec!["/small".to_string()]);
        assert_eq!(store.total_size(), 100);
    }

    #[test]
    fn test_admit_same_key_does_not_double_count() {
        let mut store = CacheStore::new(100, 100);
        store.admit("/a".to_string(), bytes(60));
        store.admit("/b".to_string(), bytes(40));

        // Refreshing /a must not evict /b: the old /a is dropped first
        let outcome = store.admit("/a".to_string(), bytes(60));
        assert!(matches!(outcome, Admission::Admitted { ref evicted, .. } if evicted.is_empty()));
        assert_eq!(store.total_size(), 100);
        assert!(store.contains("/b"));
    }
}
