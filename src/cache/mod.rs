//! Cache Module
//!
//! Size-bounded response cache shared by all workers, with recency-based
//! eviction and a writer-fair readers-writer lock.

mod entry;
mod rwlock;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use rwlock::FairRwLock;
pub use shared::SharedCache;
pub use stats::{CacheCounters, CacheStats};
pub use store::{Admission, CacheStore, Eviction};

// == Public Constants ==
/// Aggregate cache budget in bytes
pub const MAX_CACHE_SIZE: usize = 1_049_000;

/// Largest single response that may be cached, in bytes
pub const MAX_OBJECT_SIZE: usize = 102_400;
