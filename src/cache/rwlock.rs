//! Fair Readers-Writer Lock
//!
//! Shared/exclusive lock that never lets a stream of new readers starve a
//! waiting writer.
//!
//! A writer takes the turnstile and keeps it until it owns the inner lock.
//! Every reader has to pass through the turnstile before asking for the
//! shared side, so readers that arrive after a writer started waiting queue
//! up behind it. Both the turnstile and the inner lock serve waiters in FIFO
//! order, so writers queued ahead of a reader complete before it starts.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

// == Fair RwLock ==
#[derive(Debug)]
pub struct FairRwLock<T> {
    /// Gate that a waiting writer holds shut
    turnstile: Mutex<()>,
    /// Protected value
    inner: RwLock<T>,
    /// Shared acquisitions granted so far
    reads_admitted: AtomicU64,
    /// Exclusive acquisitions granted so far
    writes_admitted: AtomicU64,
}

impl<T> FairRwLock<T> {
    pub fn new(value: T) -> Self {
        Self {
            turnstile: Mutex::new(()),
            inner: RwLock::new(value),
            reads_admitted: AtomicU64::new(0),
            writes_admitted: AtomicU64::new(0),
        }
    }

    // == Read ==
    /// Acquires shared access. Released when the guard is dropped.
    pub async fn read(&self) -> RwLockReadGuard<'_, T> {
        drop(self.turnstile.lock().await);

        let guard = self.inner.read().await;
        self.reads_admitted.fetch_add(1, Ordering::AcqRel);
        guard
    }

    // == Write ==
    /// Acquires exclusive access. Released when the guard is dropped.
    pub async fn write(&self) -> RwLockWriteGuard<'_, T> {
        let _gate = self.turnstile.lock().await;

        let guard = self.inner.write().await;
        self.writes_admitted.fetch_add(1, Ordering::AcqRel);
        guard
    }

    /// Number of shared acquisitions granted since creation.
    pub fn reads_admitted(&self) -> u64 {
        self.reads_admitted.load(Ordering::Acquire)
    }

    /// Number of exclusive acquisitions granted since creation.
    pub fn writes_admitted(&self) -> u64 {
        self.writes_admitted.load(Ordering::Acquire)
    }
}
