//! Bounded Queue Module
//!
//! Fixed-capacity FIFO shared between producers and consumers. One instance
//! carries accepted connections from the dispatcher to the worker pool,
//! another carries diagnostic records to the log consumer.
//!
//! Capacity is tracked with two counting semaphores: `slots` (free space)
//! and `filled` (items ready). Both are FIFO-fair, so a freed slot or a new
//! item wakes exactly one waiter in arrival order.

use std::collections::VecDeque;

use tokio::sync::{Mutex, Semaphore};

use crate::error::QueueError;

// == Bounded Queue ==
/// Blocking bounded FIFO queue, generic over its payload.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    /// Buffered items, head at the front
    items: Mutex<VecDeque<T>>,
    /// Free slots; inserters wait here while the queue is full
    slots: Semaphore,
    /// Ready items; removers wait here while the queue is empty
    filled: Semaphore,
    /// Maximum number of buffered items
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    // == Constructor ==
    /// Creates an empty queue holding at most `capacity` items.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be non-zero");
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            slots: Semaphore::new(capacity),
            filled: Semaphore::new(0),
            capacity,
        }
    }

    // == Insert ==
    /// Appends `item` at the tail, waiting while the queue is full.
    ///
    /// Returns `QueueError::Closed` if the queue is closed before a slot
    /// frees up; the item is dropped in that case.
    pub async fn insert(&self, item: T) -> Result<(), QueueError> {
        let slot = self.slots.acquire().await.map_err(|_| QueueError::Closed)?;

        // The permit is only consumed once the item is in the buffer, so a
        // cancelled insert hands its slot back
        let mut items = self.items.lock().await;
        items.push_back(item);
        slot.forget();
        self.filled.add_permits(1);
        Ok(())
    }

    // == Remove ==
    /// Removes and returns the head, waiting while the queue is empty.
    ///
    /// After `close`, items already buffered are still handed out; once the
    /// buffer is drained every call returns `QueueError::Closed`.
    pub async fn remove(&self) -> Result<T, QueueError> {
        let ready = match self.filled.acquire().await {
            Ok(ready) => ready,
            Err(_) => {
                // Closed: drain what is left without touching the counters
                return self.items.lock().await.pop_front().ok_or(QueueError::Closed);
            }
        };

        let mut items = self.items.lock().await;
        let item = items.pop_front();
        ready.forget();
        self.slots.add_permits(1);
        item.ok_or(QueueError::Closed)
    }

    // == Close ==
    /// Closes the queue. Blocked inserters and removers wake up with
    /// `QueueError::Closed` (removers only once the buffer is empty).
    pub fn close(&self) {
        self.slots.close();
        self.filled.close();
    }

    /// Returns true once `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.slots.is_closed()
    }

    /// Number of items currently buffered.
    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }

    /// Maximum number of buffered items.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
