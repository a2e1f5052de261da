//! Serial task queue.
//!
//! Used to funnel public key lookups during history decoding through a
//! single slot, so a page with many unknown counterparts does not fire all
//! lookups at the node at once.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// A queue that runs at most one task at a time, in submission order.
///
/// Backlog is unbounded. Ordering comes from the fairness of
/// [`tokio::sync::Mutex`]: waiters acquire the slot in the order they first
/// polled it.
#[derive(Debug, Default)]
pub struct SerialQueue {
    slot: Mutex<()>,
    queued: AtomicUsize,
}

impl SerialQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `task` once every previously submitted task has finished.
    pub async fn run<F, T>(&self, task: F) -> T
    where
        F: Future<Output = T>,
    {
        let _queued = Queued::enter(&self.queued);
        let _slot = self.slot.lock().await;
        task.await
    }

    /// Number of tasks waiting for or holding the slot.
    pub fn len(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    /// Returns true if no task is waiting.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Counts a task from submission until it finishes or is dropped.
struct Queued<'a>(&'a AtomicUsize);

impl<'a> Queued<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        let backlog = counter.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(backlog, "task queued");
        Self(counter)
    }
}

impl Drop for Queued<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
