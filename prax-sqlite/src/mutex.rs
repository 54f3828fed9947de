//! FIFO write serialization.
//!
//! SQLite allows one writer at a time. Rather than letting concurrent
//! transactions race for the engine lock and fail with `SQLITE_BUSY`, an
//! adapter hands out [`WriteGuard`]s from a [`WriteLock`]: acquirers are
//! queued and woken strictly in arrival order, and the lock is handed
//! directly from the releasing guard to the next waiter.
//!
//! ```rust
//! use prax_sqlite::mutex::WriteLock;
//!
//! # tokio_test::block_on(async {
//! let lock = WriteLock::new(16);
//! let mut guard = lock.acquire().await.unwrap();
//! assert!(lock.is_locked());
//!
//! guard.release();
//! guard.release(); // no-op
//! assert!(!lock.is_locked());
//! # });
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::trace;

use prax_driver::DriverError;

#[derive(Debug, Default)]
struct State {
    locked: bool,
    waiters: VecDeque<oneshot::Sender<WriteGuard>>,
}

#[derive(Debug)]
struct Inner {
    state: Mutex<State>,
    max_waiters: usize,
}

impl Inner {
    fn release(self: &Arc<Self>) {
        let mut state = self.state.lock();
        while let Some(waiter) = state.waiters.pop_front() {
            match waiter.send(WriteGuard {
                inner: Some(Arc::clone(self)),
            }) {
                Ok(()) => {
                    trace!(queued = state.waiters.len(), "Write lock handed off");
                    return;
                }
                // The waiter gave up; try the next one.
                Err(mut guard) => guard.disarm(),
            }
        }
        state.locked = false;
    }
}

/// A FIFO mutual-exclusion lock over the adapter's write path.
#[derive(Debug, Clone)]
pub struct WriteLock {
    inner: Arc<Inner>,
}

impl WriteLock {
    /// Create a lock that queues at most `max_waiters` acquirers.
    pub fn new(max_waiters: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                max_waiters,
            }),
        }
    }

    /// Wait for the lock.
    ///
    /// Resolves immediately if the lock is free, otherwise after every
    /// earlier acquirer has released. Fails when the wait queue is full.
    pub async fn acquire(&self) -> Result<WriteGuard, DriverError> {
        let receiver = {
            let mut state = self.inner.state.lock();
            if !state.locked {
                state.locked = true;
                return Ok(WriteGuard {
                    inner: Some(Arc::clone(&self.inner)),
                });
            }
            if state.waiters.len() >= self.inner.max_waiters {
                return Err(DriverError::resource_exhausted(self.inner.max_waiters));
            }
            let (sender, receiver) = oneshot::channel();
            state.waiters.push_back(sender);
            trace!(queued = state.waiters.len(), "Waiting for write lock");
            receiver
        };

        // The sender is only dropped after handing over a guard, so a
        // closed channel means the lock itself is gone.
        receiver
            .await
            .map_err(|_| DriverError::transaction_closed("write lock was dropped while waiting"))
    }

    /// Whether a guard is currently held.
    pub fn is_locked(&self) -> bool {
        self.inner.state.lock().locked
    }

    /// Number of acquirers waiting.
    pub fn queued(&self) -> usize {
        self.inner.state.lock().waiters.len()
    }
}

/// Exclusive access to the write path, released on drop.
#[derive(Debug)]
#[must_use = "the write lock is released as soon as the guard is dropped"]
pub struct WriteGuard {
    inner: Option<Arc<Inner>>,
}

impl WriteGuard {
    /// Release the lock. Releasing an already released guard does nothing.
    pub fn release(&mut self) {
        if let Some(inner) = self.inner.take() {
            inner.release();
        }
    }

    /// Whether this guard still holds the lock.
    pub fn is_held(&self) -> bool {
        self.inner.is_some()
    }

    fn disarm(&mut self) {
        self.inner = None;
    }
}

impl Drop for WriteGuard {
    fn drop(&mut self) {
        self.release();
    }
}
