//! Shared inbound queue with selective consume
//!
//! Reader tasks push; the game loop takes the first entry matching a
//! predicate and leaves everything else queued in arrival order. The lock
//! only guards the `VecDeque` edit and is never held across an await.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::Notify;

pub struct Mailbox<T> {
    queue: Mutex<VecDeque<T>>,
    notify: Notify,
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        // A panicking pusher cannot leave the deque half-edited
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push(&self, item: T) {
        self.lock().push_back(item);
        self.notify.notify_one();
    }

    /// Remove and return the oldest entry matching `pred`, if any
    pub fn try_take<F>(&self, mut pred: F) -> Option<T>
    where
        F: FnMut(&T) -> bool,
    {
        let mut queue = self.lock();
        let pos = queue.iter().position(|item| pred(item))?;
        queue.remove(pos)
    }

    /// Wait until an entry matching `pred` arrives, then remove it
    pub async fn take<F>(&self, mut pred: F) -> T
    where
        F: FnMut(&T) -> bool,
    {
        loop {
            let notified = self.notify.notified();
            if let Some(item) = self.try_take(&mut pred) {
                return item;
            }
            notified.await;
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
