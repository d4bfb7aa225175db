//! # Hand-off Queue
//!
//! Channel for producing results on worker threads and applying them to a
//! model on the thread that owns it. `stop` wakes every blocked producer and
//! consumer; after it, pushes and blocking pops fail with
//! [`QueueError::Stopped`].

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    #[error("Queue has been stopped")]
    Stopped,
}

struct QueueState<T> {
    items: VecDeque<T>,
    stopped: bool,
}

pub struct ThreadSafeQueue<T> {
    state: Mutex<QueueState<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: Option<usize>,
}

impl<T> Default for ThreadSafeQueue<T> {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl<T> ThreadSafeQueue<T> {
    pub fn unbounded() -> Self {
        Self::with_capacity_limit(None)
    }

    /// `push` blocks while `capacity` items are waiting
    pub fn bounded(capacity: usize) -> Self {
        Self::with_capacity_limit(Some(capacity.max(1)))
    }

    fn with_capacity_limit(capacity: Option<usize>) -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                stopped: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        }
    }

    // state stays consistent even if another holder panicked
    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_full(&self, state: &QueueState<T>) -> bool {
        self.capacity.is_some_and(|capacity| state.items.len() >= capacity)
    }

    pub fn push(&self, value: T) -> Result<(), QueueError> {
        let mut state = self.lock();
        while !state.stopped && self.is_full(&state) {
            state = self
                .not_full
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if state.stopped {
            return Err(QueueError::Stopped);
        }
        state.items.push_back(value);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Next item if one is waiting; never blocks
    pub fn try_pop(&self) -> Option<T> {
        let mut state = self.lock();
        let value = state.items.pop_front();
        if value.is_some() {
            self.not_full.notify_one();
        }
        value
    }

    /// Block until an item arrives or the queue is stopped
    pub fn wait_and_pop(&self) -> Result<T, QueueError> {
        let mut state = self.lock();
        loop {
            if state.stopped {
                return Err(QueueError::Stopped);
            }
            if let Some(value) = state.items.pop_front() {
                self.not_full.notify_one();
                return Ok(value);
            }
            state = self
                .not_empty
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`wait_and_pop`](Self::wait_and_pop), giving up with `Ok(None)`
    /// after `timeout`
    pub fn wait_and_pop_timeout(&self, timeout: Duration) -> Result<Option<T>, QueueError> {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        loop {
            if state.stopped {
                return Err(QueueError::Stopped);
            }
            if let Some(value) = state.items.pop_front() {
                self.not_full.notify_one();
                return Ok(Some(value));
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            let (guard, _) = self
                .not_empty
                .wait_timeout(state, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;
        }
    }

    /// Fail every pending and future blocking call
    pub fn stop(&self) {
        let mut state = self.lock();
        state.stopped = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }
}
