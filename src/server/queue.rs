//! Bounded FIFO handoff between the acceptor and the worker pool.

use std::collections::VecDeque;
use std::fmt;

use parking_lot::{Condvar, Mutex};

/// Returned by [`TaskQueue::push`] once the queue is closed.
/// Carries the rejected task back to the caller.
#[derive(Debug, PartialEq, Eq)]
pub struct QueueClosed<T>(pub T);

#[derive(Debug, PartialEq, Eq)]
pub enum TryPushError<T> {
    Full(T),
    Closed(T),
}

impl<T> fmt::Display for QueueClosed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("task queue is closed")
    }
}

impl<T: fmt::Debug> std::error::Error for QueueClosed<T> {}

/// Fixed-capacity blocking queue.
///
/// `push` blocks while the queue is full and `pop` blocks while it is
/// empty. Tasks come out in the order they went in and are never dropped.
pub struct TaskQueue<T> {
    state: Mutex<QueueState<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

impl<T> TaskQueue<T> {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "task queue capacity must be non-zero");

        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends `task`, waiting for a free slot if the queue is full.
    pub fn push(&self, task: T) -> Result<(), QueueClosed<T>> {
        let mut state = self.state.lock();

        while state.items.len() >= self.capacity && !state.closed {
            self.not_full.wait(&mut state);
        }
        if state.closed {
            return Err(QueueClosed(task));
        }

        state.items.push_back(task);
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    pub fn try_push(&self, task: T) -> Result<(), TryPushError<T>> {
        let mut state = self.state.lock();

        if state.closed {
            return Err(TryPushError::Closed(task));
        }
        if state.items.len() >= self.capacity {
            return Err(TryPushError::Full(task));
        }

        state.items.push_back(task);
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Removes the oldest task, waiting while the queue is empty.
    ///
    /// Returns `None` only after [`close`](Self::close) once every queued
    /// task has been handed out.
    pub fn pop(&self) -> Option<T> {
        let mut state = self.state.lock();

        loop {
            if let Some(task) = state.items.pop_front() {
                drop(state);
                self.not_full.notify_one();
                return Some(task);
            }
            if state.closed {
                return None;
            }
            self.not_empty.wait(&mut state);
        }
    }

    /// Stops accepting tasks and wakes every blocked producer and consumer.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

impl<T> fmt::Debug for TaskQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("TaskQueue")
            .field("len", &state.items.len())
            .field("capacity", &self.capacity)
            .field("closed", &state.closed)
            .finish()
    }
}
