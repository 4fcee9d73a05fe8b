//! Fixed-size pool of worker threads fed by a [`TaskQueue`].

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, error};

use crate::server::queue::TaskQueue;

pub const DEFAULT_POOL_SIZE: usize = 4;

pub struct WorkerPool {
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `size` workers, each looping `pop → handler` until the queue
    /// is closed and drained.
    ///
    /// A panicking handler is contained to the task that caused it; the
    /// worker logs it and moves on to the next task.
    pub fn start<T, F>(size: usize, queue: Arc<TaskQueue<T>>, handler: F) -> io::Result<Self>
    where
        T: Send + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        let mut workers = Vec::with_capacity(size);

        for id in 0..size {
            let queue = Arc::clone(&queue);
            let handler = Arc::clone(&handler);

            let handle = thread::Builder::new()
                .name(format!("worker-{id}"))
                .spawn(move || run_worker(id, &queue, &*handler))?;
            workers.push(handle);
        }

        debug!(workers = size, "worker pool started");
        Ok(Self { workers })
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Waits for every worker to exit. Only returns once the queue has been
    /// closed.
    pub fn join(self) {
        for handle in self.workers {
            let _ = handle.join();
        }
    }
}

fn run_worker<T, F>(id: usize, queue: &TaskQueue<T>, handler: &F)
where
    F: Fn(T),
{
    while let Some(task) = queue.pop() {
        if panic::catch_unwind(AssertUnwindSafe(|| handler(task))).is_err() {
            error!(worker = id, "task panicked, worker continues");
        }
    }

    debug!(worker = id, "worker exiting");
}
