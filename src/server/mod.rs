//! Acceptor, bounded task queue and worker pool.

pub mod context;
pub mod listener;
pub mod pool;
pub mod queue;

pub use context::ServerContext;
pub use listener::Server;
pub use pool::WorkerPool;
pub use queue::TaskQueue;
