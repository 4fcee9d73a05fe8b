use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::audit::AuditLog;
use crate::config::ServerConfig;
use crate::handler;
use crate::server::context::ServerContext;
use crate::server::pool::WorkerPool;
use crate::server::queue::TaskQueue;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// A bound listener plus its queue and worker pool.
///
/// Accepting runs on tokio; each accepted socket is converted to a blocking
/// `std::net::TcpStream` and handed to the pool through the bounded queue.
pub struct Server {
    listener: TcpListener,
    queue: Arc<TaskQueue<std::net::TcpStream>>,
    pool: WorkerPool,
    context: Arc<ServerContext>,
}

impl Server {
    pub async fn bind(cfg: &ServerConfig) -> anyhow::Result<Self> {
        Self::bind_with(cfg, ServerContext::new(&cfg.root, AuditLog::stderr())).await
    }

    pub async fn bind_with(cfg: &ServerConfig, context: ServerContext) -> anyhow::Result<Self> {
        let addr = cfg.listen_addr();
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;

        let queue = Arc::new(TaskQueue::new(cfg.queue_capacity()));
        let context = Arc::new(context);

        let worker_context = Arc::clone(&context);
        let pool = WorkerPool::start(cfg.threads, Arc::clone(&queue), move |stream| {
            handler::handle_connection(&worker_context, stream)
        })
        .context("failed to start worker pool")?;

        info!(
            addr = %listener.local_addr()?,
            workers = pool.size(),
            queue_capacity = queue.capacity(),
            root = %context.root().display(),
            "Listening"
        );

        Ok(Self {
            listener,
            queue,
            pool,
            context,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn context(&self) -> &Arc<ServerContext> {
        &self.context
    }

    /// Accepts connections until the queue is closed.
    ///
    /// Pushing blocks while the queue is full, which stops further accepts.
    /// Accept failures and sockets that cannot be handed to a worker are
    /// logged and skipped; the loop keeps running.
    ///
    /// # Panics
    ///
    /// Must run on a multi-threaded tokio runtime; the blocking push goes
    /// through `block_in_place`.
    pub async fn run(&self) {
        loop {
            let (socket, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(error = %e, "accept failed, continuing");
                    if let Some(pause) = accept_backoff(&e) {
                        tokio::time::sleep(pause).await;
                    }
                    continue;
                }
            };
            debug!(%peer, "Accepted connection");

            let stream = match into_blocking(socket) {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(%peer, error = %e, "dropping connection");
                    continue;
                }
            };

            let queue = Arc::clone(&self.queue);
            if tokio::task::block_in_place(move || queue.push(stream)).is_err() {
                info!("task queue closed, acceptor stopping");
                return;
            }
        }
    }

    /// Closes the queue and waits for the workers to drain it.
    pub fn shutdown(self) {
        self.queue.close();
        self.pool.join();
    }
}

fn into_blocking(socket: tokio::net::TcpStream) -> io::Result<std::net::TcpStream> {
    let stream = socket.into_std()?;
    stream.set_nonblocking(false)?;
    Ok(stream)
}

/// How long to pause after a failed accept before trying again.
///
/// Per-connection failures retry at once. Anything else (usually running
/// out of descriptors or buffers) would fail again immediately, so back off.
fn accept_backoff(e: &io::Error) -> Option<Duration> {
    match e.kind() {
        io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::Interrupted => None,
        _ => Some(ACCEPT_BACKOFF),
    }
}
