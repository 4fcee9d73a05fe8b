//! Resource locking for concurrent GET/PUT.
//!
//! Two layers protect a file:
//!
//! 1. A per-path gate held only while the coordinator checks existence,
//!    opens or creates the file and takes the advisory lock. This makes
//!    "did the file exist before this request?" a single atomic decision
//!    among requests for the same path. Gates live in a table keyed by
//!    path, reference counted and dropped once the last user lets go, so
//!    requests for different paths never wait on each other.
//! 2. An advisory `flock` on the opened descriptor, shared for reads and
//!    exclusive for writes, held by the returned [`ResourceGuard`] for the
//!    whole data transfer. The gate is never held during transfer.

use std::collections::HashMap;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use nix::fcntl::{Flock, FlockArg};
use parking_lot::Mutex;

use crate::http::response::StatusCode;

/// Advisory lock mode requested from the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Shared lock, read-only open
    Read,
    /// Exclusive lock, write open with create-if-absent
    Write,
}

impl Access {
    fn flock_arg(self) -> FlockArg {
        match self {
            Access::Read => FlockArg::LockShared,
            Access::Write => FlockArg::LockExclusive,
        }
    }
}

type Gate = Arc<Mutex<()>>;

#[derive(Debug, Default)]
pub struct LockCoordinator {
    gates: Mutex<HashMap<PathBuf, Gate>>,
}

/// An open file holding its advisory lock.
///
/// Dropping the guard releases the lock and closes the descriptor.
pub struct ResourceGuard {
    file: Flock<File>,
    existed: bool,
    access: Access,
    path: PathBuf,
}

impl LockCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire_for_read(&self, path: &Path) -> io::Result<ResourceGuard> {
        self.acquire(path, Access::Read)
    }

    /// Opens `path` for writing, creating it with mode 0600 if absent.
    ///
    /// The file is not truncated here: a reader may still hold a shared lock
    /// on it until the exclusive lock is granted. Call
    /// [`ResourceGuard::truncate`] once the guard is in hand.
    pub fn acquire_for_write(&self, path: &Path) -> io::Result<ResourceGuard> {
        self.acquire(path, Access::Write)
    }

    fn acquire(&self, path: &Path, access: Access) -> io::Result<ResourceGuard> {
        let gate = self.gate_for(path);
        let result = {
            let _held = gate.lock();
            Self::open_locked(path, access)
        };
        self.retire_gate(path, gate);
        result
    }

    fn gate_for(&self, path: &Path) -> Gate {
        let mut gates = self.gates.lock();
        Arc::clone(gates.entry(path.to_path_buf()).or_default())
    }

    /// Drops the table entry for `path` if `gate` is its last outside user.
    fn retire_gate(&self, path: &Path, gate: Gate) {
        let mut gates = self.gates.lock();
        // One reference in the table, one in `gate`: nobody else is waiting.
        if Arc::strong_count(&gate) == 2 {
            gates.remove(path);
        }
    }

    fn open_locked(path: &Path, access: Access) -> io::Result<ResourceGuard> {
        let existed = path.exists();
        let file = match access {
            Access::Read => File::open(path)?,
            Access::Write => OpenOptions::new()
                .write(true)
                .create(true)
                .mode(0o600)
                .open(path)?,
        };

        let file = Flock::lock(file, access.flock_arg())
            .map_err(|(_, errno)| io::Error::from(errno))?;

        Ok(ResourceGuard {
            file,
            existed,
            access,
            path: path.to_path_buf(),
        })
    }
}

impl fmt::Debug for ResourceGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceGuard")
            .field("path", &self.path)
            .field("access", &self.access)
            .field("existed", &self.existed)
            .finish_non_exhaustive()
    }
}

impl ResourceGuard {
    /// Whether the path existed before this acquisition opened it.
    pub fn existed(&self) -> bool {
        self.existed
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// OK if the resource was already there, Created if this request made it.
    pub fn success_status(&self) -> StatusCode {
        if self.existed {
            StatusCode::Ok
        } else {
            StatusCode::Created
        }
    }

    pub fn file(&self) -> &File {
        &self.file
    }

    pub fn file_mut(&mut self) -> &mut File {
        &mut self.file
    }

    pub fn truncate(&mut self) -> io::Result<()> {
        self.file.set_len(0)
    }

    /// Drops the advisory lock and closes the file.
    pub fn release(self) -> io::Result<()> {
        match self.file.unlock() {
            Ok(file) => {
                drop(file);
                Ok(())
            }
            // The lock goes away with the descriptor anyway.
            Err((_, errno)) => Err(io::Error::from(errno)),
        }
    }
}
