use std::path::{Path, PathBuf};

use crate::audit::AuditLog;
use crate::lock::LockCoordinator;

/// State shared by every worker: the served root, the lock coordinator and
/// the audit log. Built once at startup and handed out behind an `Arc`.
#[derive(Debug)]
pub struct ServerContext {
    root: PathBuf,
    locks: LockCoordinator,
    audit: AuditLog,
}

impl ServerContext {
    pub fn new(root: impl Into<PathBuf>, audit: AuditLog) -> Self {
        Self {
            root: root.into(),
            locks: LockCoordinator::new(),
            audit,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn locks(&self) -> &LockCoordinator {
        &self.locks
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Maps a request path onto the filesystem under the served root.
    ///
    /// The parser has already rejected `..` segments, so the result never
    /// escapes the root.
    pub fn resolve(&self, request_path: &str) -> PathBuf {
        self.root.join(request_path.trim_start_matches('/'))
    }
}
