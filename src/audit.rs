//! Per-request audit log.
//!
//! One CSV line per handled request: `METHOD,/path,status,request-id`.
//! Logging is best-effort; a failing sink never fails the request.

use std::io::{self, Write};

use parking_lot::Mutex;

use crate::http::request::{Method, Request};
use crate::http::response::StatusCode;

/// Written in place of an absent `Request-Id` header.
pub const DEFAULT_REQUEST_ID: &str = "0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub method: Method,
    pub path: String,
    pub status: StatusCode,
    pub request_id: Option<String>,
}

impl AuditRecord {
    pub fn new(request: &Request, status: StatusCode) -> Self {
        Self {
            method: request.method.clone(),
            path: request.path.clone(),
            status,
            request_id: request.request_id().map(str::to_string),
        }
    }

    pub fn to_line(&self) -> String {
        format!(
            "{},{},{},{}\n",
            self.method,
            self.path,
            self.status.as_u16(),
            self.request_id.as_deref().unwrap_or(DEFAULT_REQUEST_ID)
        )
    }
}

pub struct AuditLog {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl AuditLog {
    pub fn new<W: Write + Send + 'static>(sink: W) -> Self {
        Self {
            sink: Mutex::new(Box::new(sink)),
        }
    }

    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    pub fn record(&self, record: &AuditRecord) {
        let line = record.to_line();

        // Whole-line writes under the lock keep lines from interleaving
        let mut sink = self.sink.lock();
        if let Err(e) = sink.write_all(line.as_bytes()).and_then(|_| sink.flush()) {
            tracing::warn!(error = %e, "audit log write failed");
        }
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::stderr()
    }
}

impl std::fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog").finish_non_exhaustive()
    }
}
