//! fileserve - concurrent GET/PUT file server
//!
//! A bounded accept queue feeds a fixed pool of worker threads. Each worker
//! serves one connection at a time, coordinating access to files through a
//! global metadata lock plus per-file advisory locks.

pub mod audit;
pub mod config;
pub mod handler;
pub mod http;
pub mod lock;
pub mod server;
