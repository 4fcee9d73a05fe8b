//! HTTP protocol layer.
//!
//! A deliberately small HTTP/1.1 subset: one request per connection, no
//! keep-alive, no pipelining.
//!
//! # Architecture
//!
//! - **`connection`**: reads the request head, streams PUT bodies into files
//!   and files onto the socket, and enforces one response per connection
//! - **`parser`**: parses and validates a request head from a byte buffer
//! - **`request`**: request representation and header helpers
//! - **`response`**: status codes and responses with a builder
//! - **`writer`**: serializes and writes responses to the client
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │  Accepted   │
//!        └──────┬──────┘
//!               ▼
//!        ┌─────────────┐  parse error
//!        │   Parsing   │ ─────────────┐
//!        └──────┬──────┘              │
//!               │ GET / PUT / other   │
//!               ▼                     │
//!        ┌─────────────┐              │
//!        │ Dispatching │              │
//!        └──────┬──────┘              │
//!               ▼                     │
//!        ┌─────────────┐              │
//!        │  Responded  │ ◄────────────┘
//!        └──────┬──────┘
//!               ▼
//!        ┌─────────────┐
//!        │   Closed    │ ← always reached
//!        └─────────────┘
//! ```

pub mod connection;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
