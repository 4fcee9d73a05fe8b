//! Tests for per-connection dispatch, driven over an in-memory stream

use fileserve::audit::AuditLog;
use fileserve::handler::handle_connection;
use fileserve::server::context::ServerContext;
use parking_lot::Mutex;
use std::io::{self, Cursor, Read, Write};
use std::sync::Arc;

/// Stream whose reads come from a fixed request and whose writes are kept.
struct MockStream {
    input: Cursor<Vec<u8>>,
    output: Arc<Mutex<Vec<u8>>>,
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.read(buf)
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.output.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct Harness {
    dir: tempfile::TempDir,
    ctx: ServerContext,
    audit: SharedBuf,
}

impl Harness {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let audit = SharedBuf::default();
        let ctx = ServerContext::new(dir.path(), AuditLog::new(audit.clone()));
        Self { dir, ctx, audit }
    }

    fn request(&self, raw: &[u8]) -> String {
        let output = Arc::new(Mutex::new(Vec::new()));
        let stream = MockStream {
            input: Cursor::new(raw.to_vec()),
            output: Arc::clone(&output),
        };
        handle_connection(&self.ctx, stream);
        let bytes = output.lock().clone();
        String::from_utf8(bytes).unwrap()
    }

    fn audit_lines(&self) -> Vec<String> {
        let bytes = self.audit.0.lock().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

fn status_line(response: &str) -> &str {
    response.split("\r\n").next().unwrap()
}

#[test]
fn test_put_creates_then_replaces() {
    let h = Harness::new();

    let first = h.request(b"PUT /foo.txt HTTP/1.1\r\nContent-Length: 5\r\nRequest-Id: 1\r\n\r\nhello");
    assert_eq!(status_line(&first), "HTTP/1.1 201 Created");
    assert_eq!(std::fs::read_to_string(h.dir.path().join("foo.txt")).unwrap(), "hello");

    let second = h.request(b"PUT /foo.txt HTTP/1.1\r\nContent-Length: 2\r\nRequest-Id: 2\r\n\r\nhi");
    assert_eq!(status_line(&second), "HTTP/1.1 200 OK");
    assert_eq!(std::fs::read_to_string(h.dir.path().join("foo.txt")).unwrap(), "hi");

    assert_eq!(h.audit_lines(), vec!["PUT,/foo.txt,201,1", "PUT,/foo.txt,200,2"]);
}

#[test]
fn test_get_returns_file_content() {
    let h = Harness::new();
    std::fs::write(h.dir.path().join("foo.txt"), "hello").unwrap();

    let response = h.request(b"GET /foo.txt HTTP/1.1\r\n\r\n");

    assert_eq!(response, "HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello");
    assert_eq!(h.audit_lines(), vec!["GET,/foo.txt,200,0"]);
}

#[test]
fn test_get_missing_is_404() {
    let h = Harness::new();

    let response = h.request(b"GET /missing.txt HTTP/1.1\r\nRequest-Id: 9\r\n\r\n");

    assert_eq!(status_line(&response), "HTTP/1.1 404 Not Found");
    assert!(response.ends_with("Not Found\n"));
    assert_eq!(h.audit_lines(), vec!["GET,/missing.txt,404,9"]);
}

#[test]
fn test_get_directory_is_403() {
    let h = Harness::new();
    std::fs::create_dir(h.dir.path().join("sub")).unwrap();

    assert_eq!(status_line(&h.request(b"GET / HTTP/1.1\r\n\r\n")), "HTTP/1.1 403 Forbidden");
    assert_eq!(status_line(&h.request(b"GET /sub HTTP/1.1\r\n\r\n")), "HTTP/1.1 403 Forbidden");
}

#[test]
fn test_put_into_directory_or_missing_parent_is_403() {
    let h = Harness::new();
    std::fs::create_dir(h.dir.path().join("sub")).unwrap();

    let dir_target = h.request(b"PUT /sub HTTP/1.1\r\nContent-Length: 1\r\n\r\nx");
    let missing_parent = h.request(b"PUT /nope/file HTTP/1.1\r\nContent-Length: 1\r\n\r\nx");

    assert_eq!(status_line(&dir_target), "HTTP/1.1 403 Forbidden");
    assert_eq!(status_line(&missing_parent), "HTTP/1.1 403 Forbidden");
    assert!(!h.dir.path().join("nope").exists());
    assert_eq!(h.audit_lines(), vec!["PUT,/sub,403,0", "PUT,/nope/file,403,0"]);
}

#[test]
fn test_unsupported_method_is_501_and_touches_nothing() {
    let h = Harness::new();

    let response = h.request(b"DELETE /foo.txt HTTP/1.1\r\nRequest-Id: 4\r\n\r\n");

    assert_eq!(status_line(&response), "HTTP/1.1 501 Not Implemented");
    assert_eq!(std::fs::read_dir(h.dir.path()).unwrap().count(), 0);
    assert_eq!(h.audit_lines(), vec!["DELETE,/foo.txt,501,4"]);
}

#[test]
fn test_parse_error_gets_one_response_and_no_audit() {
    let h = Harness::new();

    let bad = h.request(b"GET foo HTTP/1.1\r\n\r\n");
    let old = h.request(b"GET /foo HTTP/1.0\r\n\r\n");
    let no_length = h.request(b"PUT /foo HTTP/1.1\r\n\r\n");

    assert_eq!(status_line(&bad), "HTTP/1.1 400 Bad Request");
    assert_eq!(status_line(&old), "HTTP/1.1 505 Version Not Supported");
    assert_eq!(status_line(&no_length), "HTTP/1.1 400 Bad Request");
    assert_eq!(bad.matches("HTTP/1.1").count(), 1);
    assert!(h.audit_lines().is_empty());
    assert!(!h.dir.path().join("foo").exists());
}

#[test]
fn test_short_body_is_400() {
    let h = Harness::new();

    let response = h.request(b"PUT /short.txt HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc");

    assert_eq!(status_line(&response), "HTTP/1.1 400 Bad Request");
    assert_eq!(h.audit_lines(), vec!["PUT,/short.txt,400,0"]);
    // Partial content is left on disk
    assert_eq!(std::fs::read_to_string(h.dir.path().join("short.txt")).unwrap(), "abc");
}

#[test]
fn test_client_gone_before_request_sends_nothing() {
    let h = Harness::new();

    assert_eq!(h.request(b"GET /foo"), "");
    assert!(h.audit_lines().is_empty());
}

#[test]
fn test_put_ignores_bytes_beyond_content_length() {
    let h = Harness::new();

    let response = h.request(b"PUT /exact.txt HTTP/1.1\r\nContent-Length: 3\r\n\r\nabcdef");

    assert_eq!(status_line(&response), "HTTP/1.1 201 Created");
    assert_eq!(std::fs::read_to_string(h.dir.path().join("exact.txt")).unwrap(), "abc");
}
