//! End-to-end tests against a running server on an ephemeral port

use fileserve::audit::AuditLog;
use fileserve::config::ServerConfig;
use fileserve::server::{Server, ServerContext};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

struct TestServer {
    addr: SocketAddr,
    dir: tempfile::TempDir,
}

async fn start(threads: usize) -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let cfg = ServerConfig {
        bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        threads,
        queue_capacity: None,
        root: dir.path().to_path_buf(),
    };
    let ctx = ServerContext::new(&cfg.root, AuditLog::new(std::io::sink()));

    let server = Server::bind_with(&cfg, ctx).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(async move { server.run().await });

    TestServer { addr, dir }
}

/// Sends a raw request and returns (status code, body).
async fn send(addr: SocketAddr, raw: Vec<u8>) -> (u16, Vec<u8>) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(&raw).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();

    let split = response
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response has a head");
    let head = String::from_utf8_lossy(&response[..split]).to_string();
    let status = head.split(' ').nth(1).unwrap().parse().unwrap();

    (status, response[split + 4..].to_vec())
}

fn put(path: &str, body: &[u8]) -> Vec<u8> {
    let mut raw = format!("PUT {path} HTTP/1.1\r\nContent-Length: {}\r\n\r\n", body.len()).into_bytes();
    raw.extend_from_slice(body);
    raw
}

fn get(path: &str) -> Vec<u8> {
    format!("GET {path} HTTP/1.1\r\n\r\n").into_bytes()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_put_then_get_round_trip() {
    let server = start(4).await;

    assert_eq!(send(server.addr, put("/foo.txt", b"hello")).await.0, 201);
    assert_eq!(send(server.addr, get("/foo.txt")).await, (200, b"hello".to_vec()));

    assert_eq!(send(server.addr, put("/foo.txt", b"world")).await.0, 200);
    assert_eq!(send(server.addr, get("/foo.txt")).await, (200, b"world".to_vec()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_error_statuses() {
    let server = start(2).await;

    assert_eq!(send(server.addr, get("/missing.txt")).await.0, 404);
    assert_eq!(send(server.addr, get("/")).await.0, 403);
    assert_eq!(
        send(server.addr, b"DELETE /foo.txt HTTP/1.1\r\n\r\n".to_vec()).await.0,
        501
    );
    assert!(!server.dir.path().join("foo.txt").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_puts_never_interleave() {
    let server = start(4).await;

    let bodies: Vec<Vec<u8>> = (0..20u8)
        .map(|i| vec![b'a' + i; 4096])
        .collect();

    let tasks: Vec<_> = bodies
        .iter()
        .cloned()
        .map(|body| {
            let addr = server.addr;
            tokio::spawn(async move { send(addr, put("/shared.txt", &body)).await.0 })
        })
        .collect();

    let mut statuses = Vec::new();
    for task in tasks {
        statuses.push(task.await.unwrap());
    }

    assert_eq!(statuses.iter().filter(|s| **s == 201).count(), 1);
    assert_eq!(statuses.iter().filter(|s| **s == 200).count(), 19);

    let stored = std::fs::read(server.dir.path().join("shared.txt")).unwrap();
    assert!(bodies.contains(&stored), "stored content is a mixture");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_gets_all_succeed() {
    let server = start(4).await;
    let content = b"shared read".to_vec();
    std::fs::write(server.dir.path().join("read.txt"), &content).unwrap();

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let addr = server.addr;
            tokio::spawn(async move { send(addr, get("/read.txt")).await })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap(), (200, content.clone()));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_more_clients_than_queue_slots() {
    // One worker and one queue slot: the rest wait in the accept backlog
    let server = start(1).await;

    let tasks: Vec<_> = (0..10)
        .map(|i| {
            let addr = server.addr;
            tokio::spawn(async move { send(addr, put(&format!("/f{i}"), b"x")).await.0 })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap(), 201);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_malformed_request_is_400() {
    let server = start(1).await;

    let (status, body) = send(server.addr, b"nonsense\r\n\r\n".to_vec()).await;

    assert_eq!(status, 400);
    assert_eq!(body, b"Bad Request\n".to_vec());
}
