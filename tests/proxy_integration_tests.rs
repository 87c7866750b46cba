//! Integration Tests for the Proxy
//!
//! Runs a real proxy on an ephemeral port in front of a local fake origin
//! server and drives it over raw TCP.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use mini_proxy::{Config, ProxyServer};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

// == Helper Functions ==

/// Fake origin server answering every request with the same response.
struct Origin {
    addr: SocketAddr,
    connections: Arc<AtomicUsize>,
    response: Vec<u8>,
}

impl Origin {
    async fn spawn(body: &[u8]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));

        let mut response = format!("HTTP/1.0 200 OK\r\nContent-Length: {}\r\n\r\n", body.len()).into_bytes();
        response.extend_from_slice(body);

        let counter = Arc::clone(&connections);
        let payload = response.clone();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let payload = payload.clone();
                tokio::spawn(async move {
                    read_head(&mut stream).await;
                    let _ = stream.write_all(&payload).await;
                });
            }
        });

        Self {
            addr,
            connections,
            response,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

/// Consumes bytes up to and including the blank line ending a request head.
async fn read_head(stream: &mut TcpStream) -> Vec<u8> {
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        match stream.read(&mut byte).await {
            Ok(0) | Err(_) => break,
            Ok(_) => head.push(byte[0]),
        }
    }
    head
}

fn test_config(name: &str) -> Config {
    Config {
        bind: "127.0.0.1".parse().unwrap(),
        port: 0,
        workers: 2,
        log_file: log_path(name),
        ..Config::default()
    }
}

fn log_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("mini_proxy_it_{}_{}.log", name, std::process::id()))
}

/// Sends a raw request through the proxy and reads until it closes.
async fn send(proxy: SocketAddr, request: &str) -> Vec<u8> {
    let mut stream = TcpStream::connect(proxy).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    let _ = stream.read_to_end(&mut response).await;
    response
}

async fn get(proxy: SocketAddr, url: &str) -> Vec<u8> {
    send(proxy, &format!("GET {} HTTP/1.1\r\nAccept: */*\r\n\r\n", url)).await
}

// == Caching ==

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_second_request_is_served_from_cache() {
    let origin = Origin::spawn(b"<html>hello</html>").await;
    let server = ProxyServer::start(test_config("cache_hit")).await.unwrap();
    let url = origin.url("/a.html");

    let first = get(server.local_addr(), &url).await;
    let second = get(server.local_addr(), &url).await;

    assert_eq!(first, origin.response);
    assert_eq!(second, origin.response);
    assert_eq!(origin.connections(), 1);

    let stats = server.cache().stats().await;
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.total_size, origin.response.len());

    server.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_oversized_response_is_relayed_but_not_cached() {
    let body = vec![b'x'; 4096];
    let origin = Origin::spawn(&body).await;
    let config = Config {
        max_object_size: 1024,
        ..test_config("oversized")
    };
    let server = ProxyServer::start(config).await.unwrap();
    let url = origin.url("/big.bin");

    let first = get(server.local_addr(), &url).await;
    let second = get(server.local_addr(), &url).await;

    assert_eq!(first, origin.response);
    assert_eq!(second, origin.response);
    assert_eq!(origin.connections(), 2);
    assert_eq!(server.cache().len().await, 0);

    server.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cache_evicts_under_budget() {
    let body = vec![b'y'; 400];
    let origin = Origin::spawn(&body).await;
    let config = Config {
        max_cache_size: 1000,
        max_object_size: 500,
        ..test_config("evict")
    };
    let server = ProxyServer::start(config).await.unwrap();

    for path in ["/1", "/2", "/3"] {
        get(server.local_addr(), &origin.url(path)).await;
    }

    let stats = server.cache().stats().await;
    assert!(stats.total_size <= 1000);
    assert_eq!(stats.total_entries, 2);
    assert_eq!(stats.evictions, 1);
    assert!(server.cache().contains(&origin.url("/3")).await);
    assert!(!server.cache().contains(&origin.url("/1")).await);

    server.shutdown().await.unwrap();
}

// == Errors ==

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_non_get_method_returns_501() {
    let server = ProxyServer::start(test_config("post")).await.unwrap();

    let response = send(
        server.local_addr(),
        "POST http://127.0.0.1:9/form HTTP/1.0\r\nContent-Length: 0\r\n\r\n",
    )
    .await;

    let text = String::from_utf8(response).unwrap();
    assert!(text.starts_with("HTTP/1.0 501 Not Implemented\r\n"));
    assert!(text.contains("POST"));

    server.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_unreachable_origin_closes_connection_and_proxy_survives() {
    let dead = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let origin = Origin::spawn(b"still alive").await;
    let server = ProxyServer::start(test_config("unreachable")).await.unwrap();

    let response = get(server.local_addr(), &format!("http://{}/x", dead)).await;
    assert!(response.is_empty());

    let response = get(server.local_addr(), &origin.url("/y")).await;
    assert_eq!(response, origin.response);

    server.shutdown().await.unwrap();
}

// == Logging ==

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_log_file_records_pipeline_events() {
    let origin = Origin::spawn(b"logged").await;
    let config = test_config("log_file");
    let path = config.log_file.clone();
    let server = ProxyServer::start(config).await.unwrap();
    let url = origin.url("/log.html");

    get(server.local_addr(), &url).await;
    get(server.local_addr(), &url).await;
    server.shutdown().await.unwrap();

    let contents = tokio::fs::read_to_string(&path).await.unwrap();
    assert!(contents.contains("[main]: Successfully started log consumer"));
    assert!(contents.contains("[main]: Accepted connection from (127.0.0.1, "));
    assert!(contents.contains(&format!("[handler]: cache miss --> {}", url)));
    assert!(contents.contains(&format!("[handler]: Cache hit! --> {}", url)));
    assert!(contents.contains("[handler]: Bytes received: "));
    let _ = tokio::fs::remove_file(&path).await;
}

// == Admin Surface ==

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_admin_stats_and_health() {
    let origin = Origin::spawn(b"admin").await;
    let admin_port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = Config {
        admin_port: Some(admin_port),
        ..test_config("admin")
    };
    let server = ProxyServer::start(config).await.unwrap();
    let admin = server.admin_addr().unwrap();

    get(server.local_addr(), &origin.url("/s")).await;
    get(server.local_addr(), &origin.url("/s")).await;

    let client = reqwest::Client::new();
    let health: Value = client
        .get(format!("http://{}/health", admin))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "healthy");

    let stats: Value = client
        .get(format!("http://{}/stats", admin))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["hits"], 1);
    assert_eq!(stats["misses"], 1);
    assert_eq!(stats["total_entries"], 1);
    assert_eq!(stats["max_cache_size"], 1_049_000);
    assert_eq!(stats["connection_queue"]["capacity"], 100);

    server.shutdown().await.unwrap();
}
