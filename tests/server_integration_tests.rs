//! Integration Tests for the File Server
//!
//! Drives the real TCP listener with raw protocol clients.

use std::net::SocketAddr;
use std::time::Duration;

use slurp_server::cache::EvictionCache;
use slurp_server::server::{encode_name_frame, serve};
use slurp_server::{spawn_coordinator, CoordinatorHandle, FetchPipeline, ServeRoot};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

// == Helper Functions ==

struct TestServer {
    addr: SocketAddr,
    coordinator: CoordinatorHandle,
    dir: tempfile::TempDir,
    _shutdown: oneshot::Sender<()>,
}

async fn start_server(files: &[(&str, &[u8])], max_cache_bytes: usize) -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    for (name, body) in files {
        std::fs::write(dir.path().join(name), body).unwrap();
    }
    std::fs::create_dir(dir.path().join("albums")).unwrap();

    let (coordinator, _task) = spawn_coordinator(
        EvictionCache::new(max_cache_bytes),
        8,
        Duration::from_secs(30),
    );
    let pipeline = FetchPipeline::new(ServeRoot::new(dir.path()), coordinator.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    tokio::spawn(serve(
        listener,
        pipeline,
        Duration::from_millis(200),
        async move {
            let _ = shutdown_rx.await;
        },
    ));

    TestServer {
        addr,
        coordinator,
        dir,
        _shutdown: shutdown_tx,
    }
}

/// Sends `request` and returns everything the server wrote before closing.
async fn raw_request(addr: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();
    stream.shutdown().await.unwrap();

    let mut reply = Vec::new();
    stream.read_to_end(&mut reply).await.unwrap();
    reply
}

/// Requests `name` and splits the reply into (announced length, body).
async fn fetch(addr: SocketAddr, name: &str) -> Option<(u64, Vec<u8>)> {
    let reply = raw_request(addr, &encode_name_frame(name).unwrap()).await;
    if reply.len() < 8 {
        return None;
    }
    let len = u64::from_be_bytes(reply[..8].try_into().unwrap());
    Some((len, reply[8..].to_vec()))
}

// == Fetch Tests ==

#[tokio::test]
async fn test_serves_file_with_length_prefix() {
    let server = start_server(&[("hello.txt", b"hello, world")], 1024).await;

    let (len, body) = fetch(server.addr, "hello.txt").await.unwrap();

    assert_eq!(len, 12);
    assert_eq!(body, b"hello, world");
}

#[tokio::test]
async fn test_second_fetch_is_served_from_cache() {
    let server = start_server(&[("photo.jpeg", &[1, 2, 3, 4, 5, 6, 7, 8])], 1024).await;

    let first = fetch(server.addr, "photo.jpeg").await.unwrap();
    let after_first = server.coordinator.stats();
    assert_eq!(after_first.misses, 1);
    assert_eq!(after_first.insertions, 1);

    let second = fetch(server.addr, "photo.jpeg").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(server.coordinator.stats().hits, 1);
}

#[tokio::test]
async fn test_cached_copy_survives_file_removal() {
    let server = start_server(&[("gone.txt", b"still here")], 1024).await;

    fetch(server.addr, "gone.txt").await.unwrap();
    std::fs::remove_file(server.dir.path().join("gone.txt")).unwrap();

    let (_, body) = fetch(server.addr, "gone.txt").await.unwrap();
    assert_eq!(body, b"still here");
}

#[tokio::test]
async fn test_eviction_under_small_budget() {
    let server = start_server(
        &[("niner", &[0; 9]), ("oner", &[1]), ("oner_2", &[2])],
        10,
    )
    .await;

    for name in ["niner", "oner", "oner_2"] {
        fetch(server.addr, name).await.unwrap();
    }

    let stats = server.coordinator.stats();
    assert_eq!(stats.evictions, 1);
    assert_eq!(stats.current_size, 2);
    assert_eq!(stats.total_entries, 2);
}

#[tokio::test]
async fn test_concurrent_fetches_get_identical_bytes() {
    let body: Vec<u8> = (0..=255u8).cycle().take(64 * 1024).collect();
    let server = start_server(&[("blob.bin", &body)], 1024 * 1024).await;

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let addr = server.addr;
        tasks.push(tokio::spawn(async move { fetch(addr, "blob.bin").await }));
    }

    for task in tasks {
        let (len, received) = task.await.unwrap().unwrap();
        assert_eq!(len, body.len() as u64);
        assert_eq!(received, body);
    }
    assert_eq!(server.coordinator.stats().total_entries, 1);
}

// == Failure Tests ==

#[tokio::test]
async fn test_missing_file_closes_without_reply() {
    let server = start_server(&[], 1024).await;
    assert!(raw_request(server.addr, &encode_name_frame("nope.txt").unwrap())
        .await
        .is_empty());
}

#[tokio::test]
async fn test_directory_closes_without_reply() {
    let server = start_server(&[], 1024).await;
    assert!(raw_request(server.addr, &encode_name_frame("albums").unwrap())
        .await
        .is_empty());
}

#[tokio::test]
async fn test_short_request_closes_without_reply() {
    let server = start_server(&[("a.txt", b"abc")], 1024).await;
    assert!(raw_request(server.addr, b"a.txt").await.is_empty());
}

#[tokio::test]
async fn test_parent_directory_names_rejected() {
    let server = start_server(&[("a.txt", b"abc")], 1024).await;
    assert!(raw_request(server.addr, &encode_name_frame("../a.txt").unwrap())
        .await
        .is_empty());
}

#[tokio::test]
async fn test_idle_partial_request_is_dropped() {
    let server = start_server(&[("a.txt", b"abc")], 1024).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream.write_all(b"a.txt").await.unwrap();

    // No shutdown from this side: the server must hang up on its own.
    let mut reply = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut reply))
        .await
        .expect("server kept the idle connection open")
        .unwrap();
    assert!(reply.is_empty());
}

#[tokio::test]
async fn test_server_keeps_serving_after_bad_request() {
    let server = start_server(&[("a.txt", b"abc")], 1024).await;

    raw_request(server.addr, b"junk").await;
    let (_, body) = fetch(server.addr, "a.txt").await.unwrap();
    assert_eq!(body, b"abc");
}
