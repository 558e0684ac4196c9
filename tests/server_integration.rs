//! Server lifecycle tests against a real loopback listener.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use diagram_sync::api::{ServerConfig, SyncServer};
use diagram_sync::{DiagramSyncError, SessionStore};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const LOOPBACK: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Minimal HTTP/1.1 exchange; returns (status, body).
async fn http(port: u16, method: &str, path: &str, body: Option<&str>) -> (u16, String) {
    let mut stream = TcpStream::connect((LOOPBACK, port)).await.unwrap();
    let body = body.unwrap_or("");
    let request = format!(
        "{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\
         Content-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let raw = String::from_utf8_lossy(&raw).to_string();

    let status = raw
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap();
    let body = raw
        .split_once("\r\n\r\n")
        .map(|(_, b)| b.to_string())
        .unwrap_or_default();
    (status, body)
}

async fn occupied_port() -> (TcpListener, u16) {
    let listener = TcpListener::bind((LOOPBACK, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

#[tokio::test]
async fn test_agent_write_visible_to_poll() {
    let mut server = SyncServer::new(ServerConfig::new(LOOPBACK, 0).with_port_range(0));
    let port = server.start().await.unwrap();

    let (status, body) = http(
        port,
        "POST",
        "/api/mcp/state",
        Some(r#"{"sessionId":"chat-1","xml":"<mxGraphModel/>"}"#),
    )
    .await;
    assert_eq!(status, 200);
    let written: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(written["version"], 1);

    let (status, body) = http(port, "GET", "/api/state?sessionId=chat-1", None).await;
    assert_eq!(status, 200);
    let state: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(state["xml"], "<mxGraphModel/>");
    assert_eq!(state["version"], 1);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_page_reports_negotiated_port() {
    let (_held, preferred) = occupied_port().await;

    let mut server = SyncServer::new(ServerConfig::new(LOOPBACK, preferred));
    let port = server.start().await.unwrap();
    assert!(port > preferred);
    assert!(port <= preferred + 18);

    let (status, html) = http(port, "GET", "/?mcp=s1", None).await;
    assert_eq!(status, 200);
    assert!(html.contains(&format!("http://localhost:{port}/api/state")));
    assert!(!html.contains(&format!("http://localhost:{preferred}/")));

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_start_fails_when_range_exhausted() {
    let (_held, preferred) = occupied_port().await;

    let mut server = SyncServer::new(ServerConfig::new(LOOPBACK, preferred).with_port_range(0));
    let err = server.start().await.unwrap_err();

    assert!(matches!(err, DiagramSyncError::NoAvailablePort { .. }));
    assert!(!server.is_running());
}

#[tokio::test]
async fn test_stop_releases_port() {
    let mut server = SyncServer::new(ServerConfig::new(LOOPBACK, 0).with_port_range(0));
    let port = server.start().await.unwrap();
    server.stop().await.unwrap();

    // Same port can be bound again once the server is stopped.
    let rebound = TcpListener::bind((LOOPBACK, port)).await;
    assert!(rebound.is_ok());
}

#[tokio::test]
async fn test_stop_does_not_hang_on_stalled_request() {
    let config = ServerConfig::new(LOOPBACK, 0)
        .with_port_range(0)
        .with_shutdown_grace(Duration::from_millis(200));
    let mut server = SyncServer::new(config);
    let port = server.start().await.unwrap();

    // Client announces 100 body bytes, sends 6, then goes quiet.
    let mut stalled = TcpStream::connect((LOOPBACK, port)).await.unwrap();
    stalled
        .write_all(
            b"POST /api/state HTTP/1.1\r\nHost: localhost\r\n\
              Content-Type: application/json\r\nContent-Length: 100\r\n\r\n{\"sess",
        )
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let stopped = tokio::time::timeout(Duration::from_secs(5), server.stop()).await;
    assert!(stopped.is_ok(), "stop() hung on a stalled connection");
    assert!(!server.is_running());
    drop(stalled);

    let restarted = server.start().await.unwrap();
    assert_eq!(server.port(), Some(restarted));
    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_background_sweep_evicts_stale_sessions() {
    let store = Arc::new(SessionStore::new());
    store.write_at("stale", "<old/>", Utc::now() - chrono::Duration::hours(2));
    store.write("fresh", "<new/>");

    let config = ServerConfig::new(LOOPBACK, 0)
        .with_port_range(0)
        .with_expiry(Duration::from_secs(3600), Duration::from_millis(25));
    let mut server = SyncServer::with_store(config, Arc::clone(&store));
    let port = server.start().await.unwrap();

    tokio::time::sleep(Duration::from_millis(250)).await;

    let (_, body) = http(port, "GET", "/api/state?sessionId=stale", None).await;
    let stale: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(stale["version"], 0);
    assert!(stale["xml"].is_null());

    let (_, body) = http(port, "GET", "/api/state?sessionId=fresh", None).await;
    let fresh: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(fresh["version"], 1);

    server.stop().await.unwrap();
}
