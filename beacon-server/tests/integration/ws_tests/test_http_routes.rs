use std::net::SocketAddr;

use beacon_core::{ClientSignal, JoinRequest, Role};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::{connect, spawn_relay, wait_for_signal};
use crate::integration::{init_tracing, room};

async fn http_get(addr: SocketAddr, path: &str) -> anyhow::Result<String> {
    let mut stream = TcpStream::connect(addr).await?;
    let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await?;

    let mut response = String::new();
    stream.read_to_string(&mut response).await?;
    Ok(response)
}

#[tokio::test]
async fn test_health_route() {
    init_tracing();

    let (addr, _state) = spawn_relay().await.expect("relay failed to start");
    let response = http_get(addr, "/").await.expect("request failed");

    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.ends_with("Backend OK!"));
}

#[tokio::test]
async fn test_live_rooms_route() {
    init_tracing();

    let (addr, _state) = spawn_relay().await.expect("relay failed to start");

    let response = http_get(addr, "/rooms/live").await.expect("request failed");
    assert!(response.ends_with("[]"));

    let mut broadcaster = connect(addr).await.expect("connect failed");
    let r1 = room("r1");
    broadcaster
        .send(&ClientSignal::JoinRoom(JoinRequest {
            room: r1.clone(),
            role: Role::Broadcaster,
        }))
        .await
        .expect("join failed");
    wait_for_signal(&mut broadcaster, |s| {
        matches!(s, beacon_core::ServerSignal::JoinedRoom { .. })
    })
    .await
    .expect("not joined");
    broadcaster
        .send(&ClientSignal::LiveStarted(r1))
        .await
        .expect("live-started failed");

    let mut body = String::new();
    for _ in 0..50 {
        let response = http_get(addr, "/rooms/live").await.expect("request failed");
        body = response.rsplit("\r\n\r\n").next().unwrap_or_default().to_owned();
        if body == r#"["r1"]"# {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert_eq!(body, r#"["r1"]"#);

    broadcaster.close().await.expect("close failed");
}
