mod test_http_routes;
mod test_ws_session;

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use beacon_client::{ConnectionConfig, Inbound, RelayConnection};
use beacon_core::{Chunk, ServerSignal};
use beacon_server::{AppState, RelayConfig, serve_listener};
use tokio::net::TcpListener;

/// Timeout for a single expected message (ms).
pub const RECV_TIMEOUT_MS: u64 = 5000;

/// Starts a relay on an ephemeral local port.
pub async fn spawn_relay() -> Result<(SocketAddr, AppState)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = AppState::new(RelayConfig {
        bind_addr: addr,
        ..RelayConfig::default()
    });

    tokio::spawn(serve_listener(listener, state.clone()));
    Ok((addr, state))
}

pub async fn connect(addr: SocketAddr) -> Result<RelayConnection> {
    RelayConnection::connect(&ConnectionConfig::new(format!("ws://{addr}/ws")))
        .await
        .context("Failed to connect to relay")
}

/// Reads until a signal matching `predicate` arrives, skipping anything else.
pub async fn wait_for_signal(
    conn: &mut RelayConnection,
    predicate: impl Fn(&ServerSignal) -> bool,
) -> Result<ServerSignal> {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(RECV_TIMEOUT_MS);
    loop {
        match tokio::time::timeout_at(deadline, conn.recv()).await {
            Ok(Some(Inbound::Signal(signal))) if predicate(&signal) => return Ok(signal),
            Ok(Some(_)) => continue,
            Ok(None) => bail!("Connection closed"),
            Err(_) => bail!("Timeout waiting for signal"),
        }
    }
}

pub async fn wait_for_chunk(conn: &mut RelayConnection) -> Result<Chunk> {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(RECV_TIMEOUT_MS);
    loop {
        match tokio::time::timeout_at(deadline, conn.recv()).await {
            Ok(Some(Inbound::Chunk(chunk))) => return Ok(chunk),
            Ok(Some(_)) => continue,
            Ok(None) => bail!("Connection closed"),
            Err(_) => bail!("Timeout waiting for chunk"),
        }
    }
}
