use anyhow::{Context, Result, bail};
use beacon_core::{Chunk, ClientSignal, IceServerConfig, ServerSignal, SessionId};
use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// e.g. `ws://127.0.0.1:2173/ws`
    pub url: String,
    pub inbound_capacity: usize,
    pub outbound_capacity: usize,
    /// How long to wait for the relay's `welcome`.
    pub handshake_timeout: Duration,
}

impl ConnectionConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            inbound_capacity: 1024,
            outbound_capacity: 256,
            handshake_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Signal(ServerSignal),
    Chunk(Chunk),
}

/// Cloneable handle for writing to a [`RelayConnection`].
#[derive(Clone)]
pub struct RelaySender {
    outgoing: mpsc::Sender<Message>,
}

impl RelaySender {
    pub async fn send(&self, signal: &ClientSignal) -> Result<()> {
        let json = serde_json::to_string(signal).context("Failed to serialize signal")?;
        self.outgoing
            .send(Message::Text(json.into()))
            .await
            .context("Relay connection closed")
    }

    pub async fn send_chunk(&self, chunk: &Chunk) -> Result<()> {
        let frame = chunk.encode().context("Failed to encode chunk")?;
        self.outgoing
            .send(Message::Binary(frame))
            .await
            .context("Relay connection closed")
    }
}

/// An owned connection to the relay. Dropping it closes the outgoing side;
/// [`RelayConnection::close`] also says goodbye.
pub struct RelayConnection {
    session_id: SessionId,
    ice_servers: Vec<IceServerConfig>,
    sender: RelaySender,
    inbound: mpsc::Receiver<Inbound>,
    writer: JoinHandle<()>,
    reader: JoinHandle<()>,
}

impl RelayConnection {
    /// Connects and waits for the relay's `welcome`.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        info!(url = %config.url, "Connecting to relay");
        let (ws, _) = connect_async(config.url.as_str())
            .await
            .with_context(|| format!("Failed to connect to {}", config.url))?;
        let (mut sink, mut stream) = ws.split();

        let (session_id, ice_servers) =
            tokio::time::timeout(config.handshake_timeout, read_welcome(&mut stream))
                .await
                .context("Timed out waiting for welcome")??;
        info!(session = %session_id, "Relay session ready");

        let (outgoing, mut outgoing_rx) = mpsc::channel::<Message>(config.outbound_capacity);
        let (inbound_tx, inbound) = mpsc::channel(config.inbound_capacity);

        let writer = tokio::spawn(async move {
            while let Some(msg) = outgoing_rx.recv().await {
                if sink.send(msg).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let reader = tokio::spawn(async move {
            while let Some(msg) = stream.next().await {
                let inbound = match msg {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ServerSignal>(&text) {
                        Ok(signal) => Inbound::Signal(signal),
                        Err(e) => {
                            warn!("Invalid signal from relay: {}", e);
                            continue;
                        }
                    },
                    Ok(Message::Binary(frame)) => match Chunk::decode(&frame) {
                        Ok(chunk) => Inbound::Chunk(chunk),
                        Err(e) => {
                            warn!("Invalid chunk from relay: {}", e);
                            continue;
                        }
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        debug!("Relay read failed: {}", e);
                        break;
                    }
                };

                if inbound_tx.send(inbound).await.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            session_id,
            ice_servers,
            sender: RelaySender { outgoing },
            inbound,
            writer,
            reader,
        })
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn ice_servers(&self) -> &[IceServerConfig] {
        &self.ice_servers
    }

    pub fn sender(&self) -> RelaySender {
        self.sender.clone()
    }

    pub async fn send(&self, signal: &ClientSignal) -> Result<()> {
        self.sender.send(signal).await
    }

    pub async fn send_chunk(&self, chunk: &Chunk) -> Result<()> {
        self.sender.send_chunk(chunk).await
    }

    /// Next message from the relay, or `None` once the connection is gone.
    pub async fn recv(&mut self) -> Option<Inbound> {
        self.inbound.recv().await
    }

    /// Sends a close frame and waits for queued frames to flush.
    pub async fn close(self) -> Result<()> {
        let Self {
            sender,
            writer,
            reader,
            ..
        } = self;

        let _ = sender.outgoing.send(Message::Close(None)).await;
        drop(sender);

        let flushed = tokio::time::timeout(Duration::from_secs(5), writer).await;
        reader.abort();
        flushed
            .context("Timed out closing relay connection")?
            .context("Relay writer task failed")
    }
}

async fn read_welcome(stream: &mut SplitStream<WsStream>) -> Result<(SessionId, Vec<IceServerConfig>)> {
    while let Some(msg) = stream.next().await {
        match msg.context("Relay read failed")? {
            Message::Text(text) => match serde_json::from_str::<ServerSignal>(&text)? {
                ServerSignal::Welcome {
                    session_id,
                    ice_servers,
                } => return Ok((session_id, ice_servers)),
                other => bail!("Expected welcome, got {:?}", other),
            },
            Message::Close(_) => break,
            _ => continue,
        }
    }
    bail!("Relay closed before welcome")
}
