use crate::error::DeliveryError;
use crate::signaling::SignalingOutput;
use axum::extract::ws::Message;
use beacon_core::{IceServerConfig, ServerSignal, SessionId};
use bytes::Bytes;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

struct SignalingInner {
    peers: DashMap<SessionId, mpsc::Sender<Message>>,
    ice_servers: Vec<IceServerConfig>,
    outbox_capacity: usize,
}

/// Per-session outboxes feeding the WebSocket writer tasks.
///
/// Every outbox is bounded. A session whose outbox is full is evicted: its
/// sender is dropped, which ends its writer task and closes the socket.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new(ice_servers: Vec<IceServerConfig>, outbox_capacity: usize) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                peers: DashMap::new(),
                ice_servers,
                outbox_capacity: outbox_capacity.max(1),
            }),
        }
    }

    pub fn get_ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.clone()
    }

    /// Registers a session and hands back the receiving end of its outbox.
    pub fn add_peer(&self, session: SessionId) -> mpsc::Receiver<Message> {
        let (tx, rx) = mpsc::channel(self.inner.outbox_capacity);
        self.inner.peers.insert(session, tx);
        rx
    }

    pub fn remove_peer(&self, session: &SessionId) {
        self.inner.peers.remove(session);
    }

    pub fn is_connected(&self, session: &SessionId) -> bool {
        self.inner.peers.contains_key(session)
    }

    pub fn peer_count(&self) -> usize {
        self.inner.peers.len()
    }

    fn enqueue(&self, session: &SessionId, message: Message) -> Result<(), DeliveryError> {
        let outcome = match self.inner.peers.get(session) {
            Some(peer) => peer.try_send(message),
            None => return Err(DeliveryError::Disconnected(*session)),
        };

        match outcome {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                warn!(session = %session, "Outbox full, evicting slow session");
                self.remove_peer(session);
                Err(DeliveryError::Evicted(*session))
            }
            Err(TrySendError::Closed(_)) => {
                debug!(session = %session, "Outbox closed");
                self.remove_peer(session);
                Err(DeliveryError::Disconnected(*session))
            }
        }
    }
}

impl SignalingOutput for SignalingService {
    fn send_signal(&self, session: &SessionId, signal: ServerSignal) -> Result<(), DeliveryError> {
        let json = serde_json::to_string(&signal)?;
        self.enqueue(session, Message::Text(json.into()))
    }

    fn send_frame(&self, session: &SessionId, frame: Bytes) -> Result<(), DeliveryError> {
        self.enqueue(session, Message::Binary(frame))
    }
}
