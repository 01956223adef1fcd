use anyhow::Result;
use async_trait::async_trait;
use beacon_core::SessionId;
use serde_json::Value;

/// One direct peer connection. Descriptions and candidates are the opaque JSON
/// payloads carried by the relay.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Creates an offer and applies it as the local description.
    async fn create_offer(&self) -> Result<Value>;

    /// Creates an answer and applies it as the local description.
    async fn create_answer(&self) -> Result<Value>;

    async fn set_remote_description(&self, description: Value) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: Value) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Builds the broadcaster's peer for one viewer.
#[async_trait]
pub trait PeerFactory: Send + Sync {
    type Peer: PeerTransport;

    async fn create_peer(&self, viewer: SessionId) -> Result<Self::Peer>;
}
