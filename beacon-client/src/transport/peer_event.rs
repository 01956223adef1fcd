use beacon_core::SessionId;
use serde_json::Value;

/// Emitted by a [`crate::WebrtcPeer`] towards the code driving negotiation.
#[derive(Debug, Clone, PartialEq)]
pub enum PeerEvent {
    /// A local candidate to forward to `remote` over the relay.
    CandidateGenerated(SessionId, Value),
    Connected(SessionId),
    Disconnected(SessionId),
}
