pub mod error;
pub mod negotiation;
pub mod playback;

#[cfg(not(target_arch = "wasm32"))]
pub mod connection;
#[cfg(not(target_arch = "wasm32"))]
pub mod transport;

pub use error::{AppendError, NegotiationError};
pub use negotiation::{
    BroadcasterSession, CandidateBuffer, PeerFactory, PeerTransport, ViewerNegotiator,
};
pub use playback::{MediaSink, PlaybackPump, PumpConfig, PumpState};

#[cfg(not(target_arch = "wasm32"))]
pub use connection::{ConnectionConfig, Inbound, RelayConnection, RelaySender};
#[cfg(not(target_arch = "wasm32"))]
pub use transport::{PeerEvent, WebrtcPeer, WebrtcPeerFactory};
