use crate::error::DeliveryError;
use beacon_core::{ServerSignal, SessionId};
use bytes::Bytes;

/// Outbound side of the relay: whatever holds the client connections.
///
/// Both calls only enqueue and never wait on the network, so they are safe to
/// make while a room guard is held.
pub trait SignalingOutput: Send + Sync {
    /// Queue a JSON text frame for one session.
    fn send_signal(&self, session: &SessionId, signal: ServerSignal) -> Result<(), DeliveryError>;

    /// Queue an already encoded binary chunk frame for one session.
    fn send_frame(&self, session: &SessionId, frame: Bytes) -> Result<(), DeliveryError>;
}
