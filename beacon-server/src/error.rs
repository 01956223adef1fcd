use beacon_core::{RoomName, SessionId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("room '{room}' already has a broadcaster")]
    BroadcasterPresent { room: RoomName },

    #[error("session is already in room '{room}'")]
    AlreadyInRoom { room: RoomName },
}

/// Why an outbound frame did not reach a session. Callers treat all of these
/// as routine churn and never escalate them.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("session {0} is not connected")]
    Disconnected(SessionId),

    #[error("session {0} fell behind and was evicted")]
    Evicted(SessionId),

    #[error("failed to serialize signal: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {var}")]
    Invalid { var: &'static str, value: String },
}
