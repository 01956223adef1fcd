use thiserror::Error;

/// Reasons an inbound frame or identifier is rejected at the wire boundary.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid session id '{0}'")]
    InvalidSessionId(String),

    #[error("room name is empty")]
    EmptyRoomName,

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("malformed chunk frame: {0}")]
    Frame(#[from] postcard::Error),

    #[error("malformed signal: {0}")]
    Json(#[from] serde_json::Error),
}
