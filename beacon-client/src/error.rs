use beacon_core::SessionId;
use thiserror::Error;

/// Why a media sink refused a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppendError {
    /// The sink is mid-update; try the same buffer again next cycle.
    #[error("sink is busy")]
    Busy,

    /// The buffer itself is bad (malformed or discontinuous).
    #[error("buffer rejected: {0}")]
    Rejected(String),

    /// The sink cannot play this media type at all.
    #[error("unsupported media: {0}")]
    Unsupported(String),
}

#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("message carries no sender")]
    MissingSender,

    #[error("no peer for viewer {0}")]
    UnknownViewer(SessionId),

    #[error("answer from {0} without an outstanding offer")]
    UnexpectedAnswer(SessionId),

    #[error("peer transport failed: {0:#}")]
    Transport(#[from] anyhow::Error),
}
