pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun1.l.google.com:19302";

/// Chunk id reserved for the segment a playback sink must receive first.
pub const INIT_CHUNK_ID: &str = "init";

/// Largest inbound WebSocket message the relay accepts (50 MB).
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 50 * 1_000_000;

pub const DEFAULT_WS_PATH: &str = "/ws";
