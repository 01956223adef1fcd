mod chunk;
mod room;
mod session;
mod signaling;

pub use chunk::Chunk;
pub use room::RoomName;
pub use session::{Role, SessionId};
pub use signaling::{ClientSignal, IceServerConfig, JoinRequest, RelayEnvelope, ServerSignal};
