pub mod error;
pub mod model;
pub mod pending;
pub mod utils;

pub use error::ProtocolError;
pub use model::{
    Chunk, ClientSignal, IceServerConfig, JoinRequest, RelayEnvelope, Role, RoomName,
    ServerSignal, SessionId,
};
pub use pending::PendingOfferQueue;
