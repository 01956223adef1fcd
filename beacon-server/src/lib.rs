pub mod app;
pub mod config;
pub mod error;
pub mod relay;
pub mod room;
pub mod signaling;

pub use app::{AppState, build_router, serve, serve_listener};
pub use config::RelayConfig;
pub use error::{ConfigError, DeliveryError, RegistryError};
pub use relay::{ChunkRelay, PublishOutcome};
pub use room::{Departure, Room, RoomRegistry, SessionRecord};
pub use signaling::{
    PairState, SignalingOutput, SignalingRouter, SignalingService, ws_handler,
};
