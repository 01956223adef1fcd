pub mod ws_tests;

use std::sync::Arc;
use tracing::Level;

use beacon_core::{Chunk, JoinRequest, Role, RoomName, SessionId};
use beacon_server::SignalingRouter;

use crate::utils::MockSignalingOutput;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn create_test_router() -> (SignalingRouter, MockSignalingOutput) {
    let output = MockSignalingOutput::new_stored_only();
    let router = SignalingRouter::new(Arc::new(output.clone()));
    (router, output)
}

pub fn room(name: &str) -> RoomName {
    RoomName::new(name).expect("valid room name")
}

pub fn chunk(room: &RoomName, id: &str, payload: &[u8]) -> Chunk {
    Chunk::new(id, room.clone(), "video/webm;codecs=vp8", payload.to_vec())
}

/// Joins a fresh session and returns its id.
pub fn join_as(router: &SignalingRouter, room: &RoomName, role: Role) -> SessionId {
    let session = SessionId::new();
    router.join(
        session,
        JoinRequest {
            room: room.clone(),
            role,
        },
    );
    session
}
