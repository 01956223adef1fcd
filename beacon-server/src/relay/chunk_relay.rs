use crate::room::{Room, RoomRegistry};
use crate::signaling::SignalingOutput;
use beacon_core::{Chunk, ProtocolError, RoomName, SessionId};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Fanned out to `recipients` viewers. `init` is set when the chunk was
    /// cached as the room's init segment.
    Delivered { recipients: usize, init: bool },
    NotLive,
    UnknownRoom,
}

/// Fans binary chunks out to the viewers of a room and keeps the room's init
/// segment for viewers that join mid-stream.
#[derive(Clone)]
pub struct ChunkRelay {
    registry: Arc<RoomRegistry>,
    output: Arc<dyn SignalingOutput>,
}

impl ChunkRelay {
    pub fn new(registry: Arc<RoomRegistry>, output: Arc<dyn SignalingOutput>) -> Self {
        Self { registry, output }
    }

    /// Publishes a chunk into `chunk.room`.
    ///
    /// The first chunk of a live session becomes the init segment whatever id
    /// it carries. A later chunk with id `"init"` replaces the cached one.
    /// Fan-out happens under the room guard, so every viewer sees the room's
    /// chunks in publish order.
    pub fn publish(&self, chunk: Chunk) -> Result<PublishOutcome, ProtocolError> {
        let room_name = chunk.room.clone();

        let outcome = self
            .registry
            .with_room(&room_name, |room| -> Result<PublishOutcome, ProtocolError> {
                if !room.is_live() {
                    return Ok(PublishOutcome::NotLive);
                }

                let init = room.init_segment().is_none() || chunk.is_init();
                let frame = if init {
                    let chunk = chunk.into_init();
                    let frame = chunk.encode()?;
                    room.cache_init_segment(chunk);
                    info!(room = %room_name, "Init segment cached");
                    frame
                } else {
                    chunk.encode()?
                };

                let mut recipients = 0;
                for viewer in room.viewers() {
                    match self.output.send_frame(&viewer, frame.clone()) {
                        Ok(()) => recipients += 1,
                        Err(e) => debug!(room = %room_name, session = %viewer, "Chunk not delivered: {}", e),
                    }
                }

                Ok(PublishOutcome::Delivered { recipients, init })
            });

        outcome.unwrap_or(Ok(PublishOutcome::UnknownRoom))
    }

    /// The init segment a viewer joining `room` right now must receive first.
    pub fn on_join(&self, room: &RoomName) -> Option<Chunk> {
        self.registry
            .inspect(room, |room| room.live_init_segment().cloned())
            .flatten()
    }

    /// Sends the cached init segment to one session. Called under the room
    /// guard so no later chunk can overtake it.
    pub(crate) fn send_init(&self, room: &Room, session: &SessionId) -> bool {
        let Some(init) = room.live_init_segment() else {
            return false;
        };

        let sent = init
            .encode()
            .map_err(|e| e.to_string())
            .and_then(|frame| self.output.send_frame(session, frame).map_err(|e| e.to_string()));

        match sent {
            Ok(()) => true,
            Err(e) => {
                debug!(room = %room.name(), session = %session, "Init segment not delivered: {}", e);
                false
            }
        }
    }
}
