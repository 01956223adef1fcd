use crate::error::ProtocolError;
use crate::model::room::RoomName;
use crate::utils::INIT_CHUNK_ID;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A piece of recorded media on its way from a broadcaster to the viewers of
/// one room. Travels as a binary WebSocket frame (see [`Chunk::encode`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub id: String,
    pub room: RoomName,
    pub mime_type: String,
    pub payload: Bytes,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MetaOut<'a> {
    id: &'a str,
    room: &'a str,
    mime_type: &'a str,
}

#[derive(Serialize)]
struct FrameOut<'a> {
    meta: MetaOut<'a>,
    #[serde(with = "serde_bytes")]
    payload: &'a [u8],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetaIn {
    #[serde(default)]
    id: String,
    #[serde(default)]
    room: String,
    #[serde(default)]
    mime_type: String,
}

#[derive(Deserialize)]
struct FrameIn {
    meta: MetaIn,
    #[serde(with = "serde_bytes")]
    payload: Vec<u8>,
}

impl Chunk {
    pub fn new(
        id: impl Into<String>,
        room: RoomName,
        mime_type: impl Into<String>,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            id: id.into(),
            room,
            mime_type: mime_type.into(),
            payload: payload.into(),
        }
    }

    pub fn is_init(&self) -> bool {
        self.id == INIT_CHUNK_ID
    }

    /// Same bytes, relabelled as the room's init segment.
    pub fn into_init(mut self) -> Self {
        self.id = INIT_CHUNK_ID.to_owned();
        self
    }

    pub fn encode(&self) -> Result<Bytes, ProtocolError> {
        let frame = FrameOut {
            meta: MetaOut {
                id: &self.id,
                room: self.room.as_str(),
                mime_type: &self.mime_type,
            },
            payload: &self.payload,
        };
        Ok(Bytes::from(postcard::to_allocvec(&frame)?))
    }

    /// Parses a binary frame. Frames missing `id`, `room` or `mimeType` are
    /// rejected so the caller can drop them.
    pub fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        let FrameIn { meta, payload } = postcard::from_bytes(frame)?;

        if meta.id.is_empty() {
            return Err(ProtocolError::MissingField("id"));
        }
        if meta.mime_type.is_empty() {
            return Err(ProtocolError::MissingField("mimeType"));
        }
        let room = RoomName::try_from(meta.room).map_err(|_| ProtocolError::MissingField("room"))?;

        Ok(Self {
            id: meta.id,
            room,
            mime_type: meta.mime_type,
            payload: Bytes::from(payload),
        })
    }
}
