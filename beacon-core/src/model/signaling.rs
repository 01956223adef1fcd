use crate::error::ProtocolError;
use crate::model::room::RoomName;
use crate::model::session::{Role, SessionId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

/// Text frames sent by a client to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientSignal {
    JoinRoom(JoinRequest),
    LeaveRoom,
    RequestOffer,
    WebrtcOffer(RelayEnvelope),
    WebrtcAnswer(RelayEnvelope),
    WebrtcIce(RelayEnvelope),
    PeerConnected(RelayEnvelope),
    #[serde(alias = "live-start")]
    LiveStarted(RoomName),
    #[serde(alias = "live-end")]
    LiveStopped(RoomName),
}

/// Text frames sent by the relay to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerSignal {
    Welcome {
        session_id: SessionId,
        ice_servers: Vec<IceServerConfig>,
    },
    JoinedRoom {
        room: RoomName,
        is_live: bool,
    },
    JoinRejected {
        room: RoomName,
        reason: String,
    },
    ViewerRequestedOffer(SessionId),
    WebrtcOffer(RelayEnvelope),
    WebrtcAnswer(RelayEnvelope),
    WebrtcIce(RelayEnvelope),
    PeerLeft(SessionId),
    LiveStarted(RoomName),
    LiveStopped(RoomName),
}

/// `join-room` payload. Older clients send the bare room name, which joins as
/// a viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "JoinShape")]
pub struct JoinRequest {
    pub room: RoomName,
    pub role: Role,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JoinShape {
    Bare(RoomName),
    Full {
        room: RoomName,
        #[serde(default)]
        role: Role,
    },
}

impl From<JoinShape> for JoinRequest {
    fn from(shape: JoinShape) -> Self {
        match shape {
            JoinShape::Bare(room) => Self {
                room,
                role: Role::Viewer,
            },
            JoinShape::Full { room, role } => Self { room, role },
        }
    }
}

/// Normalized `{from, to, payload}` carried by offer/answer/ICE messages.
///
/// Legacy senders address with `{to, offer}`, `{from, answer}` or
/// `{to, candidate}`, and some send the bare description or candidate with no
/// addressing at all. All of those collapse into this one shape on
/// deserialization; the payload itself stays opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct RelayEnvelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<SessionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<SessionId>,
    pub payload: Value,
}

const PAYLOAD_KEYS: [&str; 4] = ["payload", "offer", "answer", "candidate"];

impl RelayEnvelope {
    pub fn to(to: SessionId, payload: Value) -> Self {
        Self {
            from: None,
            to: Some(to),
            payload,
        }
    }

    /// Re-addressed copy handed to the receiving session.
    pub fn forwarded(&self, from: SessionId, to: SessionId) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            payload: self.payload.clone(),
        }
    }
}

fn session_field(map: &mut Map<String, Value>, key: &str) -> Result<Option<SessionId>, ProtocolError> {
    match map.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => s.parse().map(Some),
        Some(other) => Err(ProtocolError::InvalidSessionId(other.to_string())),
    }
}

impl TryFrom<Value> for RelayEnvelope {
    type Error = ProtocolError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let mut map = match value {
            Value::Object(map) if map.contains_key("from") || map.contains_key("to") => map,
            bare => {
                return Ok(Self {
                    from: None,
                    to: None,
                    payload: bare,
                });
            }
        };

        let from = session_field(&mut map, "from")?;
        let to = session_field(&mut map, "to")?;
        let payload = PAYLOAD_KEYS
            .iter()
            .find_map(|key| map.remove(*key))
            .unwrap_or(Value::Null);

        Ok(Self { from, to, payload })
    }
}
