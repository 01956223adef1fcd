use crate::error::RegistryError;
use crate::room::Room;
use beacon_core::{Role, RoomName, SessionId};
use dashmap::DashMap;
use std::collections::HashSet;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub room: RoomName,
    pub role: Role,
}

/// What [`RoomRegistry::leave`] tore down, so the caller can tell the peers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub room: RoomName,
    pub role: Role,
    /// The broadcaster left a live room and the room was marked ended.
    pub ended_live: bool,
    /// Sessions that had an open pair with the departed one.
    pub counterparts: Vec<SessionId>,
    /// Members still in the room afterwards.
    pub remaining: Vec<SessionId>,
}

/// Owns every room and session record.
///
/// Rooms and sessions live in separate maps and no guard of one is held while
/// the other is locked. All work on a room runs under that room's entry guard,
/// so operations on one room are serialized while different rooms proceed in
/// parallel.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: DashMap<RoomName, Room>,
    sessions: DashMap<SessionId, SessionRecord>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the session to `room` and reports whether the room is live.
    pub fn join(&self, session: SessionId, room: &RoomName, role: Role) -> Result<bool, RegistryError> {
        self.join_with(session, room, role, |_, is_live| is_live)
    }

    /// Joins and then runs `f` under the same room guard, before any other
    /// operation on the room can observe the new member.
    ///
    /// A session already in a room must [`leave`](Self::leave) it first, so
    /// the caller gets the [`Departure`] to notify.
    pub fn join_with<R>(
        &self,
        session: SessionId,
        room: &RoomName,
        role: Role,
        f: impl FnOnce(&mut Room, bool) -> R,
    ) -> Result<R, RegistryError> {
        if let Some(current) = self.session(&session) {
            return Err(RegistryError::AlreadyInRoom { room: current.room });
        }

        let result = {
            let mut entry = self
                .rooms
                .entry(room.clone())
                .or_insert_with(|| Room::new(room.clone()));

            if role.is_broadcaster() && entry.broadcaster().is_some() {
                Err(RegistryError::BroadcasterPresent { room: room.clone() })
            } else {
                entry.add_member(session, role);
                let is_live = entry.is_live();
                Ok(f(&mut entry, is_live))
            }
        };

        match &result {
            Ok(_) => {
                self.sessions.insert(
                    session,
                    SessionRecord {
                        room: room.clone(),
                        role,
                    },
                );
                info!(room = %room, session = %session, role = ?role, "Session joined room");
            }
            Err(_) => self.dispose_if_idle(room),
        }

        result
    }

    /// Removes the session from its room. A departing broadcaster ends the
    /// room's live session so viewers are not left on a dead stream.
    pub fn leave(&self, session: SessionId) -> Option<Departure> {
        let (_, record) = self.sessions.remove(&session)?;

        let departure = self.with_room(&record.room, |room| {
            let role = room.remove_member(&session)?;
            let mut counterparts = Vec::new();
            let mut ended_live = false;

            if role.is_broadcaster() {
                ended_live = room.mark_ended();
                counterparts = room.close_pairs();
            } else if room.forget_pair(&session) {
                counterparts.extend(room.broadcaster());
            }

            Some(Departure {
                room: record.room.clone(),
                role,
                ended_live,
                counterparts,
                remaining: room.members().collect(),
            })
        });

        self.dispose_if_idle(&record.room);
        info!(room = %record.room, session = %session, "Session left room");
        departure.flatten()
    }

    /// Idempotent. Returns `true` only on the not-live → live transition.
    pub fn mark_live(&self, room: &RoomName) -> bool {
        let mut entry = self
            .rooms
            .entry(room.clone())
            .or_insert_with(|| Room::new(room.clone()));
        entry.mark_live()
    }

    /// Idempotent; always clears the cached init segment.
    pub fn mark_ended(&self, room: &RoomName) -> bool {
        let ended = self.with_room(room, |room| room.mark_ended()).unwrap_or(false);
        self.dispose_if_idle(room);
        ended
    }

    pub fn is_live(&self, room: &RoomName) -> bool {
        self.rooms.get(room).is_some_and(|room| room.is_live())
    }

    pub fn list_live_rooms(&self) -> HashSet<RoomName> {
        self.rooms
            .iter()
            .filter(|entry| entry.is_live())
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn session(&self, session: &SessionId) -> Option<SessionRecord> {
        self.sessions.get(session).map(|record| record.clone())
    }

    pub fn members(&self, room: &RoomName) -> Vec<SessionId> {
        self.inspect(room, |room| room.members().collect())
            .unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Read-only look at a room under its guard.
    pub fn inspect<R>(&self, room: &RoomName, f: impl FnOnce(&Room) -> R) -> Option<R> {
        self.rooms.get(room).map(|room| f(&room))
    }

    pub(crate) fn with_room<R>(&self, room: &RoomName, f: impl FnOnce(&mut Room) -> R) -> Option<R> {
        self.rooms.get_mut(room).map(|mut room| f(&mut room))
    }

    fn dispose_if_idle(&self, room: &RoomName) {
        if self.rooms.remove_if(room, |_, room| room.is_disposable()).is_some() {
            debug!(room = %room, "Room disposed");
        }
    }
}
