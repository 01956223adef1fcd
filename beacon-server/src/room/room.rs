use crate::signaling::PairState;
use beacon_core::{Chunk, PendingOfferQueue, Role, RoomName, SessionId};
use std::collections::HashMap;

/// Registry record for one room. Only reachable through [`crate::RoomRegistry`],
/// which hands it out under the room's entry guard.
#[derive(Debug)]
pub struct Room {
    name: RoomName,
    /// Join order is kept so re-queued viewers come back out in it.
    members: Vec<(SessionId, Role)>,
    broadcaster: Option<SessionId>,
    is_live: bool,
    init_segment: Option<Chunk>,
    pub(crate) pending_offers: PendingOfferQueue<SessionId>,
    pairs: HashMap<SessionId, PairState>,
}

impl Room {
    pub(crate) fn new(name: RoomName) -> Self {
        Self {
            name,
            members: Vec::new(),
            broadcaster: None,
            is_live: false,
            init_segment: None,
            pending_offers: PendingOfferQueue::new(),
            pairs: HashMap::new(),
        }
    }

    pub fn name(&self) -> &RoomName {
        &self.name
    }

    pub fn is_live(&self) -> bool {
        self.is_live
    }

    pub fn broadcaster(&self) -> Option<SessionId> {
        self.broadcaster
    }

    /// Broadcaster that can answer offer requests right now.
    pub fn live_broadcaster(&self) -> Option<SessionId> {
        self.broadcaster.filter(|_| self.is_live)
    }

    pub fn init_segment(&self) -> Option<&Chunk> {
        self.init_segment.as_ref()
    }

    /// What a viewer joining mid-stream must be given before anything else.
    pub fn live_init_segment(&self) -> Option<&Chunk> {
        self.init_segment.as_ref().filter(|_| self.is_live)
    }

    pub fn members(&self) -> impl Iterator<Item = SessionId> + '_ {
        self.members.iter().map(|(id, _)| *id)
    }

    pub fn viewers(&self) -> impl Iterator<Item = SessionId> + '_ {
        self.members
            .iter()
            .filter(|(_, role)| !role.is_broadcaster())
            .map(|(id, _)| *id)
    }

    pub fn role_of(&self, session: &SessionId) -> Option<Role> {
        self.members
            .iter()
            .find(|(id, _)| id == session)
            .map(|(_, role)| *role)
    }

    pub fn is_viewer(&self, session: &SessionId) -> bool {
        self.role_of(session) == Some(Role::Viewer)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn pending_len(&self) -> usize {
        self.pending_offers.len()
    }

    pub fn is_pending(&self, viewer: &SessionId) -> bool {
        self.pending_offers.contains(viewer)
    }

    pub fn pair_state(&self, viewer: &SessionId) -> PairState {
        self.pairs.get(viewer).copied().unwrap_or_default()
    }

    pub(crate) fn set_pair_state(&mut self, viewer: SessionId, state: PairState) {
        self.pairs.insert(viewer, state);
    }

    pub(crate) fn add_member(&mut self, session: SessionId, role: Role) {
        if role.is_broadcaster() {
            self.broadcaster = Some(session);
        }
        self.members.push((session, role));
    }

    /// Drops the session and everything queued for it. Returns its role.
    pub(crate) fn remove_member(&mut self, session: &SessionId) -> Option<Role> {
        let index = self.members.iter().position(|(id, _)| id == session)?;
        let (_, role) = self.members.remove(index);
        self.pending_offers.remove(session);
        if self.broadcaster == Some(*session) {
            self.broadcaster = None;
        }
        Some(role)
    }

    /// Removes a viewer's pair. Returns whether it was still open.
    pub(crate) fn forget_pair(&mut self, viewer: &SessionId) -> bool {
        matches!(self.pairs.remove(viewer), Some(state) if state != PairState::Closed)
    }

    /// Closes every pair and puts their viewers back in line for the next
    /// live session. Returns the viewers whose pair was open.
    pub(crate) fn close_pairs(&mut self) -> Vec<SessionId> {
        let mut closed = Vec::new();
        for (viewer, state) in self.pairs.iter_mut() {
            if *state != PairState::Closed {
                closed.push(*viewer);
                *state = PairState::Closed;
            }
        }

        let waiting: Vec<SessionId> = self.viewers().collect();
        for viewer in waiting {
            self.pending_offers.enqueue(viewer);
        }
        closed
    }

    /// Returns `true` when the room was not live before.
    pub(crate) fn mark_live(&mut self) -> bool {
        if self.is_live {
            return false;
        }
        self.is_live = true;
        self.init_segment = None;
        true
    }

    /// Returns `true` when the room was live before. The init segment is
    /// cleared either way.
    pub(crate) fn mark_ended(&mut self) -> bool {
        let was_live = self.is_live;
        self.is_live = false;
        self.init_segment = None;
        was_live
    }

    pub(crate) fn cache_init_segment(&mut self, chunk: Chunk) {
        self.init_segment = Some(chunk);
    }

    pub(crate) fn is_disposable(&self) -> bool {
        self.members.is_empty() && !self.is_live
    }
}
