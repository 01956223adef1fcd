use crate::relay::{ChunkRelay, PublishOutcome};
use crate::room::{Room, RoomRegistry};
use crate::signaling::{PairState, SignalingOutput};
use beacon_core::{
    Chunk, ClientSignal, JoinRequest, RelayEnvelope, Role, RoomName, ServerSignal, SessionId,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Dispatches every inbound client message.
///
/// Offers only travel broadcaster → viewer, answers and `peer-connected` only
/// viewer → broadcaster, and candidates either way once an offer is out. Any
/// message whose target is not a connected member of the sender's room is
/// dropped with a debug log.
#[derive(Clone)]
pub struct SignalingRouter {
    registry: Arc<RoomRegistry>,
    relay: ChunkRelay,
    output: Arc<dyn SignalingOutput>,
}

/// Which pair a routed message belongs to.
struct Route {
    target: SessionId,
    viewer: SessionId,
}

impl SignalingRouter {
    pub fn new(output: Arc<dyn SignalingOutput>) -> Self {
        let registry = Arc::new(RoomRegistry::new());
        Self {
            relay: ChunkRelay::new(registry.clone(), output.clone()),
            registry,
            output,
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn relay(&self) -> &ChunkRelay {
        &self.relay
    }

    pub fn handle_text(&self, session: SessionId, text: &str) {
        match serde_json::from_str::<ClientSignal>(text) {
            Ok(signal) => self.handle(session, signal),
            Err(e) => warn!(session = %session, "Invalid signal: {}", e),
        }
    }

    pub fn handle_binary(&self, session: SessionId, frame: &[u8]) {
        match Chunk::decode(frame) {
            Ok(chunk) => {
                self.publish_chunk(session, chunk);
            }
            Err(e) => warn!(session = %session, "Invalid chunk frame: {}", e),
        }
    }

    pub fn handle(&self, session: SessionId, signal: ClientSignal) {
        match signal {
            ClientSignal::JoinRoom(request) => self.join(session, request),
            ClientSignal::LeaveRoom => self.leave_room(session),
            ClientSignal::RequestOffer => self.request_offer(session),
            ClientSignal::WebrtcOffer(envelope) => self.route_offer(session, envelope),
            ClientSignal::WebrtcAnswer(envelope) => self.route_answer(session, envelope),
            ClientSignal::WebrtcIce(envelope) => self.route_ice(session, envelope),
            ClientSignal::PeerConnected(envelope) => self.peer_connected(session, envelope),
            ClientSignal::LiveStarted(room) => self.live_started(session, &room),
            ClientSignal::LiveStopped(room) => self.live_stopped(session, &room),
        }
    }

    /// Replies `joined-room`. A viewer then gets the live init segment, if
    /// any, and either an offer request to the broadcaster or a place in the
    /// pending queue. All of it happens before anything else can touch the
    /// room.
    pub fn join(&self, session: SessionId, request: JoinRequest) {
        let JoinRequest { room, role } = request;

        if self.registry.session(&session).is_some() {
            self.leave_room(session);
        }

        let joined = self.registry.join_with(session, &room, role, |entry, is_live| {
            self.send(
                &session,
                ServerSignal::JoinedRoom {
                    room: room.clone(),
                    is_live,
                },
            );
            if role == Role::Viewer {
                self.relay.send_init(entry, &session);
                self.request_offer_locked(entry, session);
            }
        });

        if let Err(e) = joined {
            warn!(room = %room, session = %session, "Join rejected: {}", e);
            self.send(
                &session,
                ServerSignal::JoinRejected {
                    room,
                    reason: e.to_string(),
                },
            );
        }
    }

    pub fn leave_room(&self, session: SessionId) {
        let Some(departure) = self.registry.leave(session) else {
            return;
        };

        for counterpart in &departure.counterparts {
            self.send(counterpart, ServerSignal::PeerLeft(session));
        }

        if departure.ended_live {
            info!(room = %departure.room, "Broadcaster left, live session ended");
            for member in &departure.remaining {
                self.send(member, ServerSignal::LiveStopped(departure.room.clone()));
            }
        }
    }

    pub fn disconnect(&self, session: SessionId) {
        self.leave_room(session);
        info!(session = %session, "Session disconnected");
    }

    pub fn request_offer(&self, viewer: SessionId) {
        let Some(record) = self.registry.session(&viewer) else {
            debug!(session = %viewer, "Offer request outside a room dropped");
            return;
        };

        self.registry.with_room(&record.room, |room| {
            if room.is_viewer(&viewer) {
                self.request_offer_locked(room, viewer);
            }
        });
    }

    fn request_offer_locked(&self, room: &mut Room, viewer: SessionId) {
        if room.pair_state(&viewer).offer_in_flight() {
            debug!(room = %room.name(), session = %viewer, "Offer already in flight");
            return;
        }

        match room.live_broadcaster() {
            Some(broadcaster) => {
                if self.send(&broadcaster, ServerSignal::ViewerRequestedOffer(viewer)) {
                    room.set_pair_state(viewer, PairState::OfferRequested);
                }
            }
            None => {
                if room.pending_offers.enqueue(viewer) {
                    debug!(room = %room.name(), session = %viewer, "Viewer queued for offer");
                }
            }
        }
    }

    pub fn route_offer(&self, from: SessionId, envelope: RelayEnvelope) {
        let Some(record) = self.registry.session(&from) else {
            return;
        };
        if !record.role.is_broadcaster() {
            debug!(session = %from, "Offer from a viewer dropped");
            return;
        }

        self.registry.with_room(&record.room, |room| {
            let Some(route) = resolve(room, from, envelope.to) else {
                debug!(room = %room.name(), session = %from, "Offer target unreachable");
                return;
            };
            let Some(next) = room.pair_state(&route.viewer).on_offer() else {
                debug!(room = %room.name(), session = %route.viewer, "Duplicate offer dropped");
                return;
            };

            let offer = envelope.forwarded(from, route.target);
            if self.send(&route.target, ServerSignal::WebrtcOffer(offer)) {
                room.pending_offers.remove(&route.viewer);
                room.set_pair_state(route.viewer, next);
            }
        });
    }

    pub fn route_answer(&self, from: SessionId, envelope: RelayEnvelope) {
        let Some(record) = self.registry.session(&from) else {
            return;
        };
        if record.role.is_broadcaster() {
            debug!(session = %from, "Answer from a broadcaster dropped");
            return;
        }

        self.registry.with_room(&record.room, |room| {
            let Some(route) = resolve(room, from, envelope.to) else {
                debug!(room = %room.name(), session = %from, "Answer target unreachable");
                return;
            };
            let Some(next) = room.pair_state(&route.viewer).on_answer() else {
                debug!(room = %room.name(), session = %from, "Answer without an offer dropped");
                return;
            };

            let answer = envelope.forwarded(from, route.target);
            if self.send(&route.target, ServerSignal::WebrtcAnswer(answer)) {
                room.set_pair_state(route.viewer, next);
            }
        });
    }

    pub fn route_ice(&self, from: SessionId, envelope: RelayEnvelope) {
        let Some(record) = self.registry.session(&from) else {
            return;
        };

        self.registry.with_room(&record.room, |room| {
            let Some(route) = resolve(room, from, envelope.to) else {
                debug!(room = %room.name(), session = %from, "Candidate target unreachable");
                return;
            };
            if !room.pair_state(&route.viewer).accepts_candidates() {
                debug!(room = %room.name(), session = %from, "Candidate before offer dropped");
                return;
            }

            let candidate = envelope.forwarded(from, route.target);
            self.send(&route.target, ServerSignal::WebrtcIce(candidate));
        });
    }

    /// Viewer reports its peer connection is up. Nothing is forwarded.
    pub fn peer_connected(&self, from: SessionId, envelope: RelayEnvelope) {
        let Some(record) = self.registry.session(&from) else {
            return;
        };
        if record.role.is_broadcaster() {
            return;
        }

        self.registry.with_room(&record.room, |room| {
            let Some(route) = resolve(room, from, envelope.to) else {
                return;
            };
            if let Some(next) = room.pair_state(&route.viewer).on_connected() {
                room.set_pair_state(route.viewer, next);
                info!(room = %room.name(), session = %from, "Viewer connected");
            }
        });
    }

    /// Marks the room live, tells its viewers and asks the broadcaster for
    /// one offer per queued viewer in the order they queued.
    pub fn live_started(&self, session: SessionId, room_name: &RoomName) {
        if !self.is_broadcaster_of(session, room_name) {
            debug!(room = %room_name, session = %session, "live-started from non-broadcaster dropped");
            return;
        }

        self.registry.with_room(room_name, |room| {
            if !room.mark_live() {
                return;
            }
            info!(room = %room_name, "Room is live");

            let viewers: Vec<SessionId> = room.viewers().collect();
            for viewer in &viewers {
                self.send(viewer, ServerSignal::LiveStarted(room_name.clone()));
            }

            for viewer in room.pending_offers.drain_all() {
                if room.is_viewer(&viewer) {
                    self.request_offer_locked(room, viewer);
                }
            }
        });
    }

    /// Ends the live session and re-queues every viewer for the next one.
    pub fn live_stopped(&self, session: SessionId, room_name: &RoomName) {
        if !self.is_broadcaster_of(session, room_name) {
            debug!(room = %room_name, session = %session, "live-stopped from non-broadcaster dropped");
            return;
        }

        self.registry.with_room(room_name, |room| {
            if !room.mark_ended() {
                return;
            }
            info!(room = %room_name, "Room is no longer live");

            let viewers: Vec<SessionId> = room.viewers().collect();
            for viewer in &viewers {
                self.send(viewer, ServerSignal::LiveStopped(room_name.clone()));
            }
            room.close_pairs();
        });
    }

    /// Only the room's broadcaster may publish, and only into its own room.
    pub fn publish_chunk(&self, session: SessionId, chunk: Chunk) -> Option<PublishOutcome> {
        if !self.is_broadcaster_of(session, &chunk.room) {
            debug!(room = %chunk.room, session = %session, "Chunk from non-broadcaster dropped");
            return None;
        }

        let room = chunk.room.clone();
        match self.relay.publish(chunk) {
            Ok(PublishOutcome::NotLive) => {
                debug!(room = %room, "Chunk for a room that is not live dropped");
                Some(PublishOutcome::NotLive)
            }
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!(room = %room, session = %session, "Chunk not relayed: {}", e);
                None
            }
        }
    }

    fn is_broadcaster_of(&self, session: SessionId, room: &RoomName) -> bool {
        self.registry
            .session(&session)
            .is_some_and(|record| record.role.is_broadcaster() && &record.room == room)
    }

    fn send(&self, to: &SessionId, signal: ServerSignal) -> bool {
        match self.output.send_signal(to, signal) {
            Ok(()) => true,
            Err(e) => {
                debug!(session = %to, "Signal not delivered: {}", e);
                false
            }
        }
    }
}

/// Finds the other end of a message from `from`. A viewer may leave `to` out,
/// which means the room's broadcaster.
fn resolve(room: &Room, from: SessionId, to: Option<SessionId>) -> Option<Route> {
    let broadcaster = room.broadcaster()?;

    if from == broadcaster {
        let viewer = to.filter(|to| room.is_viewer(to))?;
        Some(Route {
            target: viewer,
            viewer,
        })
    } else if room.is_viewer(&from) {
        match to {
            Some(to) if to != broadcaster => None,
            _ => Some(Route {
                target: broadcaster,
                viewer: from,
            }),
        }
    } else {
        None
    }
}
