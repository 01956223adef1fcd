use crate::error::NegotiationError;
use crate::negotiation::{CandidateBuffer, PeerFactory, PeerTransport};
use beacon_core::{ClientSignal, PendingOfferQueue, RelayEnvelope, RoomName, SessionId};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

struct ViewerLink<P> {
    peer: P,
    candidates: CandidateBuffer,
}

/// Broadcaster side of every pair in a capture session.
///
/// Offer requests that arrive while not capturing are queued and answered in
/// request order when capture starts. At most one offer per viewer is
/// outstanding at a time.
pub struct BroadcasterSession<F: PeerFactory> {
    factory: F,
    capturing: bool,
    pending: PendingOfferQueue<SessionId>,
    outstanding: HashSet<SessionId>,
    peers: HashMap<SessionId, ViewerLink<F::Peer>>,
    candidate_capacity: usize,
}

impl<F: PeerFactory> BroadcasterSession<F> {
    pub fn new(factory: F, candidate_capacity: usize) -> Self {
        Self {
            factory,
            capturing: false,
            pending: PendingOfferQueue::new(),
            outstanding: HashSet::new(),
            peers: HashMap::new(),
            candidate_capacity,
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn has_outstanding_offer(&self, viewer: &SessionId) -> bool {
        self.outstanding.contains(viewer)
    }

    pub fn peer(&self, viewer: &SessionId) -> Option<&F::Peer> {
        self.peers.get(viewer).map(|link| &link.peer)
    }

    /// Goes live. Returns `live-started` followed by one offer per viewer that
    /// asked while we were not capturing, in the order they asked.
    pub async fn start_capture(&mut self, room: &RoomName) -> Vec<ClientSignal> {
        if self.capturing {
            return Vec::new();
        }
        self.capturing = true;
        info!(room = %room, "Capture started");

        let mut signals = vec![ClientSignal::LiveStarted(room.clone())];
        for viewer in self.pending.drain_all() {
            match self.offer_to(viewer).await {
                Ok(Some(offer)) => signals.push(offer),
                Ok(None) => {}
                Err(e) => warn!(session = %viewer, "Offer failed: {}", e),
            }
        }
        signals
    }

    /// Stops capturing and tears down every peer.
    pub async fn stop_capture(&mut self, room: &RoomName) -> ClientSignal {
        self.capturing = false;
        self.outstanding.clear();
        for (viewer, link) in self.peers.drain() {
            if let Err(e) = link.peer.close().await {
                debug!(session = %viewer, "Peer close failed: {:#}", e);
            }
        }
        info!(room = %room, "Capture stopped");
        ClientSignal::LiveStopped(room.clone())
    }

    pub async fn on_viewer_requested_offer(
        &mut self,
        viewer: SessionId,
    ) -> Result<Option<ClientSignal>, NegotiationError> {
        if !self.capturing {
            self.pending.enqueue(viewer);
            return Ok(None);
        }
        self.offer_to(viewer).await
    }

    async fn offer_to(&mut self, viewer: SessionId) -> Result<Option<ClientSignal>, NegotiationError> {
        if self.outstanding.contains(&viewer) {
            debug!(session = %viewer, "Offer already outstanding");
            return Ok(None);
        }

        if let Some(stale) = self.peers.remove(&viewer) {
            if let Err(e) = stale.peer.close().await {
                debug!(session = %viewer, "Stale peer close failed: {:#}", e);
            }
        }

        let peer = self.factory.create_peer(viewer).await?;
        let offer = peer.create_offer().await?;

        self.outstanding.insert(viewer);
        self.peers.insert(
            viewer,
            ViewerLink {
                peer,
                candidates: CandidateBuffer::new(self.candidate_capacity),
            },
        );
        Ok(Some(ClientSignal::WebrtcOffer(RelayEnvelope::to(viewer, offer))))
    }

    pub async fn on_answer(&mut self, answer: RelayEnvelope) -> Result<(), NegotiationError> {
        let viewer = answer.from.ok_or(NegotiationError::MissingSender)?;
        if !self.outstanding.remove(&viewer) {
            return Err(NegotiationError::UnexpectedAnswer(viewer));
        }
        let link = self
            .peers
            .get_mut(&viewer)
            .ok_or(NegotiationError::UnknownViewer(viewer))?;

        link.peer.set_remote_description(answer.payload).await?;
        for candidate in link.candidates.mark_remote_applied() {
            if let Err(e) = link.peer.add_ice_candidate(candidate).await {
                warn!(session = %viewer, "Held candidate rejected: {:#}", e);
            }
        }
        Ok(())
    }

    pub async fn on_remote_candidate(&mut self, candidate: RelayEnvelope) -> Result<(), NegotiationError> {
        let viewer = candidate.from.ok_or(NegotiationError::MissingSender)?;
        let link = self
            .peers
            .get_mut(&viewer)
            .ok_or(NegotiationError::UnknownViewer(viewer))?;

        if let Some(candidate) = link.candidates.push(candidate.payload) {
            link.peer.add_ice_candidate(candidate).await?;
        }
        Ok(())
    }

    /// Wraps one of our own candidates for `viewer`.
    pub fn local_candidate(&self, viewer: SessionId, candidate: Value) -> ClientSignal {
        ClientSignal::WebrtcIce(RelayEnvelope::to(viewer, candidate))
    }

    pub async fn on_peer_left(&mut self, viewer: SessionId) {
        self.pending.remove(&viewer);
        self.outstanding.remove(&viewer);
        if let Some(link) = self.peers.remove(&viewer) {
            if let Err(e) = link.peer.close().await {
                debug!(session = %viewer, "Peer close failed: {:#}", e);
            }
        }
    }
}
