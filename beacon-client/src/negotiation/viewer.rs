use crate::error::NegotiationError;
use crate::negotiation::{CandidateBuffer, PeerTransport};
use beacon_core::{ClientSignal, RelayEnvelope, SessionId};
use serde_json::Value;
use tracing::{debug, warn};

/// Viewer side of one broadcaster–viewer pair: answers offers and applies the
/// broadcaster's candidates once the offer is in place.
pub struct ViewerNegotiator<P> {
    peer: P,
    broadcaster: Option<SessionId>,
    candidates: CandidateBuffer,
}

impl<P: PeerTransport> ViewerNegotiator<P> {
    pub fn new(peer: P, candidates: CandidateBuffer) -> Self {
        Self {
            peer,
            broadcaster: None,
            candidates,
        }
    }

    pub fn peer(&self) -> &P {
        &self.peer
    }

    pub fn broadcaster(&self) -> Option<SessionId> {
        self.broadcaster
    }

    pub fn request_offer() -> ClientSignal {
        ClientSignal::RequestOffer
    }

    /// Applies the offer, flushes held candidates and returns the answer to
    /// send back.
    pub async fn on_offer(&mut self, offer: RelayEnvelope) -> Result<ClientSignal, NegotiationError> {
        if offer.from.is_some() {
            self.broadcaster = offer.from;
        }

        self.candidates.expect_remote();
        self.peer.set_remote_description(offer.payload).await?;

        for candidate in self.candidates.mark_remote_applied() {
            if let Err(e) = self.peer.add_ice_candidate(candidate).await {
                warn!("Held candidate rejected: {:#}", e);
            }
        }

        let answer = self.peer.create_answer().await?;
        debug!("Answer created");
        Ok(ClientSignal::WebrtcAnswer(RelayEnvelope {
            from: None,
            to: self.broadcaster,
            payload: answer,
        }))
    }

    pub async fn on_remote_candidate(&mut self, candidate: RelayEnvelope) -> Result<(), NegotiationError> {
        if let Some(candidate) = self.candidates.push(candidate.payload) {
            self.peer.add_ice_candidate(candidate).await?;
        }
        Ok(())
    }

    /// Wraps one of our own candidates for the broadcaster.
    pub fn local_candidate(&self, candidate: Value) -> ClientSignal {
        ClientSignal::WebrtcIce(RelayEnvelope {
            from: None,
            to: self.broadcaster,
            payload: candidate,
        })
    }

    pub fn connected(&self) -> ClientSignal {
        ClientSignal::PeerConnected(RelayEnvelope {
            from: None,
            to: self.broadcaster,
            payload: Value::Null,
        })
    }

    pub async fn close(self) -> Result<(), NegotiationError> {
        self.peer.close().await?;
        Ok(())
    }
}
