/// Negotiation progress between a room's broadcaster and one of its viewers.
///
/// `OfferRequested` is relay-internal: the viewer's request has been passed to
/// the broadcaster but no offer has come back yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PairState {
    #[default]
    Unconnected,
    OfferRequested,
    OfferSent,
    Answered,
    Connected,
    Closed,
}

impl PairState {
    /// At most one offer may be outstanding per pair.
    pub fn offer_in_flight(self) -> bool {
        matches!(self, PairState::OfferRequested | PairState::OfferSent)
    }

    pub fn on_offer(self) -> Option<PairState> {
        match self {
            PairState::OfferSent => None,
            _ => Some(PairState::OfferSent),
        }
    }

    pub fn on_answer(self) -> Option<PairState> {
        match self {
            PairState::OfferSent => Some(PairState::Answered),
            _ => None,
        }
    }

    /// Candidates may trail or overtake the answer, but never precede the offer.
    pub fn accepts_candidates(self) -> bool {
        matches!(
            self,
            PairState::OfferSent | PairState::Answered | PairState::Connected
        )
    }

    pub fn on_connected(self) -> Option<PairState> {
        match self {
            PairState::Answered | PairState::Connected => Some(PairState::Connected),
            _ => None,
        }
    }
}
