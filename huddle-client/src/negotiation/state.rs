use huddle_core::PeerId;
use std::fmt;

/// Offer/answer progress for one remote peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    New,
    HaveLocalOffer,
    HaveRemoteOffer,
    Stable,
    Closed,
    Failed,
}

impl NegotiationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }

    pub fn can_transition_to(self, next: NegotiationState) -> bool {
        use NegotiationState::*;

        if self.is_terminal() {
            return false;
        }
        match next {
            Closed | Failed => true,
            HaveLocalOffer | HaveRemoteOffer => matches!(self, New | Stable),
            Stable => matches!(self, HaveLocalOffer | HaveRemoteOffer),
            New => false,
        }
    }
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::New => "new",
            Self::HaveLocalOffer => "have-local-offer",
            Self::HaveRemoteOffer => "have-remote-offer",
            Self::Stable => "stable",
            Self::Closed => "closed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferRole {
    Offerer,
    Answerer,
}

/// Exactly one side of every pair offers: the one with the smaller id.
pub fn offer_role(local: &PeerId, remote: &PeerId) -> OfferRole {
    if local.as_str().as_bytes() < remote.as_str().as_bytes() {
        OfferRole::Offerer
    } else {
        OfferRole::Answerer
    }
}
