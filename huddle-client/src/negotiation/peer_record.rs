use crate::negotiation::{NegotiationError, NegotiationState, PeerSession, SessionId};
use huddle_core::PeerId;
use tracing::debug;

pub(crate) struct PeerRecord {
    pub(crate) peer_id: PeerId,
    pub(crate) session_id: SessionId,
    pub(crate) session: Box<dyn PeerSession>,
    pub(crate) state: NegotiationState,
    pub(crate) connected: bool,
}

impl PeerRecord {
    pub(crate) fn new(peer_id: PeerId, session_id: SessionId, session: Box<dyn PeerSession>) -> Self {
        Self {
            peer_id,
            session_id,
            session,
            state: NegotiationState::New,
            connected: false,
        }
    }

    pub(crate) fn transition(&mut self, next: NegotiationState) -> Result<(), NegotiationError> {
        if !self.state.can_transition_to(next) {
            return Err(NegotiationError::InvalidTransition {
                peer: self.peer_id.clone(),
                from: self.state,
                to: next,
            });
        }
        debug!("Peer {}: {} -> {}", self.peer_id, self.state, next);
        self.state = next;
        Ok(())
    }
}
