use crate::negotiation::NegotiationState;
use huddle_core::{PeerId, ProtocolError};
use thiserror::Error;

/// Failure scoped to a single peer relationship.
#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("no session for peer {0}")]
    UnknownPeer(PeerId),

    #[error("peer {peer}: cannot move from {from} to {to}")]
    InvalidTransition {
        peer: PeerId,
        from: NegotiationState,
        to: NegotiationState,
    },

    #[error(transparent)]
    Session(#[from] anyhow::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
