use async_trait::async_trait;
use huddle_core::{IceCandidate, PeerId, SessionDescription};

/// Where the coordinator sends negotiation messages, addressed by destination peer.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn send_offer(&self, peer_id: PeerId, offer: SessionDescription);

    async fn send_answer(&self, peer_id: PeerId, answer: SessionDescription);

    async fn send_ice(&self, peer_id: PeerId, candidate: IceCandidate);
}
