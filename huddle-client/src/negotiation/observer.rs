use crate::negotiation::RemoteStream;
use async_trait::async_trait;
use huddle_core::PeerId;

/// Rendering side of the call: learns about peers and their media.
///
/// Every hook defaults to doing nothing.
#[async_trait]
pub trait NegotiationObserver: Send + Sync {
    async fn on_peer_joined(&self, _peer_id: &PeerId) {}

    async fn on_remote_stream(&self, _peer_id: &PeerId, _stream: RemoteStream) {}

    async fn on_peer_connected(&self, _peer_id: &PeerId) {}

    /// Called once per peer, after its session has been closed.
    async fn on_peer_removed(&self, _peer_id: &PeerId) {}
}
