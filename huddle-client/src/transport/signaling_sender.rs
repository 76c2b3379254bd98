use crate::error::ClientError;
use crate::negotiation::SignalingOutput;
use crate::transport::ChannelKind;
use crate::transport::channel::{ChannelSender, Outbound};
use async_trait::async_trait;
use huddle_core::{IceCandidate, PeerId, RoomId, SessionDescription, SignalingMessage};
use tokio::sync::watch;
use tracing::warn;

/// The signaling channel currently owned by a transport, and its room.
#[derive(Clone)]
pub(crate) struct SignalingRoute {
    pub(crate) room_id: RoomId,
    pub(crate) channel: ChannelSender,
}

/// Addresses negotiation messages to peers over the signaling channel.
///
/// Always goes through the transport's current channel, so it keeps working
/// after `connect_signaling` replaces the channel.
#[derive(Clone)]
pub struct SignalingSender {
    route: watch::Receiver<Option<SignalingRoute>>,
}

impl SignalingSender {
    pub(crate) fn new(route: watch::Receiver<Option<SignalingRoute>>) -> Self {
        Self { route }
    }

    pub fn room_id(&self) -> Option<RoomId> {
        self.route
            .borrow()
            .as_ref()
            .map(|route| route.room_id.clone())
    }

    pub fn send(&self, msg: &SignalingMessage) -> Result<(), ClientError> {
        let route = self.route.borrow();
        let route = route
            .as_ref()
            .ok_or(ClientError::NotConnected(ChannelKind::Signaling))?;
        route.channel.send(Outbound::Text(msg.to_json()?))
    }

    fn send_logged(&self, build: impl FnOnce(RoomId) -> SignalingMessage) {
        let Some(room_id) = self.room_id() else {
            warn!("Signaling channel is gone; dropping message");
            return;
        };
        let msg = build(room_id);
        if let Err(e) = self.send(&msg) {
            warn!("Cannot send {} to {:?}: {}", msg.kind, msg.peer_id, e);
        }
    }
}

#[async_trait]
impl SignalingOutput for SignalingSender {
    async fn send_offer(&self, peer_id: PeerId, offer: SessionDescription) {
        self.send_logged(|room_id| SignalingMessage::offer(room_id, peer_id, &offer));
    }

    async fn send_answer(&self, peer_id: PeerId, answer: SessionDescription) {
        self.send_logged(|room_id| SignalingMessage::answer(room_id, peer_id, &answer));
    }

    async fn send_ice(&self, peer_id: PeerId, candidate: IceCandidate) {
        self.send_logged(|room_id| SignalingMessage::ice_candidate(room_id, peer_id, &candidate));
    }
}
