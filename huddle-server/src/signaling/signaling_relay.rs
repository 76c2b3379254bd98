use crate::room::{LeaveOutcome, PeerHandle, RoomRegistry};
use huddle_core::{PeerId, RoomId, SignalKind, SignalingMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Why a directed message was not delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The sender has not joined a room yet.
    NotInRoom,
    /// The message carried no destination `peerId`.
    MissingTarget,
    /// The destination is not a member of the sender's room.
    UnknownTarget,
    /// The destination is registered but its writer is gone.
    Unreachable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardOutcome {
    Delivered,
    Dropped(DropReason),
}

/// Protocol state of one signaling connection.
///
/// Every inbound message is handled to completion before the next one is
/// read, so the registry only ever sees short, non-blocking mutations.
pub struct SignalingRelay {
    registry: Arc<RoomRegistry>,
    handle: PeerHandle,
    room: Option<RoomId>,
}

impl SignalingRelay {
    /// Assign a fresh peer id to a new connection whose writer drains `outbox`.
    pub fn new(registry: Arc<RoomRegistry>, outbox: mpsc::UnboundedSender<SignalingMessage>) -> Self {
        Self {
            registry,
            handle: PeerHandle::new(PeerId::new(), outbox),
            room: None,
        }
    }

    pub fn peer_id(&self) -> &PeerId {
        self.handle.peer_id()
    }

    pub fn room_id(&self) -> Option<&RoomId> {
        self.room.as_ref()
    }

    /// Entry point for raw text frames. Malformed input is logged and skipped.
    pub fn handle_text(&mut self, text: &str) {
        match SignalingMessage::parse(text) {
            Ok(msg) => self.handle_message(msg),
            Err(e) => warn!("Invalid signaling message from {}: {}", self.peer_id(), e),
        }
    }

    pub fn handle_message(&mut self, msg: SignalingMessage) {
        match msg.kind {
            SignalKind::JoinRoom => self.join(msg.room_id),
            kind if kind.is_directed() => {
                if let ForwardOutcome::Dropped(reason) = self.forward(msg) {
                    debug!("Dropped {} from {}: {:?}", kind, self.peer_id(), reason);
                }
            }
            kind => debug!("Ignoring relay-only {} from {}", kind, self.peer_id()),
        }
    }

    /// Run the rendezvous for `room_id`, leaving the current room first.
    pub fn join(&mut self, room_id: RoomId) {
        if room_id.is_empty() {
            warn!("Peer {} sent join-room without a room id", self.peer_id());
            return;
        }
        if self.room.is_some() {
            self.leave();
        }

        let present = self.registry.join(&room_id, self.handle.clone());
        self.handle.send(SignalingMessage::room_peers(
            room_id.clone(),
            self.peer_id().clone(),
            present,
        ));
        self.room = Some(room_id);
    }

    /// Deliver an offer, answer or candidate to its destination within the
    /// sender's room, stamping the sender's id as the origin.
    pub fn forward(&self, msg: SignalingMessage) -> ForwardOutcome {
        let Some(room_id) = &self.room else {
            return ForwardOutcome::Dropped(DropReason::NotInRoom);
        };
        let Ok(target) = msg.peer() else {
            return ForwardOutcome::Dropped(DropReason::MissingTarget);
        };
        let Some(destination) = self.registry.resolve(room_id, target) else {
            return ForwardOutcome::Dropped(DropReason::UnknownTarget);
        };
        if !destination.is_open() || !destination.send(msg.with_peer(self.peer_id().clone())) {
            return ForwardOutcome::Dropped(DropReason::Unreachable);
        }
        ForwardOutcome::Delivered
    }

    /// Disconnect path; safe to call more than once.
    pub fn disconnect(&mut self) -> Option<LeaveOutcome> {
        info!("Peer {} disconnected", self.peer_id());
        self.leave()
    }

    fn leave(&mut self) -> Option<LeaveOutcome> {
        let room_id = self.room.take()?;
        Some(self.registry.leave(&room_id, self.peer_id()))
    }
}
