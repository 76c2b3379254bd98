use huddle_core::{PeerId, RoomId, SignalingMessage};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, error};

/// Write side of one signaling connection as seen by the rooms.
#[derive(Debug, Clone)]
pub struct PeerHandle {
    peer_id: PeerId,
    outbox: mpsc::UnboundedSender<SignalingMessage>,
}

impl PeerHandle {
    pub fn new(peer_id: PeerId, outbox: mpsc::UnboundedSender<SignalingMessage>) -> Self {
        Self { peer_id, outbox }
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    /// Whether the connection's writer is still draining the outbox.
    pub fn is_open(&self) -> bool {
        !self.outbox.is_closed()
    }

    /// Queue a message for the connection. Returns `false` if the peer is gone.
    pub fn send(&self, msg: SignalingMessage) -> bool {
        if let Err(e) = self.outbox.send(msg) {
            error!(
                "Failed to queue {} for peer {}: writer closed",
                e.0.kind, self.peer_id
            );
            return false;
        }
        true
    }
}

/// Peers currently connected under one room id.
pub struct Room {
    id: RoomId,
    peers: HashMap<PeerId, PeerHandle>,
}

impl Room {
    pub fn new(id: RoomId) -> Self {
        Self {
            id,
            peers: HashMap::new(),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn contains(&self, peer_id: &PeerId) -> bool {
        self.peers.contains_key(peer_id)
    }

    pub fn get(&self, peer_id: &PeerId) -> Option<&PeerHandle> {
        self.peers.get(peer_id)
    }

    pub fn peer_ids(&self) -> Vec<PeerId> {
        self.peers.keys().cloned().collect()
    }

    /// Rendezvous: every open member and the newcomer learn about each other,
    /// then the newcomer is registered.
    ///
    /// Returns the ids that were announced to the newcomer.
    pub fn admit(&mut self, newcomer: PeerHandle) -> Vec<PeerId> {
        let mut present = Vec::with_capacity(self.peers.len());

        for (existing_id, existing) in &self.peers {
            if !existing.is_open() {
                debug!("Skipping closed peer {} in room {}", existing_id, self.id);
                continue;
            }

            existing.send(SignalingMessage::peer_joined(
                self.id.clone(),
                newcomer.peer_id().clone(),
            ));
            newcomer.send(SignalingMessage::peer_joined(
                self.id.clone(),
                existing_id.clone(),
            ));
            present.push(existing_id.clone());
        }

        self.peers.insert(newcomer.peer_id().clone(), newcomer);
        present
    }

    pub fn remove(&mut self, peer_id: &PeerId) -> Option<PeerHandle> {
        self.peers.remove(peer_id)
    }

    /// Send `msg` to every open member.
    pub fn broadcast(&self, msg: &SignalingMessage) {
        for peer in self.peers.values().filter(|p| p.is_open()) {
            peer.send(msg.clone());
        }
    }
}
