use crate::room::{PeerHandle, Room};
use dashmap::DashMap;
use huddle_core::{PeerId, RoomId, SignalingMessage};
use tracing::info;

/// Result of removing a peer from its room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The peer was the last member; the room no longer exists.
    RoomDeleted,
    /// The remaining members were sent `peer-left`.
    PeersRemaining(usize),
    /// The room or the peer was not registered.
    NotMember,
}

/// Authoritative map from room id to the peers connected under it.
///
/// A room exists exactly while it has at least one member. Each operation
/// holds the room's shard only for map updates and unbounded channel sends,
/// never across an await point.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: DashMap<RoomId, Room>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handle` in `room_id`, creating the room on first join.
    ///
    /// Returns the peers that were already present.
    pub fn join(&self, room_id: &RoomId, handle: PeerHandle) -> Vec<PeerId> {
        let peer_id = handle.peer_id().clone();
        let mut room = self.rooms.entry(room_id.clone()).or_insert_with(|| {
            info!("Creating new room: {}", room_id);
            Room::new(room_id.clone())
        });

        let present = room.admit(handle);
        info!(
            "Peer {} joined room {}. Total peers: {}",
            peer_id,
            room_id,
            room.len()
        );
        present
    }

    /// Remove `peer_id` from `room_id`, announcing the departure to whoever
    /// is left and deleting the room once it is empty.
    pub fn leave(&self, room_id: &RoomId, peer_id: &PeerId) -> LeaveOutcome {
        let remaining = {
            let Some(mut room) = self.rooms.get_mut(room_id) else {
                return LeaveOutcome::NotMember;
            };
            if room.remove(peer_id).is_none() {
                return LeaveOutcome::NotMember;
            }
            if !room.is_empty() {
                room.broadcast(&SignalingMessage::peer_left(
                    room_id.clone(),
                    peer_id.clone(),
                ));
            }
            room.len()
        };

        if remaining > 0 {
            info!("Room {} has {} peer(s) remaining", room_id, remaining);
            return LeaveOutcome::PeersRemaining(remaining);
        }

        // A concurrent join may have refilled the room after the guard dropped.
        match self.rooms.remove_if(room_id, |_, room| room.is_empty()) {
            Some(_) => {
                info!("Room {} deleted (empty)", room_id);
                LeaveOutcome::RoomDeleted
            }
            None => LeaveOutcome::PeersRemaining(self.peer_count(room_id)),
        }
    }

    /// Look up a member of `room_id` for directed delivery.
    pub fn resolve(&self, room_id: &RoomId, peer_id: &PeerId) -> Option<PeerHandle> {
        self.rooms
            .get(room_id)
            .and_then(|room| room.get(peer_id).cloned())
    }

    pub fn contains_room(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn peer_count(&self, room_id: &RoomId) -> usize {
        self.rooms.get(room_id).map(|room| room.len()).unwrap_or(0)
    }

    pub fn peers(&self, room_id: &RoomId) -> Vec<PeerId> {
        self.rooms
            .get(room_id)
            .map(|room| room.peer_ids())
            .unwrap_or_default()
    }
}
