use crate::error::ProtocolError;
use crate::model::peer::PeerId;
use crate::model::room::RoomId;
use crate::model::session::{IceCandidate, SessionDescription};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalKind {
    JoinRoom,
    Offer,
    Answer,
    IceCandidate,
    PeerJoined,
    PeerLeft,
    RoomPeers,
}

impl SignalKind {
    /// Offers, answers and candidates are addressed to a single peer and
    /// relayed; everything else is produced or consumed by the relay itself.
    pub fn is_directed(self) -> bool {
        matches!(self, Self::Offer | Self::Answer | Self::IceCandidate)
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::JoinRoom => "join-room",
            Self::Offer => "offer",
            Self::Answer => "answer",
            Self::IceCandidate => "ice-candidate",
            Self::PeerJoined => "peer-joined",
            Self::PeerLeft => "peer-left",
            Self::RoomPeers => "room-peers",
        };
        f.write_str(name)
    }
}

/// Envelope exchanged on the signaling socket.
///
/// On directed messages `peer_id` names the destination when sent by a client
/// and the origin when delivered by the relay. On `room-peers` it carries the
/// recipient's own id. `data` stays opaque so the relay can forward payloads
/// without understanding them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalingMessage {
    #[serde(rename = "type")]
    pub kind: SignalKind,
    pub room_id: RoomId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_id: Option<PeerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peers: Option<Vec<PeerId>>,
}

impl SignalingMessage {
    fn bare(kind: SignalKind, room_id: RoomId) -> Self {
        Self {
            kind,
            room_id,
            peer_id: None,
            data: None,
            peers: None,
        }
    }

    pub fn join_room(room_id: RoomId) -> Self {
        Self::bare(SignalKind::JoinRoom, room_id)
    }

    pub fn peer_joined(room_id: RoomId, peer_id: PeerId) -> Self {
        Self {
            peer_id: Some(peer_id),
            ..Self::bare(SignalKind::PeerJoined, room_id)
        }
    }

    pub fn peer_left(room_id: RoomId, peer_id: PeerId) -> Self {
        Self {
            peer_id: Some(peer_id),
            ..Self::bare(SignalKind::PeerLeft, room_id)
        }
    }

    pub fn room_peers(room_id: RoomId, recipient: PeerId, peers: Vec<PeerId>) -> Self {
        Self {
            peer_id: Some(recipient),
            peers: Some(peers),
            ..Self::bare(SignalKind::RoomPeers, room_id)
        }
    }

    pub fn offer(room_id: RoomId, peer_id: PeerId, offer: &SessionDescription) -> Self {
        Self::directed(SignalKind::Offer, room_id, peer_id, offer)
    }

    pub fn answer(room_id: RoomId, peer_id: PeerId, answer: &SessionDescription) -> Self {
        Self::directed(SignalKind::Answer, room_id, peer_id, answer)
    }

    pub fn ice_candidate(room_id: RoomId, peer_id: PeerId, candidate: &IceCandidate) -> Self {
        Self::directed(SignalKind::IceCandidate, room_id, peer_id, candidate)
    }

    fn directed<T: Serialize>(kind: SignalKind, room_id: RoomId, peer_id: PeerId, data: &T) -> Self {
        Self {
            peer_id: Some(peer_id),
            // Plain structs of strings and integers always convert.
            data: serde_json::to_value(data).ok(),
            ..Self::bare(kind, room_id)
        }
    }

    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// The peer this message refers to: destination on the way in, origin on the way out.
    pub fn peer(&self) -> Result<&PeerId, ProtocolError> {
        self.peer_id
            .as_ref()
            .ok_or(ProtocolError::MissingPeer(self.kind))
    }

    /// Same message with `peer_id` replaced, used by the relay to stamp the origin.
    pub fn with_peer(mut self, peer_id: PeerId) -> Self {
        self.peer_id = Some(peer_id);
        self
    }

    pub fn description(&self) -> Result<SessionDescription, ProtocolError> {
        self.payload()
    }

    pub fn candidate(&self) -> Result<IceCandidate, ProtocolError> {
        self.payload()
    }

    fn payload<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        let data = self
            .data
            .clone()
            .ok_or(ProtocolError::MissingPayload(self.kind))?;
        serde_json::from_value(data).map_err(|source| ProtocolError::InvalidPayload {
            kind: self.kind,
            source,
        })
    }
}
