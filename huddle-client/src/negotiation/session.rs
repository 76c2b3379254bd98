use anyhow::Result;
use async_trait::async_trait;
use huddle_core::{IceCandidate, PeerId, SessionDescription};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;
use webrtc::track::track_remote::TrackRemote;

/// Distinguishes successive sessions for the same peer, so events from a
/// replaced session can be told apart from the live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);

/// Transport-level connection state reported by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
}

/// Remote media handed to the observer.
#[derive(Clone)]
pub struct RemoteStream {
    pub stream_id: String,
    pub track_id: String,
    pub kind: MediaKind,
    /// The live track when backed by WebRTC.
    pub track: Option<Arc<TrackRemote>>,
}

impl fmt::Debug for RemoteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteStream")
            .field("stream_id", &self.stream_id)
            .field("track_id", &self.track_id)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Locally gathered candidate, to be trickled to the peer.
    IceCandidate(IceCandidate),
    RemoteStream(RemoteStream),
    StateChanged(SessionState),
}

/// A [`SessionEvent`] tagged with the session that produced it.
#[derive(Debug)]
pub struct SessionNotice {
    pub peer_id: PeerId,
    pub session_id: SessionId,
    pub event: SessionEvent,
}

/// Handed to a session on creation; the session reports through it.
#[derive(Clone)]
pub struct SessionEventSender {
    peer_id: PeerId,
    session_id: SessionId,
    tx: mpsc::Sender<SessionNotice>,
}

impl SessionEventSender {
    pub fn new(peer_id: PeerId, session_id: SessionId, tx: mpsc::Sender<SessionNotice>) -> Self {
        Self {
            peer_id,
            session_id,
            tx,
        }
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub async fn send(&self, event: SessionEvent) {
        let notice = SessionNotice {
            peer_id: self.peer_id.clone(),
            session_id: self.session_id,
            event,
        };
        if self.tx.send(notice).await.is_err() {
            debug!("Session event for {} dropped, coordinator is gone", self.peer_id);
        }
    }
}

/// One media session with one remote peer.
///
/// `create_offer` and `create_answer` also apply the result as the local
/// description.
#[async_trait]
pub trait PeerSession: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait PeerSessionFactory: Send + Sync {
    async fn create(
        &self,
        peer_id: &PeerId,
        events: SessionEventSender,
    ) -> Result<Box<dyn PeerSession>>;
}
