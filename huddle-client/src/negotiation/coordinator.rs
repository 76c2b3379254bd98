use crate::negotiation::peer_record::PeerRecord;
use crate::negotiation::{
    NegotiationError, NegotiationObserver, NegotiationState, OfferRole, PeerSessionFactory,
    SessionEvent, SessionEventSender, SessionId, SessionNotice, SessionState, SignalingOutput,
    offer_role,
};
use huddle_core::{IceCandidate, PeerId, RoomId, SessionDescription, SignalKind, SignalingMessage};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Capacity of the session event queue feeding [`NegotiationCoordinator::run`].
pub const SESSION_EVENT_BUFFER: usize = 256;

/// What the call glue feeds a [`NegotiationCoordinator`].
#[derive(Debug, Clone)]
pub enum CoordinatorInput {
    Signal(SignalingMessage),
    /// The signaling socket went down. Our relay-assigned id died with it.
    SignalingLost,
}

impl From<SignalingMessage> for CoordinatorInput {
    fn from(msg: SignalingMessage) -> Self {
        Self::Signal(msg)
    }
}

/// Drives offer/answer for every remote peer in one room.
///
/// Owns one [`PeerSession`](crate::negotiation::PeerSession) per peer.
/// Signaling messages and session events are handled one at a time, so no
/// state is shared between peers.
pub struct NegotiationCoordinator {
    room_id: RoomId,
    local_id: Option<PeerId>,
    /// Id of the signaling connection that was lost, until `room-peers`
    /// names its successor.
    previous_id: Option<PeerId>,
    peers: HashMap<PeerId, PeerRecord>,
    /// `peer-joined` received before our own id was known.
    pending_joins: Vec<PeerId>,
    next_session: u64,
    factory: Arc<dyn PeerSessionFactory>,
    signaling: Arc<dyn SignalingOutput>,
    observer: Arc<dyn NegotiationObserver>,
    session_tx: mpsc::Sender<SessionNotice>,
}

impl NegotiationCoordinator {
    pub fn new(
        room_id: RoomId,
        factory: Arc<dyn PeerSessionFactory>,
        signaling: Arc<dyn SignalingOutput>,
        observer: Arc<dyn NegotiationObserver>,
        session_tx: mpsc::Sender<SessionNotice>,
    ) -> Self {
        Self {
            room_id,
            local_id: None,
            previous_id: None,
            peers: HashMap::new(),
            pending_joins: Vec::new(),
            next_session: 1,
            factory,
            signaling,
            observer,
            session_tx,
        }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Our id as assigned by the relay, once `room-peers` has arrived.
    pub fn local_id(&self) -> Option<&PeerId> {
        self.local_id.as_ref()
    }

    pub fn peer_ids(&self) -> Vec<PeerId> {
        self.peers.keys().cloned().collect()
    }

    pub fn state_of(&self, peer_id: &PeerId) -> Option<NegotiationState> {
        self.peers.get(peer_id).map(|record| record.state)
    }

    pub fn is_connected_to(&self, peer_id: &PeerId) -> bool {
        self.peers.get(peer_id).is_some_and(|record| record.connected)
    }

    pub async fn run(
        mut self,
        mut input_rx: mpsc::UnboundedReceiver<CoordinatorInput>,
        mut session_rx: mpsc::Receiver<SessionNotice>,
    ) {
        info!("Negotiation loop started for room {}", self.room_id);

        loop {
            tokio::select! {
                input = input_rx.recv() => match input {
                    Some(input) => self.handle_input(input).await,
                    None => {
                        info!("Signaling queue closed. Closing all sessions.");
                        break;
                    }
                },

                notice = session_rx.recv() => match notice {
                    Some(notice) => self.handle_session_notice(notice).await,
                    None => {
                        warn!("Session event channel closed unexpectedly");
                        break;
                    }
                },
            }
        }

        self.close_all().await;
        info!("Negotiation loop finished");
    }

    pub async fn handle_input(&mut self, input: CoordinatorInput) {
        match input {
            CoordinatorInput::Signal(msg) => self.handle_signal(msg).await,
            CoordinatorInput::SignalingLost => self.on_signaling_lost(),
        }
    }

    /// Forget our id so that `peer-joined` sent ahead of the next `room-peers`
    /// waits for the new one. Sessions stay up until that `room-peers` arrives.
    pub fn on_signaling_lost(&mut self) {
        if let Some(id) = self.local_id.take() {
            info!("Signaling lost; id {} is no longer valid", id);
            self.previous_id = Some(id);
        }
        self.pending_joins.clear();
    }

    pub async fn handle_signal(&mut self, msg: SignalingMessage) {
        let kind = msg.kind;
        match self.dispatch_signal(msg).await {
            Ok(()) => {}
            Err(NegotiationError::UnknownPeer(peer)) => {
                debug!("Dropping {} for unknown peer {}", kind, peer);
            }
            Err(e) => warn!("Failed to handle {}: {}", kind, e),
        }
    }

    async fn dispatch_signal(&mut self, msg: SignalingMessage) -> Result<(), NegotiationError> {
        if msg.room_id != self.room_id {
            debug!("Ignoring {} for room {}", msg.kind, msg.room_id);
            return Ok(());
        }

        match msg.kind {
            SignalKind::RoomPeers => {
                let own = msg.peer()?.clone();
                self.on_room_peers(own, msg.peers.unwrap_or_default()).await;
                Ok(())
            }
            SignalKind::PeerJoined => {
                let peer = msg.peer()?.clone();
                self.on_peer_joined(peer).await
            }
            SignalKind::PeerLeft => {
                let peer = msg.peer()?.clone();
                info!("Peer {} left room {}", peer, self.room_id);
                self.remove_peer(&peer).await;
                Ok(())
            }
            SignalKind::Offer => {
                let from = msg.peer()?.clone();
                self.on_offer(from, msg.description()?).await
            }
            SignalKind::Answer => {
                let from = msg.peer()?.clone();
                self.on_answer(from, msg.description()?).await
            }
            SignalKind::IceCandidate => {
                let from = msg.peer()?.clone();
                self.on_remote_candidate(from, msg.candidate()?).await
            }
            SignalKind::JoinRoom => {
                debug!("Ignoring join-room echoed by the relay");
                Ok(())
            }
        }
    }

    async fn on_room_peers(&mut self, own: PeerId, peers: Vec<PeerId>) {
        let previous = self.local_id.take().or_else(|| self.previous_id.take());
        self.previous_id = None;
        let pending = std::mem::take(&mut self.pending_joins);

        if previous.is_some_and(|id| id != own) {
            info!("Rejoined as {}; dropping sessions of the previous connection", own);
            self.close_all().await;
        }

        info!(
            "Joined room {} as {} with {} peer(s)",
            self.room_id,
            own,
            peers.len()
        );
        self.local_id = Some(own);

        for peer in pending.into_iter().chain(peers) {
            if let Err(e) = self.on_peer_joined(peer).await {
                warn!("Failed to set up peer: {}", e);
            }
        }
    }

    async fn on_peer_joined(&mut self, peer: PeerId) -> Result<(), NegotiationError> {
        let Some(local) = self.local_id.clone() else {
            if !self.pending_joins.contains(&peer) {
                debug!("Deferring peer-joined {} until our id is known", peer);
                self.pending_joins.push(peer);
            }
            return Ok(());
        };

        if peer == local || self.peers.contains_key(&peer) {
            return Ok(());
        }

        info!("Peer {} joined room {}", peer, self.room_id);
        self.open_record(&peer).await?;
        self.observer.on_peer_joined(&peer).await;

        match offer_role(&local, &peer) {
            OfferRole::Offerer => self.send_offer(&peer).await,
            OfferRole::Answerer => {
                debug!("Waiting for offer from {}", peer);
                Ok(())
            }
        }
    }

    async fn send_offer(&mut self, peer: &PeerId) -> Result<(), NegotiationError> {
        let record = self.record_mut(peer)?;
        record.transition(NegotiationState::HaveLocalOffer)?;

        let result = record.session.create_offer().await;
        let offer = match result {
            Ok(offer) => offer,
            Err(e) => return self.fail(peer, e).await,
        };

        debug!("Sending offer to {}", peer);
        self.signaling.send_offer(peer.clone(), offer).await;
        Ok(())
    }

    async fn on_offer(
        &mut self,
        from: PeerId,
        offer: SessionDescription,
    ) -> Result<(), NegotiationError> {
        match self.peers.get(&from).map(|record| record.state) {
            None => {
                self.open_record(&from).await?;
                self.observer.on_peer_joined(&from).await;
            }
            // Only the offerer ever holds a local offer, so its offer wins.
            Some(NegotiationState::HaveLocalOffer) => {
                info!("Offer collision with {}; keeping ours", from);
                return Ok(());
            }
            Some(_) => {}
        }

        let record = self.record_mut(&from)?;
        record.transition(NegotiationState::HaveRemoteOffer)?;

        let result = record.session.set_remote_description(offer).await;
        if let Err(e) = result {
            return self.fail(&from, e).await;
        }

        let record = self.record_mut(&from)?;
        let result = record.session.create_answer().await;
        let answer = match result {
            Ok(answer) => answer,
            Err(e) => return self.fail(&from, e).await,
        };
        self.record_mut(&from)?
            .transition(NegotiationState::Stable)?;

        debug!("Sending answer to {}", from);
        self.signaling.send_answer(from, answer).await;
        Ok(())
    }

    async fn on_answer(
        &mut self,
        from: PeerId,
        answer: SessionDescription,
    ) -> Result<(), NegotiationError> {
        let record = self.record_mut(&from)?;
        if record.state != NegotiationState::HaveLocalOffer {
            return Err(NegotiationError::InvalidTransition {
                peer: from,
                from: record.state,
                to: NegotiationState::Stable,
            });
        }

        let result = record.session.set_remote_description(answer).await;
        if let Err(e) = result {
            return self.fail(&from, e).await;
        }

        self.record_mut(&from)?
            .transition(NegotiationState::Stable)
    }

    async fn on_remote_candidate(
        &mut self,
        from: PeerId,
        candidate: IceCandidate,
    ) -> Result<(), NegotiationError> {
        let record = self.record_mut(&from)?;

        // May precede the remote description; the session is kept either way.
        if let Err(e) = record.session.add_ice_candidate(candidate).await {
            warn!("Failed to add ICE candidate for {}: {:#}", from, e);
        }
        Ok(())
    }

    pub async fn handle_session_notice(&mut self, notice: SessionNotice) {
        let SessionNotice {
            peer_id,
            session_id,
            event,
        } = notice;

        let Some(record) = self.peers.get_mut(&peer_id) else {
            debug!("Session event for removed peer {}", peer_id);
            return;
        };
        if record.session_id != session_id {
            debug!("Stale session event for {}", peer_id);
            return;
        }

        match event {
            SessionEvent::IceCandidate(candidate) => {
                self.signaling.send_ice(peer_id, candidate).await;
            }
            SessionEvent::RemoteStream(stream) => {
                info!("Received {:?} track from peer {}", stream.kind, peer_id);
                self.observer.on_remote_stream(&peer_id, stream).await;
            }
            SessionEvent::StateChanged(SessionState::Connected) => {
                if !record.connected {
                    record.connected = true;
                    info!("Connected to peer {}", peer_id);
                    self.observer.on_peer_connected(&peer_id).await;
                }
            }
            SessionEvent::StateChanged(state @ (SessionState::Failed | SessionState::Closed)) => {
                let next = if state == SessionState::Failed {
                    NegotiationState::Failed
                } else {
                    NegotiationState::Closed
                };
                let _ = record.transition(next);
                info!("Session with {} ended: {:?}", peer_id, state);
                self.remove_peer(&peer_id).await;
            }
            SessionEvent::StateChanged(SessionState::Disconnected) => {
                warn!("Peer {} disconnected or failed", peer_id);
            }
            SessionEvent::StateChanged(state) => {
                debug!("Connection state for {}: {:?}", peer_id, state);
            }
        }
    }

    /// Close every session and forget every peer.
    pub async fn close_all(&mut self) {
        self.pending_joins.clear();
        for peer in self.peer_ids() {
            self.remove_peer(&peer).await;
        }
    }

    async fn remove_peer(&mut self, peer: &PeerId) {
        self.pending_joins.retain(|p| p != peer);

        let Some(record) = self.peers.remove(peer) else {
            return;
        };
        if let Err(e) = record.session.close().await {
            warn!("Error closing session with {}: {:#}", peer, e);
        }
        info!("Removed peer: {}", peer);
        self.observer.on_peer_removed(peer).await;
    }

    async fn fail(&mut self, peer: &PeerId, error: anyhow::Error) -> Result<(), NegotiationError> {
        if let Some(record) = self.peers.get_mut(peer) {
            let _ = record.transition(NegotiationState::Failed);
        }
        self.remove_peer(peer).await;
        Err(NegotiationError::Session(error))
    }

    async fn open_record(&mut self, peer: &PeerId) -> Result<(), NegotiationError> {
        let session_id = SessionId(self.next_session);
        self.next_session += 1;

        let events = SessionEventSender::new(peer.clone(), session_id, self.session_tx.clone());
        let session = self.factory.create(peer, events).await?;

        self.peers
            .insert(peer.clone(), PeerRecord::new(peer.clone(), session_id, session));
        Ok(())
    }

    fn record_mut(&mut self, peer: &PeerId) -> Result<&mut PeerRecord, NegotiationError> {
        self.peers
            .get_mut(peer)
            .ok_or_else(|| NegotiationError::UnknownPeer(peer.clone()))
    }
}
