use crate::negotiation::{
    MediaKind, PeerSession, PeerSessionFactory, RemoteStream, SessionEvent, SessionEventSender,
    SessionState,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use huddle_core::{IceCandidate, IceServerConfig, PeerId, SdpKind, SessionDescription};
use std::sync::Arc;
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::track::track_local::TrackLocal;

impl From<RTCPeerConnectionState> for SessionState {
    fn from(state: RTCPeerConnectionState) -> Self {
        match state {
            RTCPeerConnectionState::Connecting => SessionState::Connecting,
            RTCPeerConnectionState::Connected => SessionState::Connected,
            RTCPeerConnectionState::Disconnected => SessionState::Disconnected,
            RTCPeerConnectionState::Failed => SessionState::Failed,
            RTCPeerConnectionState::Closed => SessionState::Closed,
            _ => SessionState::New,
        }
    }
}

/// Builds WebRTC peer connections that share one ICE configuration and one
/// set of local tracks.
#[derive(Clone, Default)]
pub struct WebRtcSessionFactory {
    ice_servers: Vec<IceServerConfig>,
    local_tracks: Vec<Arc<dyn TrackLocal + Send + Sync>>,
}

impl WebRtcSessionFactory {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self {
            ice_servers,
            local_tracks: Vec::new(),
        }
    }

    /// Send `track` to every peer. Without local tracks the session only receives.
    pub fn with_local_track(mut self, track: Arc<dyn TrackLocal + Send + Sync>) -> Self {
        self.local_tracks.push(track);
        self
    }

    fn rtc_ice_servers(&self) -> Vec<RTCIceServer> {
        self.ice_servers
            .iter()
            .map(|server| RTCIceServer {
                urls: server.urls.clone(),
                username: server.username.clone().unwrap_or_default(),
                credential: server.credential.clone().unwrap_or_default(),
                ..Default::default()
            })
            .collect()
    }
}

#[async_trait]
impl PeerSessionFactory for WebRtcSessionFactory {
    async fn create(
        &self,
        peer_id: &PeerId,
        events: SessionEventSender,
    ) -> Result<Box<dyn PeerSession>> {
        let session = WebRtcSession::new(peer_id.clone(), self, events).await?;
        Ok(Box::new(session))
    }
}

pub struct WebRtcSession {
    peer_id: PeerId,
    peer_connection: Arc<RTCPeerConnection>,
}

impl WebRtcSession {
    async fn new(
        peer_id: PeerId,
        factory: &WebRtcSessionFactory,
        events: SessionEventSender,
    ) -> Result<Self> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: factory.rtc_ice_servers(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("Failed to create peer connection")?,
        );

        let state_events = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |state: RTCPeerConnectionState| {
                let events = state_events.clone();
                Box::pin(async move {
                    info!("Connection state for {}: {:?}", events.peer_id(), state);
                    events
                        .send(SessionEvent::StateChanged(SessionState::from(state)))
                        .await;
                })
            },
        ));

        let ice_events = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
            let events = ice_events.clone();
            Box::pin(async move {
                let Some(candidate) = candidate else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                events
                    .send(SessionEvent::IceCandidate(IceCandidate {
                        candidate: init.candidate,
                        sdp_mid: init.sdp_mid,
                        sdp_m_line_index: init.sdp_mline_index,
                        username_fragment: init.username_fragment,
                    }))
                    .await;
            })
        }));

        let track_events = events;
        peer_connection.on_track(Box::new(move |track, _receiver, _transceiver| {
            let events = track_events.clone();
            Box::pin(async move {
                let kind = match track.kind() {
                    RTPCodecType::Video => MediaKind::Video,
                    _ => MediaKind::Audio,
                };
                debug!("Received track from peer: {}", events.peer_id());
                events
                    .send(SessionEvent::RemoteStream(RemoteStream {
                        stream_id: track.stream_id(),
                        track_id: track.id(),
                        kind,
                        track: Some(track),
                    }))
                    .await;
            })
        }));

        if factory.local_tracks.is_empty() {
            for kind in [RTPCodecType::Audio, RTPCodecType::Video] {
                peer_connection
                    .add_transceiver_from_kind(
                        kind,
                        Some(RTCRtpTransceiverInit {
                            direction: RTCRtpTransceiverDirection::Recvonly,
                            send_encodings: vec![],
                        }),
                    )
                    .await
                    .context("Failed to add receive-only transceiver")?;
            }
        } else {
            for track in &factory.local_tracks {
                peer_connection
                    .add_track(Arc::clone(track))
                    .await
                    .context("Failed to add local track")?;
            }
        }

        Ok(Self {
            peer_id,
            peer_connection,
        })
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }
}

#[async_trait]
impl PeerSession for WebRtcSession {
    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .context("Failed to create offer")?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await
            .context("Failed to set local description")?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .context("Failed to create answer")?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await
            .context("Failed to set local description")?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        let desc = match description.kind {
            SdpKind::Offer => RTCSessionDescription::offer(description.sdp)?,
            SdpKind::Answer => RTCSessionDescription::answer(description.sdp)?,
            SdpKind::Pranswer => RTCSessionDescription::pranswer(description.sdp)?,
            SdpKind::Rollback => anyhow::bail!("Rollback descriptions are not supported"),
        };
        self.peer_connection
            .set_remote_description(desc)
            .await
            .context("Failed to set remote description")?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: candidate.username_fragment,
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .context("Failed to add ICE candidate")?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}
