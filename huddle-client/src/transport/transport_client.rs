use crate::error::ClientError;
use crate::transport::channel::{ChannelHandle, ChannelSender, Outbound};
use crate::transport::signaling_sender::SignalingRoute;
use crate::transport::{ChannelKind, ClientEvent, ReconnectPolicy, ReconnectState, SignalingSender};
use bytes::Bytes;
use huddle_core::utils::{CAPTIONS_PATH_PREFIX, SIGNALING_PATH};
use huddle_core::{CaptionMessage, RoomId, SignalingMessage};
use tokio::sync::{mpsc, watch};
use tracing::info;

/// Client side of both relay endpoints.
///
/// Each channel runs in its own task with its own reconnect counter; events
/// from both arrive on the receiver returned by [`TransportClient::new`].
pub struct TransportClient {
    backend_url: String,
    policy: ReconnectPolicy,
    events: mpsc::UnboundedSender<ClientEvent>,
    /// Shared with every [`SignalingSender`] handed out.
    route: watch::Sender<Option<SignalingRoute>>,
    signaling: Option<ChannelHandle>,
    captions: Option<ChannelHandle>,
}

impl TransportClient {
    pub fn new(
        backend_url: impl Into<String>,
        policy: ReconnectPolicy,
    ) -> (Self, mpsc::UnboundedReceiver<ClientEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let backend_url = backend_url.into().trim_end_matches('/').to_owned();

        let (route, _) = watch::channel(None);
        let client = Self {
            backend_url,
            policy,
            events,
            route,
            signaling: None,
            captions: None,
        };
        (client, events_rx)
    }

    pub fn signaling_url(&self) -> String {
        format!("{}{}", self.backend_url, SIGNALING_PATH)
    }

    /// The room id is one path segment, percent-encoded.
    pub fn captions_url(&self, room_id: &RoomId) -> String {
        format!(
            "{}{}{}",
            self.backend_url,
            CAPTIONS_PATH_PREFIX,
            urlencoding::encode(room_id.as_str())
        )
    }

    /// Open the signaling channel; every (re)connect joins `room_id`.
    pub async fn connect_signaling(&mut self, room_id: &RoomId) -> Result<(), ClientError> {
        if let Some(previous) = self.signaling.take() {
            previous.stop().await;
        }

        let greeting = SignalingMessage::join_room(room_id.clone()).to_json()?;
        info!("Connecting signaling for room {}", room_id);

        let channel = ChannelHandle::spawn(
            ChannelKind::Signaling,
            self.signaling_url(),
            Some(greeting),
            ReconnectState::new(self.policy),
            self.events.clone(),
        );
        self.route.send_replace(Some(SignalingRoute {
            room_id: room_id.clone(),
            channel: channel.sender().clone(),
        }));
        self.signaling = Some(channel);
        Ok(())
    }

    pub async fn connect_captions(&mut self, room_id: &RoomId) {
        if let Some(previous) = self.captions.take() {
            previous.stop().await;
        }

        info!("Connecting captions for room {}", room_id);
        self.captions = Some(ChannelHandle::spawn(
            ChannelKind::Captions,
            self.captions_url(room_id),
            None,
            ReconnectState::new(self.policy),
            self.events.clone(),
        ));
    }

    pub fn send_signaling(&self, msg: &SignalingMessage) -> Result<(), ClientError> {
        let channel = self
            .signaling
            .as_ref()
            .ok_or(ClientError::NotConnected(ChannelKind::Signaling))?;
        channel.sender().send(Outbound::Text(msg.to_json()?))
    }

    pub fn send_caption(&self, caption: &CaptionMessage) -> Result<(), ClientError> {
        let json = serde_json::to_string(caption).map_err(huddle_core::ProtocolError::from)?;
        self.captions_channel()?.send(Outbound::Text(json))
    }

    /// Raw audio for the transcription service, sent as a binary caption frame.
    pub fn send_audio_chunk(&self, chunk: Bytes) -> Result<(), ClientError> {
        self.captions_channel()?.send(Outbound::Binary(chunk))
    }

    /// A [`SignalingOutput`](crate::negotiation::SignalingOutput) that follows
    /// the latest [`connect_signaling`](Self::connect_signaling) call.
    pub fn signaling_output(&self) -> Result<SignalingSender, ClientError> {
        if self.route.borrow().is_none() {
            return Err(ClientError::NotConnected(ChannelKind::Signaling));
        }
        Ok(SignalingSender::new(self.route.subscribe()))
    }

    pub fn is_connected(&self) -> bool {
        self.signaling
            .as_ref()
            .is_some_and(|channel| channel.sender().is_connected())
    }

    pub fn is_captions_connected(&self) -> bool {
        self.captions
            .as_ref()
            .is_some_and(|channel| channel.sender().is_connected())
    }

    /// Stop both channels for good. Open sockets are closed with 1000 and no
    /// reconnect or terminal error follows.
    pub async fn disconnect(&mut self) {
        if let Some(channel) = self.signaling.take() {
            channel.stop().await;
        }
        if let Some(channel) = self.captions.take() {
            channel.stop().await;
        }
        self.route.send_replace(None);
        info!("Transport disconnected");
    }

    fn captions_channel(&self) -> Result<&ChannelSender, ClientError> {
        self.captions
            .as_ref()
            .map(ChannelHandle::sender)
            .ok_or(ClientError::NotConnected(ChannelKind::Captions))
    }
}
