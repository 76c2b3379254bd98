use crate::caption_buffer::CaptionBuffer;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::negotiation::{
    CoordinatorInput, NegotiationCoordinator, NegotiationObserver, PeerSessionFactory,
    SESSION_EVENT_BUFFER,
};
use crate::transport::{ChannelKind, ChannelState, ClientEvent, TransportClient};
use async_trait::async_trait;
use bytes::Bytes;
use huddle_core::{CaptionMessage, RoomId};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Everything the UI shell hears about a call.
#[async_trait]
pub trait CallObserver: NegotiationObserver {
    async fn on_status(&self, _channel: ChannelKind, _state: ChannelState) {}

    async fn on_error(&self, _error: &ClientError) {}

    async fn on_caption(&self, _caption: &CaptionMessage) {}
}

/// One participant's presence in a room: transport, negotiation and captions.
pub struct Call {
    room_id: RoomId,
    transport: TransportClient,
    captions: Arc<Mutex<CaptionBuffer>>,
    dispatcher: JoinHandle<()>,
    coordinator: JoinHandle<()>,
}

impl Call {
    pub async fn start<O>(
        config: ClientConfig,
        room_id: RoomId,
        factory: Arc<dyn PeerSessionFactory>,
        observer: Arc<O>,
    ) -> Result<Self, ClientError>
    where
        O: CallObserver + 'static,
    {
        let (mut transport, events) = TransportClient::new(&config.backend_url, config.reconnect);
        transport.connect_signaling(&room_id).await?;
        transport.connect_captions(&room_id).await;

        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (session_tx, session_rx) = mpsc::channel(SESSION_EVENT_BUFFER);

        let coordinator = NegotiationCoordinator::new(
            room_id.clone(),
            factory,
            Arc::new(transport.signaling_output()?),
            observer.clone(),
            session_tx,
        );
        let coordinator = tokio::spawn(coordinator.run(signal_rx, session_rx));

        let captions = Arc::new(Mutex::new(CaptionBuffer::new(config.caption_history)));
        let dispatcher = tokio::spawn(dispatch_events(
            events,
            signal_tx,
            captions.clone(),
            observer,
        ));

        info!("Call started in room {}", room_id);
        Ok(Self {
            room_id,
            transport,
            captions,
            dispatcher,
            coordinator,
        })
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub fn send_caption(&self, caption: &CaptionMessage) -> Result<(), ClientError> {
        self.transport.send_caption(caption)
    }

    pub fn send_audio_chunk(&self, chunk: Bytes) -> Result<(), ClientError> {
        self.transport.send_audio_chunk(chunk)
    }

    pub async fn captions(&self) -> Vec<CaptionMessage> {
        self.captions.lock().await.snapshot()
    }

    /// Disconnect from the relay and close every peer session.
    pub async fn leave(self) {
        let Self {
            room_id,
            mut transport,
            dispatcher,
            coordinator,
            ..
        } = self;

        transport.disconnect().await;
        // Dropping the transport closes the event queue, which ends the
        // dispatcher, which closes the coordinator's signal queue.
        drop(transport);

        if let Err(e) = dispatcher.await {
            warn!("Event dispatcher ended abnormally: {}", e);
        }
        if let Err(e) = coordinator.await {
            warn!("Negotiation task ended abnormally: {}", e);
        }
        info!("Left room {}", room_id);
    }
}

async fn dispatch_events<O>(
    mut events: mpsc::UnboundedReceiver<ClientEvent>,
    signal_tx: mpsc::UnboundedSender<CoordinatorInput>,
    captions: Arc<Mutex<CaptionBuffer>>,
    observer: Arc<O>,
) where
    O: CallObserver + 'static,
{
    while let Some(event) = events.recv().await {
        match event {
            ClientEvent::Signal(msg) => forward(&signal_tx, msg.into()),
            ClientEvent::Caption(caption) => {
                observer.on_caption(&caption).await;
                captions.lock().await.push(caption);
            }
            ClientEvent::Status(channel, state) => {
                if channel == ChannelKind::Signaling && state == ChannelState::Disconnected {
                    forward(&signal_tx, CoordinatorInput::SignalingLost);
                }
                observer.on_status(channel, state).await;
            }
            ClientEvent::Error(e) => {
                if e.is_terminal() {
                    error!("{}", e);
                } else {
                    warn!("{}", e);
                }
                observer.on_error(&e).await;
            }
        }
    }
}

fn forward(signal_tx: &mpsc::UnboundedSender<CoordinatorInput>, input: CoordinatorInput) {
    if signal_tx.send(input).is_err() {
        warn!("Negotiation task is gone; dropping signaling input");
    }
}
