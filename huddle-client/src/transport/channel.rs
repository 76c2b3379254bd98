use crate::error::ClientError;
use crate::transport::{ClientEvent, CloseOutcome, ReconnectState};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use huddle_core::{CaptionMessage, SignalingMessage};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Signaling,
    Captions,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signaling => f.write_str("signaling"),
            Self::Captions => f.write_str("captions"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone)]
pub(crate) enum Outbound {
    Text(String),
    Binary(Bytes),
}

impl From<Outbound> for Message {
    fn from(frame: Outbound) -> Self {
        match frame {
            Outbound::Text(text) => Message::text(text),
            Outbound::Binary(data) => Message::binary(data),
        }
    }
}

/// Cloneable write side of a channel. Refuses frames while the socket is down.
#[derive(Clone)]
pub(crate) struct ChannelSender {
    kind: ChannelKind,
    outbound: mpsc::UnboundedSender<Outbound>,
    connected: Arc<AtomicBool>,
}

impl ChannelSender {
    pub(crate) fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub(crate) fn send(&self, frame: Outbound) -> Result<(), ClientError> {
        if !self.is_connected() {
            return Err(ClientError::NotConnected(self.kind));
        }
        self.outbound
            .send(frame)
            .map_err(|_| ClientError::NotConnected(self.kind))
    }
}

/// Owner's grip on a running channel task.
pub(crate) struct ChannelHandle {
    sender: ChannelSender,
    shutdown: Option<oneshot::Sender<()>>,
    task: tokio::task::JoinHandle<()>,
}

impl ChannelHandle {
    pub(crate) fn spawn(
        kind: ChannelKind,
        url: String,
        greeting: Option<String>,
        reconnect: ReconnectState,
        events: mpsc::UnboundedSender<ClientEvent>,
    ) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let connected = Arc::new(AtomicBool::new(false));

        let channel = Channel {
            kind,
            url,
            greeting,
            reconnect,
            outbound_rx,
            events,
            connected: connected.clone(),
        };
        let task = tokio::spawn(channel.run(shutdown_rx));

        Self {
            sender: ChannelSender {
                kind,
                outbound: outbound_tx,
                connected,
            },
            shutdown: Some(shutdown_tx),
            task,
        }
    }

    pub(crate) fn sender(&self) -> &ChannelSender {
        &self.sender
    }

    /// Close with 1000 and wait for the task to wind down.
    pub(crate) async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = self.task.await {
            warn!("{} channel task ended abnormally: {}", self.sender.kind, e);
        }
    }
}

enum SessionEnd {
    Shutdown,
    Closed { normal: bool, reason: String },
}

struct Channel {
    kind: ChannelKind,
    url: String,
    /// Sent first on every successful open.
    greeting: Option<String>,
    reconnect: ReconnectState,
    outbound_rx: mpsc::UnboundedReceiver<Outbound>,
    events: mpsc::UnboundedSender<ClientEvent>,
    connected: Arc<AtomicBool>,
}

impl Channel {
    async fn run(mut self, mut shutdown: oneshot::Receiver<()>) {
        info!("{} channel started for {}", self.kind, self.url);

        loop {
            self.set_state(ChannelState::Connecting);

            let connected = tokio::select! {
                _ = &mut shutdown => break,
                res = connect_async(self.url.as_str()) => res,
            };

            let end = match connected {
                Ok((stream, _)) => {
                    info!("{} WebSocket connected", self.kind);
                    self.serve(stream, &mut shutdown).await
                }
                Err(e) => SessionEnd::Closed {
                    normal: false,
                    reason: e.to_string(),
                },
            };

            self.set_state(ChannelState::Disconnected);

            let (normal, reason) = match end {
                SessionEnd::Shutdown => break,
                SessionEnd::Closed { normal, reason } => (normal, reason),
            };

            if !normal {
                warn!("{} WebSocket error: {}", self.kind, reason);
                self.emit(ClientEvent::Error(ClientError::Connection {
                    channel: self.kind,
                    reason,
                }));
            }

            match self.reconnect.on_close(normal) {
                CloseOutcome::Retry { attempt, delay } => {
                    info!(
                        "Attempting to reconnect {} ({}) in {:?}",
                        self.kind, attempt, delay
                    );
                    tokio::select! {
                        _ = &mut shutdown => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                CloseOutcome::Exhausted { attempts } => {
                    warn!("Giving up on {} after {} attempts", self.kind, attempts);
                    self.emit(ClientEvent::Error(ClientError::ReconnectExhausted {
                        channel: self.kind,
                        attempts,
                    }));
                    break;
                }
                CloseOutcome::Stopped => break,
            }
        }

        self.reconnect.stop();
        info!("{} channel stopped", self.kind);
    }

    async fn serve(&mut self, stream: WsStream, shutdown: &mut oneshot::Receiver<()>) -> SessionEnd {
        let (mut sink, mut source) = stream.split();

        let mut stale = 0;
        while self.outbound_rx.try_recv().is_ok() {
            stale += 1;
        }
        if stale > 0 {
            debug!("Dropped {} {} frame(s) queued while offline", stale, self.kind);
        }

        if let Some(greeting) = &self.greeting {
            if let Err(e) = sink.send(Message::text(greeting.clone())).await {
                return SessionEnd::Closed {
                    normal: false,
                    reason: e.to_string(),
                };
            }
        }

        // Senders are refused until here, so nothing accepted is drained above.
        self.reconnect.on_open();
        self.set_state(ChannelState::Connected);

        loop {
            tokio::select! {
                _ = &mut *shutdown => {
                    let close = CloseFrame {
                        code: CloseCode::Normal,
                        reason: "User disconnected".into(),
                    };
                    if let Err(e) = sink.send(Message::Close(Some(close))).await {
                        debug!("{} close frame not sent: {}", self.kind, e);
                    }
                    let _ = sink.close().await;
                    return SessionEnd::Shutdown;
                }

                frame = source.next() => match frame {
                    Some(Ok(Message::Text(text))) => self.dispatch(text.as_str()),
                    Some(Ok(Message::Binary(data))) => {
                        debug!("Ignoring {} byte binary frame on {}", data.len(), self.kind);
                    }
                    Some(Ok(Message::Close(frame))) => {
                        info!("{} WebSocket closed: {:?}", self.kind, frame);
                        let normal = frame.as_ref().is_some_and(|f| f.code == CloseCode::Normal);
                        return SessionEnd::Closed {
                            normal,
                            reason: "closed by server".to_owned(),
                        };
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        return SessionEnd::Closed {
                            normal: false,
                            reason: e.to_string(),
                        };
                    }
                    None => {
                        return SessionEnd::Closed {
                            normal: false,
                            reason: "connection dropped".to_owned(),
                        };
                    }
                },

                frame = self.outbound_rx.recv() => match frame {
                    Some(frame) => {
                        if let Err(e) = sink.send(frame.into()).await {
                            return SessionEnd::Closed {
                                normal: false,
                                reason: e.to_string(),
                            };
                        }
                    }
                    // Every sender is gone, so nobody can use this channel anymore.
                    None => return SessionEnd::Shutdown,
                },
            }
        }
    }

    fn dispatch(&self, text: &str) {
        let event = match self.kind {
            ChannelKind::Signaling => match SignalingMessage::parse(text) {
                Ok(msg) => ClientEvent::Signal(msg),
                Err(e) => {
                    warn!("Error parsing signaling message: {}", e);
                    return;
                }
            },
            ChannelKind::Captions => match serde_json::from_str::<CaptionMessage>(text) {
                Ok(caption) => ClientEvent::Caption(caption),
                Err(e) => {
                    warn!("Error parsing caption message: {}", e);
                    return;
                }
            },
        };
        self.emit(event);
    }

    fn set_state(&self, state: ChannelState) {
        self.connected
            .store(state == ChannelState::Connected, Ordering::Release);
        self.emit(ClientEvent::Status(self.kind, state));
    }

    fn emit(&self, event: ClientEvent) {
        if self.events.send(event).is_err() {
            debug!("{} event dropped, owner is gone", self.kind);
        }
    }
}
