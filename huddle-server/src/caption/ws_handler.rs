use crate::RelayState;
use crate::caption::{CaptionFrame, CaptionRegistry, CaptionRelay};
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use huddle_core::RoomId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

pub async fn caption_ws_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    State(state): State<RelayState>,
) -> impl IntoResponse {
    let room_id = RoomId::from(room_id);

    ws.on_upgrade(move |socket| handle_socket(socket, room_id, state.captions))
}

async fn handle_socket(socket: WebSocket, room_id: RoomId, registry: Arc<CaptionRegistry>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<CaptionFrame>();

    let relay = CaptionRelay::open(registry, room_id, tx);

    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let msg = match frame {
                CaptionFrame::Text(text) => Message::Text(text.into()),
                CaptionFrame::Binary(data) => Message::Binary(data),
            };
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            frame = receiver.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    relay.relay(CaptionFrame::Text(text.as_str().to_owned()));
                }
                Some(Ok(Message::Binary(data))) => {
                    relay.relay(CaptionFrame::Binary(data));
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("Captions socket error for room {}: {}", relay.room_id(), e);
                    break;
                }
            },
            _ = &mut send_task => break,
        }
    }

    send_task.abort();
}
