use bytes::Bytes;
use huddle_client::transport::{ChannelKind, ChannelState, ClientEvent, ReconnectPolicy, TransportClient};
use huddle_core::{CaptionMessage, RoomId};

use crate::integration::init_tracing;
use crate::utils::{RelayHarness, drain_events, wait_for_event};

fn caption(text: &str) -> CaptionMessage {
    CaptionMessage {
        speaker: "ana".into(),
        text: text.into(),
        translation: Some("hello".into()),
        timestamp: 1_700_000_000_000,
        language: "es".into(),
    }
}

async fn captions_client(
    relay: &RelayHarness,
    room: &RoomId,
) -> (TransportClient, tokio::sync::mpsc::UnboundedReceiver<ClientEvent>) {
    let (mut client, mut events) = TransportClient::new(relay.backend_url(), ReconnectPolicy::default());
    client.connect_captions(room).await;
    let connected = wait_for_event(&mut events, 3000, |e| {
        matches!(e, ClientEvent::Status(ChannelKind::Captions, ChannelState::Connected))
    })
    .await;
    assert!(connected.is_some(), "Captions channel never connected");
    (client, events)
}

#[tokio::test]
async fn test_caption_reaches_other_listener() {
    init_tracing();
    let relay = RelayHarness::start().await;
    let room = RoomId::from("abc");

    let (mut a, mut a_events) = captions_client(&relay, &room).await;
    let (mut b, mut b_events) = captions_client(&relay, &room).await;
    assert!(relay.wait_for_captions(2, 2000).await);

    // Binary audio is forwarded but carries no caption for the listener.
    a.send_audio_chunk(Bytes::from_static(&[1, 2, 3])).unwrap();
    a.send_caption(&caption("hola")).unwrap();

    match wait_for_event(&mut b_events, 3000, |e| matches!(e, ClientEvent::Caption(_))).await {
        Some(ClientEvent::Caption(received)) => assert_eq!(received, caption("hola")),
        other => panic!("Expected caption, got {:?}", other),
    }

    let own = drain_events(&mut a_events, 200).await;
    assert!(
        !own.iter().any(|e| matches!(e, ClientEvent::Caption(_))),
        "Sender does not hear its own caption"
    );

    a.disconnect().await;
    b.disconnect().await;
}

#[tokio::test]
async fn test_captions_stay_in_room() {
    init_tracing();
    let relay = RelayHarness::start().await;

    let (mut a, _a_events) = captions_client(&relay, &RoomId::from("abc")).await;
    let (mut b, mut b_events) = captions_client(&relay, &RoomId::from("xyz")).await;
    assert!(relay.wait_for_captions(2, 2000).await);

    a.send_caption(&caption("private")).unwrap();

    let heard = drain_events(&mut b_events, 300).await;
    assert!(!heard.iter().any(|e| matches!(e, ClientEvent::Caption(_))));

    a.disconnect().await;
    b.disconnect().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_send_right_after_connected_is_delivered() {
    init_tracing();
    let relay = RelayHarness::start().await;
    let room = RoomId::from("abc");

    let (mut listener, mut listener_events) = captions_client(&relay, &room).await;
    assert!(relay.wait_for_captions(1, 2000).await);

    for round in 0..10 {
        let (mut speaker, mut speaker_events) =
            TransportClient::new(relay.backend_url(), ReconnectPolicy::default());
        speaker.connect_captions(&room).await;

        let connected = wait_for_event(&mut speaker_events, 3000, |e| {
            matches!(e, ClientEvent::Status(ChannelKind::Captions, ChannelState::Connected))
        })
        .await;
        assert!(connected.is_some(), "Round {}: never connected", round);

        let text = format!("first words {}", round);
        speaker
            .send_caption(&caption(&text))
            .expect("Connected channel accepts the caption");

        let heard = wait_for_event(&mut listener_events, 3000, |e| {
            matches!(e, ClientEvent::Caption(c) if c.text == text)
        })
        .await;
        assert!(heard.is_some(), "Round {}: caption accepted but never relayed", round);

        speaker.disconnect().await;
        assert!(relay.wait_for_captions(1, 2000).await);
    }

    listener.disconnect().await;
}

#[tokio::test]
async fn test_room_name_with_reserved_characters() {
    init_tracing();
    let relay = RelayHarness::start().await;
    let room = RoomId::from("team a/b?#1");

    let (mut a, _a_events) = captions_client(&relay, &room).await;
    let (mut b, mut b_events) = captions_client(&relay, &room).await;
    assert!(relay.wait_for_captions(2, 2000).await);

    a.send_caption(&caption("same room")).unwrap();

    match wait_for_event(&mut b_events, 3000, |e| matches!(e, ClientEvent::Caption(_))).await {
        Some(ClientEvent::Caption(received)) => assert_eq!(received.text, "same room"),
        other => panic!("Expected caption, got {:?}", other),
    }

    a.disconnect().await;
    b.disconnect().await;
}
