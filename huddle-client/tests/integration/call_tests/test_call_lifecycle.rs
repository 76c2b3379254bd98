use huddle_client::transport::{ChannelKind, ChannelState};
use huddle_client::{Call, ClientConfig};
use huddle_core::{CaptionMessage, RoomId, SdpKind};
use std::sync::Arc;

use crate::integration::init_tracing;
use crate::utils::{MockSessionFactory, ObserverEvent, RelayHarness, SessionCall, TestObserver};

struct Participant {
    call: Call,
    factory: MockSessionFactory,
    observer: TestObserver,
}

async fn join(relay: &RelayHarness, room: &str) -> Participant {
    let factory = MockSessionFactory::new();
    let observer = TestObserver::new();
    let call = Call::start(
        ClientConfig::with_backend(relay.backend_url()),
        RoomId::from(room),
        Arc::new(factory.clone()),
        Arc::new(observer.clone()),
    )
    .await
    .expect("Call starts");

    for channel in [ChannelKind::Signaling, ChannelKind::Captions] {
        assert!(
            observer
                .wait_for(&ObserverEvent::Status(channel, ChannelState::Connected), 3000)
                .await,
            "{} never connected",
            channel
        );
    }

    Participant {
        call,
        factory,
        observer,
    }
}

async fn total_calls(participants: &[&Participant], call: &SessionCall) -> usize {
    let mut total = 0;
    for p in participants {
        total += p.factory.count_calls(call).await;
    }
    total
}

#[tokio::test]
async fn test_two_participants_negotiate_once() {
    init_tracing();
    let relay = RelayHarness::start().await;

    let first = join(&relay, "abc").await;
    assert!(relay.wait_for_peers("abc", 1, 2000).await);
    let second = join(&relay, "abc").await;

    let second_id = first.observer.wait_for_join(3000).await.expect("first sees second");
    let first_id = second.observer.wait_for_join(3000).await.expect("second sees first");
    assert_ne!(first_id, second_id);

    let answer_applied = SessionCall::SetRemote(SdpKind::Answer);
    let start = std::time::Instant::now();
    while total_calls(&[&first, &second], &answer_applied).await == 0 {
        assert!(start.elapsed().as_millis() < 3000, "Answer never applied");
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    let both = [&first, &second];
    assert_eq!(total_calls(&both, &SessionCall::CreateOffer).await, 1, "Exactly one side offers");
    assert_eq!(total_calls(&both, &SessionCall::CreateAnswer).await, 1);
    assert_eq!(total_calls(&both, &SessionCall::SetRemote(SdpKind::Offer)).await, 1);
    assert_eq!(total_calls(&both, &answer_applied).await, 1);

    let Participant {
        call: second_call,
        observer: second_observer,
        ..
    } = second;
    second_call.leave().await;

    assert_eq!(
        second_observer.count(&ObserverEvent::Removed(first_id)).await,
        1,
        "Leaving closes every session"
    );
    assert!(
        first
            .observer
            .wait_for(&ObserverEvent::Removed(second_id.clone()), 3000)
            .await,
        "Remaining participant hears peer-left"
    );
    assert!(first.call.is_connected());

    let first_session = first.factory.session_for(&second_id).await.unwrap();
    assert!(first_session.has_call(&SessionCall::Close).await);

    first.call.leave().await;
    assert!(relay.wait_for_peers("abc", 0, 2000).await);
}

#[tokio::test]
async fn test_captions_are_buffered() {
    init_tracing();
    let relay = RelayHarness::start().await;

    let speaker = join(&relay, "abc").await;
    let listener = join(&relay, "abc").await;
    assert!(relay.wait_for_captions(2, 2000).await);

    let caption = CaptionMessage {
        speaker: "ana".into(),
        text: "hola a todos".into(),
        translation: None,
        timestamp: 1_700_000_000_000,
        language: "es".into(),
    };
    speaker.call.send_caption(&caption).unwrap();

    assert!(
        listener
            .observer
            .wait_for(&ObserverEvent::Caption(caption.clone()), 3000)
            .await
    );
    assert_eq!(listener.call.captions().await, vec![caption]);
    assert!(speaker.call.captions().await.is_empty());

    speaker.call.leave().await;
    listener.call.leave().await;
}
