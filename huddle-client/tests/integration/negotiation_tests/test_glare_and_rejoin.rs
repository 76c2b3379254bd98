use huddle_client::negotiation::{NegotiationState, SessionState};
use huddle_core::SdpKind;

use super::{Fixture, peer};
use crate::integration::init_tracing;
use crate::utils::{ObserverEvent, SessionCall};

#[tokio::test]
async fn test_offerer_keeps_its_offer_on_collision() {
    init_tracing();
    let mut fx = Fixture::new();

    fx.joined_as("a", &[]).await;
    fx.peer_joined("b").await;
    // A misbehaving "b" offers too.
    fx.offer_from("b").await;

    assert_eq!(
        fx.coordinator.state_of(&peer("b")),
        Some(NegotiationState::HaveLocalOffer)
    );
    assert_eq!(fx.signaling.answers_to(&peer("b")).await, 0);

    let session = fx.factory.session_for(&peer("b")).await.unwrap();
    assert!(!session.has_call(&SessionCall::SetRemote(SdpKind::Offer)).await);

    // The real answer still completes the exchange.
    fx.answer_from("b").await;
    assert_eq!(fx.coordinator.state_of(&peer("b")), Some(NegotiationState::Stable));
}

#[tokio::test]
async fn test_rejoin_with_new_id_rebuilds_sessions() {
    init_tracing();
    let mut fx = Fixture::new();

    fx.joined_as("a", &["b"]).await;
    let old = fx.factory.session_for(&peer("b")).await.unwrap();

    // Signaling reconnected and the relay handed us a new id.
    fx.joined_as("a2", &["b"]).await;

    assert_eq!(fx.coordinator.local_id(), Some(&peer("a2")));
    assert!(old.has_call(&SessionCall::Close).await);
    assert_eq!(fx.observer.count(&ObserverEvent::Removed(peer("b"))).await, 1);

    let sessions = fx.factory.sessions_for(&peer("b")).await;
    assert_eq!(sessions.len(), 2);
    assert_ne!(sessions[0].session_id, sessions[1].session_id);
    assert_eq!(fx.signaling.offers_to(&peer("b")).await, 2);

    // The old session's death must not take the new one with it.
    old.report_state(SessionState::Failed).await;
    fx.pump_session_events().await;

    assert_eq!(
        fx.coordinator.state_of(&peer("b")),
        Some(NegotiationState::HaveLocalOffer)
    );
    assert_eq!(fx.observer.count(&ObserverEvent::Removed(peer("b"))).await, 1);
}

#[tokio::test]
async fn test_repeated_room_peers_with_same_id_keeps_sessions() {
    init_tracing();
    let mut fx = Fixture::new();

    fx.joined_as("a", &["b"]).await;
    fx.joined_as("a", &["b"]).await;

    assert_eq!(fx.factory.sessions_for(&peer("b")).await.len(), 1);
    assert_eq!(fx.signaling.offers_to(&peer("b")).await, 1);
    assert_eq!(fx.observer.count(&ObserverEvent::Removed(peer("b"))).await, 0);
}

#[tokio::test]
async fn test_rejoin_defers_peer_joined_until_new_id() {
    init_tracing();
    let mut fx = Fixture::new();

    // Alone in the room as "z" before the socket drops.
    fx.joined_as("z", &[]).await;
    fx.signaling_lost().await;

    // On rejoin the relay announces existing members before room-peers.
    fx.peer_joined("m").await;
    assert!(fx.factory.sessions().await.is_empty(), "Old id must not pick a role");

    fx.joined_as("b", &["m"]).await;

    assert_eq!(fx.coordinator.local_id(), Some(&peer("b")));
    assert_eq!(fx.signaling.offers_to(&peer("m")).await, 1, "Offer under the new role");
    assert_eq!(fx.observer.count(&ObserverEvent::Joined(peer("m"))).await, 1);
    assert_eq!(fx.observer.count(&ObserverEvent::Removed(peer("m"))).await, 0);
    assert_eq!(fx.factory.sessions_for(&peer("m")).await.len(), 1);
}

#[tokio::test]
async fn test_rejoin_in_relay_order_rebuilds_each_peer_once() {
    init_tracing();
    let mut fx = Fixture::new();

    fx.joined_as("a", &["m"]).await;
    assert_eq!(fx.signaling.offers_to(&peer("m")).await, 1);

    fx.signaling_lost().await;
    assert_eq!(
        fx.coordinator.state_of(&peer("m")),
        Some(NegotiationState::HaveLocalOffer),
        "Sessions survive until the new id is known"
    );

    fx.peer_joined("m").await;
    fx.joined_as("n", &["m"]).await;

    // "n" sorts after "m", so this time we wait for m's offer.
    let sessions = fx.factory.sessions_for(&peer("m")).await;
    assert_eq!(sessions.len(), 2);
    assert!(sessions[0].has_call(&SessionCall::Close).await);
    assert_eq!(fx.signaling.offers_to(&peer("m")).await, 1);
    assert_eq!(fx.coordinator.state_of(&peer("m")), Some(NegotiationState::New));
    assert_eq!(fx.observer.count(&ObserverEvent::Removed(peer("m"))).await, 1);

    fx.offer_from("m").await;
    assert_eq!(fx.coordinator.state_of(&peer("m")), Some(NegotiationState::Stable));
    assert_eq!(fx.signaling.answers_to(&peer("m")).await, 1);
}

#[tokio::test]
async fn test_signaling_lost_before_first_join_is_harmless() {
    init_tracing();
    let mut fx = Fixture::new();

    fx.signaling_lost().await;
    fx.peer_joined("m").await;
    fx.joined_as("b", &["m"]).await;

    assert_eq!(fx.factory.sessions_for(&peer("m")).await.len(), 1);
    assert_eq!(fx.observer.count(&ObserverEvent::Removed(peer("m"))).await, 0);
}
