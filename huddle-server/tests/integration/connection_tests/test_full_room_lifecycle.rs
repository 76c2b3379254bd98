use huddle_server::CaptionScope;
use serde_json::json;

use crate::integration::init_tracing;
use crate::utils::{RelayHarness, TestClient, directed, expect_type, join_room, str_field};

#[tokio::test]
async fn test_full_room_lifecycle() {
    init_tracing();
    let relay = RelayHarness::start(CaptionScope::Room).await;

    let mut a = TestClient::connect(&relay.signaling_url())
        .await
        .expect("A failed to connect");
    let a_join = join_room(&mut a, "abc").await.expect("A failed to join");
    assert!(a_join.peers.is_empty(), "First peer sees an empty room");
    assert!(a_join.announced.is_empty());
    assert!(relay.state.rooms.contains_room(&"abc".into()));

    let mut b = TestClient::connect(&relay.signaling_url())
        .await
        .expect("B failed to connect");
    let b_join = join_room(&mut b, "abc").await.expect("B failed to join");
    assert_eq!(b_join.announced, vec![a_join.peer_id.clone()]);
    assert_eq!(b_join.peers, vec![a_join.peer_id.clone()]);

    let joined = expect_type(&mut a, "peer-joined").await.unwrap();
    assert_eq!(str_field(&joined, "peerId"), b_join.peer_id);

    let offer = json!({ "type": "offer", "sdp": "v=0 offer" });
    a.send_json(directed("offer", "abc", &b_join.peer_id, offer.clone()))
        .await
        .unwrap();
    let received = expect_type(&mut b, "offer").await.unwrap();
    assert_eq!(str_field(&received, "peerId"), a_join.peer_id);
    assert_eq!(received["data"], offer);

    let answer = json!({ "type": "answer", "sdp": "v=0 answer" });
    b.send_json(directed("answer", "abc", &a_join.peer_id, answer.clone()))
        .await
        .unwrap();
    let received = expect_type(&mut a, "answer").await.unwrap();
    assert_eq!(str_field(&received, "peerId"), b_join.peer_id);
    assert_eq!(received["data"], answer);

    b.close().await.expect("Failed to close B");
    let left = expect_type(&mut a, "peer-left").await.unwrap();
    assert_eq!(str_field(&left, "peerId"), b_join.peer_id);
    assert!(relay.state.rooms.contains_room(&"abc".into()));
    assert_eq!(relay.state.rooms.peer_count(&"abc".into()), 1);

    a.close().await.expect("Failed to close A");
    assert!(
        relay.wait_for_room("abc", false, 2000).await,
        "Room should be deleted once empty"
    );
}
