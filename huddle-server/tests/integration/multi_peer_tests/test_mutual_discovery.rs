use std::collections::HashSet;

use huddle_server::CaptionScope;

use crate::integration::init_tracing;
use crate::utils::{RelayHarness, TestClient, expect_type, join_room, str_field};

#[tokio::test]
async fn test_every_pair_discovers_each_other_once() {
    init_tracing();
    let relay = RelayHarness::start(CaptionScope::Room).await;

    let mut clients = Vec::new();
    let mut joins = Vec::new();
    for _ in 0..4 {
        let mut client = TestClient::connect(&relay.signaling_url()).await.unwrap();
        let joined = join_room(&mut client, "abc").await.unwrap();
        clients.push(client);
        joins.push(joined);
    }

    for (i, client) in clients.iter_mut().enumerate() {
        // Announcements received while joining, plus one per later arrival.
        let mut seen: Vec<String> = joins[i].announced.clone();
        for _ in (i + 1)..joins.len() {
            let msg = expect_type(client, "peer-joined").await.unwrap();
            seen.push(str_field(&msg, "peerId"));
        }
        assert!(client.expect_silence().await, "No duplicate announcements");

        let unique: HashSet<_> = seen.iter().cloned().collect();
        assert_eq!(unique.len(), seen.len(), "Each peer announced once");

        let expected: HashSet<_> = joins
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, j)| j.peer_id.clone())
            .collect();
        assert_eq!(unique, expected);
    }

    assert_eq!(relay.state.rooms.peer_count(&"abc".into()), 4);
}

#[tokio::test]
async fn test_rooms_are_isolated() {
    init_tracing();
    let relay = RelayHarness::start(CaptionScope::Room).await;

    let mut a = TestClient::connect(&relay.signaling_url()).await.unwrap();
    let mut x = TestClient::connect(&relay.signaling_url()).await.unwrap();
    join_room(&mut a, "abc").await.unwrap();
    let x_join = join_room(&mut x, "xyz").await.unwrap();

    assert!(x_join.peers.is_empty());
    assert!(a.expect_silence().await);
    assert_eq!(relay.state.rooms.room_count(), 2);
}
