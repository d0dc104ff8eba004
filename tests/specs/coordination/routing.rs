//! Routing across daemons
//!
//! Verify peer forwarding, no-route failures, and loop refusal across
//! process boundaries.

use crate::prelude::*;

#[tokio::test]
async fn peer_forwards_lock_requests() {
    let backend = TestDaemon::start("backend").await;
    let front = TestDaemon::start_with(Settings {
        node: "front".to_string(),
        site: TEST_SITE.to_string(),
        peers: vec![PeerConfig {
            key: keys::LOCKS.to_string(),
            socket: backend.socket(),
        }],
        ..Settings::default()
    })
    .await;

    let ws = front.workstation("WS-A");
    ws.acquire("E1").await;

    assert_eq!(
        backend.daemon.services.locks.holder(&EventId::new("E1")),
        Some(ws.id.clone())
    );
    assert_eq!(front.daemon.services.locks.holder(&EventId::new("E1")), None);
}

#[tokio::test]
async fn unknown_key_is_no_route() {
    let hz = TestDaemon::start("node-a").await;
    let ws = hz.workstation("WS-A");
    ws.router.register(
        "hazards.products",
        RemoteRoute::new(hz_adapters::SocketTransport::new(hz.socket())),
    );

    let err = ws
        .router
        .send(ServiceRequest::new("hazards.products", Value::Null))
        .await
        .unwrap_err();

    assert!(matches!(err, RoutingError::NoRoute(_)), "{err:?}");
}

#[tokio::test]
async fn mutually_forwarding_daemons_fail_with_self_loop() {
    let dir_a = tempfile::TempDir::new().unwrap();
    let dir_b = tempfile::TempDir::new().unwrap();
    let key = "hazards.products";
    let settings = |node: &str, peer: &std::path::Path| Settings {
        node: node.to_string(),
        site: TEST_SITE.to_string(),
        peers: vec![PeerConfig {
            key: key.to_string(),
            socket: peer.join("daemon.sock"),
        }],
        ..Settings::default()
    };
    let b_path = dir_b.path().to_path_buf();
    let a_path = dir_a.path().to_path_buf();
    let a = TestDaemon::start_in(dir_a, settings("node-a", &b_path)).await;
    let _b = TestDaemon::start_in(dir_b, settings("node-b", &a_path)).await;

    let err = a
        .daemon
        .services
        .router
        .send(ServiceRequest::new(key, Value::Null))
        .await
        .unwrap_err();

    match err {
        RoutingError::SelfLoop { node, .. } => assert_eq!(node, "node-a"),
        other => panic!("expected self loop, got {other:?}"),
    }
}
