//! Daemon lifecycle specs
//!
//! Verify single-instance locking and that events survive a restart.

use crate::prelude::*;

#[tokio::test]
async fn events_survive_restart() {
    let hz = TestDaemon::start("node-a").await;
    let ws = hz.workstation("WS-A");
    ws.store(vec![hazard("OAX-000003"), hazard("OAX-000004")]).await;
    let settings = hz.daemon.config.settings.clone();

    let dir = hz.stop().await;
    let hz = TestDaemon::start_in(dir, settings).await;

    let ws = hz.workstation("WS-A");
    let ids: Vec<String> = ws.all_events().await.into_iter().map(|e| e.id.to_string()).collect();
    assert_eq!(ids, vec!["OAX-000003", "OAX-000004"]);

    let EventResponse::Created { event } = ws.send(EventRequest::Create { template: None }).await
    else {
        panic!("expected created event");
    };
    assert_eq!(event.id, EventId::new("OAX-000005"));
}

#[tokio::test]
async fn locks_do_not_survive_restart() {
    let hz = TestDaemon::start("node-a").await;
    hz.workstation("WS-A").acquire("E1").await;
    let settings = hz.daemon.config.settings.clone();

    let dir = hz.stop().await;
    let hz = TestDaemon::start_in(dir, settings).await;

    assert_eq!(
        hz.workstation("WS-B").lock_status("E1").await,
        LockStatus::Lockable
    );
}

#[tokio::test]
async fn second_daemon_in_same_state_dir_is_refused() {
    let hz = TestDaemon::start("node-a").await;

    let err = match hz_daemon::lifecycle::startup(&hz.daemon.config).await {
        Ok(_) => panic!("second daemon should not start"),
        Err(e) => e,
    };

    assert!(matches!(err, hz_daemon::LifecycleError::LockFailed(_)), "{err}");
    // First daemon still serves
    assert_eq!(
        hz.workstation("WS-A").lock_status("E1").await,
        LockStatus::Lockable
    );
}
