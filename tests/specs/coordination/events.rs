//! Event storage over the socket
//!
//! Verify versioned storage, equality filters, and all-or-nothing batches.

use crate::prelude::*;

#[tokio::test]
async fn stored_events_are_visible_to_other_workstations() {
    let hz = TestDaemon::start("node-a").await;
    let a = hz.workstation("WS-A");
    let b = hz.workstation("WS-B");

    a.store(vec![hazard("E1").with_hazard_type("FF.W")]).await;

    let events = b.all_events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].hazard_type, "FF.W");
    assert!(events[0].modified_at_ms > 0, "store stamps every version");
}

#[tokio::test]
async fn update_batch_with_unknown_id_changes_nothing() {
    let hz = TestDaemon::start("node-a").await;
    let a = hz.workstation("WS-A");
    a.store(vec![hazard("E1")]).await;

    let response = a
        .send(EventRequest::Update {
            events: vec![hazard("E1").with_hazard_type("TO.W"), hazard("E404")],
        })
        .await;

    assert!(matches!(response, EventResponse::Failed { .. }), "{response:?}");
    let EventResponse::Events { events } = a
        .send(EventRequest::History {
            id: EventId::new("E1"),
        })
        .await
    else {
        panic!("expected history");
    };
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].hazard_type, "");
}

#[tokio::test]
async fn filters_match_every_stored_version() {
    let hz = TestDaemon::start("node-a").await;
    let a = hz.workstation("WS-A");
    a.store(vec![hazard("E1").with_hazard_type("FF.W")]).await;
    a.send(EventRequest::Update {
        events: vec![hazard("E1").with_hazard_type("FF.W").with_attribute("cause", "dam")],
    })
    .await;

    let filters = EventFilters::from([("hazardType".to_string(), json!("FF.W"))]);
    let EventResponse::Versions { versions } = a.send(EventRequest::Filter { filters }).await
    else {
        panic!("expected versions");
    };
    assert_eq!(versions[&EventId::new("E1")].len(), 2);
}
