// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::super::tests::{services_with, test_settings};
use crate::config::Settings;
use hz_adapters::{FakeBehavior, FakeRecommenderHost};
use hz_core::test_support::{hazard, hazard_at, square, window};
use hz_core::{RecommenderRequest, RecommenderResponse};

fn run(name: &str, site: &str) -> RecommenderRequest {
    RecommenderRequest {
        recommender_name: name.to_string(),
        site: site.to_string(),
        time_range: window(0, 12),
    }
}

fn ids(response: &RecommenderResponse) -> Vec<String> {
    match response {
        RecommenderResponse::Events { events } => {
            events.iter().map(|e| e.id.to_string()).collect()
        }
        RecommenderResponse::Failed { message } => panic!("recommender failed: {message}"),
    }
}

#[tokio::test]
async fn input_holds_site_events_overlapping_the_window() {
    let host = FakeRecommenderHost::new();
    host.set_behavior("echo", FakeBehavior::Echo);
    let services = services_with(&test_settings(), &host);

    let mut other_site = hazard("X1");
    other_site.site_id = "BOU".to_string();
    services
        .store
        .store_events(vec![
            hazard("E1"),
            hazard_at("LATE", square(-96.5, 41.0), window(18, 20)),
            other_site,
        ])
        .unwrap();

    let response = services.router.send_typed(&run("echo", "OAX")).await.unwrap();

    assert_eq!(ids(&response), vec!["E1"]);
    assert_eq!(host.calls()[0].input_ids, vec!["E1"]);
}

#[tokio::test]
async fn produced_events_are_returned() {
    let host = FakeRecommenderHost::new();
    host.set_behavior(
        "flood",
        FakeBehavior::Produce(vec![hazard("R1").with_hazard_type("FF.W"), hazard("R2")]),
    );
    let services = services_with(&test_settings(), &host);

    let response = services.router.send_typed(&run("flood", "OAX")).await.unwrap();
    assert_eq!(ids(&response), vec!["R1", "R2"]);
}

#[tokio::test]
async fn failure_is_reported_in_the_response() {
    let host = FakeRecommenderHost::new();
    host.set_behavior("broken", FakeBehavior::Fail("no radar data".to_string()));
    let services = services_with(&test_settings(), &host);

    let response = services.router.send_typed(&run("broken", "OAX")).await.unwrap();
    assert!(
        matches!(
            &response,
            RecommenderResponse::Failed { message } if message.contains("no radar data")
        ),
        "{response:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn slow_recommender_times_out() {
    let host = FakeRecommenderHost::new();
    host.set_behavior("stuck", FakeBehavior::Hold);
    let settings = Settings {
        sync_timeout_ms: 50,
        ..test_settings()
    };
    let services = services_with(&settings, &host);

    let response = services.router.send_typed(&run("stuck", "OAX")).await.unwrap();
    assert!(
        matches!(
            &response,
            RecommenderResponse::Failed { message } if message.contains("did not finish")
        ),
        "{response:?}"
    );
}
