//! Recommender runs requested over the socket
//!
//! Recommenders here are executables in the daemon's recommender directory.

use crate::prelude::*;

fn run(name: &str) -> RecommenderRequest {
    RecommenderRequest {
        recommender_name: name.to_string(),
        site: TEST_SITE.to_string(),
        time_range: window(0, 12),
    }
}

#[tokio::test]
async fn script_output_comes_back_as_events() {
    let hz = TestDaemon::start("node-a").await;
    let produced = serde_json::to_string(&hazard("OAX-000100").with_hazard_type("FF.W")).unwrap();
    hz.install_recommender(
        "DamBreak",
        &format!("cat > /dev/null\nprintf '%s' '{{\"events\": [{produced}]}}'"),
    );

    let ws = hz.workstation("WS-A");
    let response = ws.send(run("DamBreak")).await;

    let RecommenderResponse::Events { events } = response else {
        panic!("expected events, got {response:?}");
    };
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, EventId::new("OAX-000100"));
}

#[tokio::test]
async fn failing_script_reports_its_cause() {
    let hz = TestDaemon::start("node-a").await;
    hz.install_recommender("Broken", "cat > /dev/null\necho 'radar feed missing' >&2\nexit 3");

    let ws = hz.workstation("WS-A");
    let response = ws.send(run("Broken")).await;

    assert!(
        matches!(
            &response,
            RecommenderResponse::Failed { message } if message.contains("radar feed missing")
        ),
        "{response:?}"
    );
}

#[tokio::test]
async fn unknown_recommender_fails_without_disturbing_later_runs() {
    let hz = TestDaemon::start("node-a").await;
    hz.install_recommender("Quiet", "cat > /dev/null\nprintf '{\"events\": []}'");
    let ws = hz.workstation("WS-A");

    let response = ws.send(run("Nope")).await;
    assert!(matches!(response, RecommenderResponse::Failed { .. }), "{response:?}");

    let response = ws.send(run("Quiet")).await;
    assert_eq!(response, RecommenderResponse::Events { events: vec![] });
}
