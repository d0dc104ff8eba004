// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{hazard, window};

#[yare::parameterized(
    event_id    = { "eventId",    Some(Value::from("OAX-000001")) },
    site_id     = { "siteId",     Some(Value::from("OAX")) },
    hazard_type = { "hazardType", Some(Value::from("FF.W")) },
    status      = { "status",     Some(Value::from("ISSUED")) },
    attribute   = { "cause",      Some(Value::from("dam break")) },
    missing     = { "nope",       None },
)]
fn field_lookup(name: &str, expected: Option<Value>) {
    let event = hazard("OAX-000001")
        .with_hazard_type("FF.W")
        .with_status(EventStatus::Issued)
        .with_attribute("cause", "dam break");
    assert_eq!(event.field(name), expected);
}

#[test]
fn copy_as_keeps_everything_but_the_id() {
    let original = hazard("OAX-000001")
        .with_hazard_type("FA.Y")
        .with_attribute("crest", 12.5);
    let copy = original.copy_as(EventId::new("OAX-000002"));

    assert_eq!(copy.id, "OAX-000002");
    assert_eq!(copy.hazard_type, original.hazard_type);
    assert_eq!(copy.attributes, original.attributes);
    assert_eq!(copy.geometry, original.geometry);
    assert_eq!(copy.time_range, original.time_range);
}

#[test]
fn status_serializes_screaming() {
    assert_eq!(
        serde_json::to_string(&EventStatus::Ending).unwrap(),
        "\"ENDING\""
    );
    assert_eq!(EventStatus::Ending.to_string(), "ENDING");
}

#[yare::parameterized(
    pending = { EventStatus::Pending, false },
    issued  = { EventStatus::Issued,  false },
    ended   = { EventStatus::Ended,   true },
    elapsed = { EventStatus::Elapsed, true },
)]
fn terminal_statuses(status: EventStatus, expected: bool) {
    assert_eq!(status.is_terminal(), expected);
}

#[test]
fn range_fields_are_flagged() {
    assert!(fields::is_range_field("geometry"));
    assert!(fields::is_range_field("startTime"));
    assert!(!fields::is_range_field("status"));
}

#[test]
fn missing_optional_fields_default_on_deserialize() {
    let json = serde_json::json!({
        "id": "OAX-000009",
        "site_id": "OAX",
        "geometry": { "type": "point", "coordinate": { "lon": -96.0, "lat": 41.0 } },
        "time_range": serde_json::to_value(window(0, 3)).unwrap(),
    });
    let event: HazardEvent = serde_json::from_value(json).unwrap();
    assert_eq!(event.status, EventStatus::Pending);
    assert!(event.attributes.is_empty());
    assert_eq!(event.modified_at_ms, 0);
}
