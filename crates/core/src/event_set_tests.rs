// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{hazard, window};
use crate::validation::ValidationError;
use chrono::TimeZone;

/// Warnings (`*.W`) must name a cause; everything else is unchecked
fn registry() -> Arc<ValidatorRegistry> {
    let mut registry = ValidatorRegistry::new();
    registry.register("FF.W", |e: &HazardEvent| -> Result<(), ValidationError> {
        if e.attributes.contains_key("cause") {
            Ok(())
        } else {
            Err(ValidationError::invalid("cause", "missing"))
        }
    });
    Arc::new(registry)
}

fn invalid(id: &str) -> HazardEvent {
    hazard(id).with_hazard_type("FF.W")
}

fn valid(id: &str) -> HazardEvent {
    hazard(id).with_hazard_type("FF.W").with_attribute("cause", "rain")
}

#[test]
fn add_invalid_leaves_size_unchanged() {
    let mut set = EventSet::new(registry());
    assert!(!set.add(invalid("a")));
    assert_eq!(set.len(), 0);
}

#[test]
fn add_valid_grows_by_one() {
    let mut set = EventSet::new(registry());
    assert!(set.add(valid("a")));
    assert_eq!(set.len(), 1);
    assert!(set.contains("a"));
}

#[test]
fn add_duplicate_id_is_refused() {
    let mut set = EventSet::new(registry());
    assert!(set.add(valid("a")));
    assert!(!set.add(valid("a").with_attribute("crest", 4)));
    assert_eq!(set.len(), 1);
    assert!(set.get("a").unwrap().attributes.get("crest").is_none());
}

#[test]
fn add_with_panicking_validator_is_refused_not_raised() {
    let mut registry = ValidatorRegistry::new();
    registry.register("FF.W", |_: &HazardEvent| -> Result<(), ValidationError> {
        panic!("broken validator")
    });
    let mut set = EventSet::new(Arc::new(registry));

    assert!(!set.add(invalid("a")));
    assert!(set.is_empty());
}

#[test]
fn add_all_keeps_valid_subset_and_leaves_input_alone() {
    let candidates = vec![valid("a"), invalid("b"), valid("c"), invalid("d"), valid("e")];
    let before = candidates.clone();

    let mut set = EventSet::new(registry());
    let added = set.add_all(&candidates);

    assert_eq!(added, 3);
    assert_eq!(set.len(), candidates.len() - 2);
    assert_eq!(candidates, before);
    let ids: Vec<&str> = set.ids().map(|id| id.as_str()).collect();
    assert_eq!(ids, vec!["a", "c", "e"]);
}

#[test]
fn unchecked_registry_accepts_everything() {
    let mut set = EventSet::default();
    assert_eq!(set.add_all(&[invalid("a"), invalid("b")]), 2);
}

#[test]
fn remove_preserves_order_of_the_rest() {
    let mut set = EventSet::default();
    set.add_all(&[hazard("a"), hazard("b"), hazard("c")]);

    assert_eq!(set.remove("b").map(|e| e.id), Some(EventId::new("b")));
    assert!(set.remove("b").is_none());
    let ids: Vec<String> = set.into_events().into_iter().map(|e| e.id.0).collect();
    assert_eq!(ids, vec!["a", "c"]);
}

#[test]
fn context_attributes_round_trip() {
    let mut set = EventSet::default();
    let now = Utc.with_ymd_and_hms(2026, 5, 20, 18, 30, 0).unwrap();
    set.set_site_id("OAX");
    set.set_current_time(now);
    set.set_time_range(window(18, 21));
    set.set_attribute("trigger", "frameUpdate");

    assert_eq!(set.site_id(), Some("OAX"));
    assert_eq!(set.current_time(), Some(now));
    assert_eq!(set.time_range(), Some(window(18, 21)));
    assert_eq!(set.attribute("trigger"), Some(&Value::from("frameUpdate")));
    assert_eq!(set.remove_attribute("trigger"), Some(Value::from("frameUpdate")));
    assert!(set.attribute("trigger").is_none());
}

#[test]
fn derive_keeps_context_and_validators_but_no_members() {
    let mut set = EventSet::new(registry());
    set.set_site_id("OAX");
    set.add(valid("a"));

    let mut derived = set.derive();
    assert!(derived.is_empty());
    assert_eq!(derived.site_id(), Some("OAX"));
    assert!(!derived.add(invalid("b")), "validators carried over");
}

#[test]
fn from_payload_revalidates() {
    let payload = EventSetPayload {
        events: vec![valid("a"), invalid("b")],
        attributes: BTreeMap::from([(attrs::SITE_ID.to_string(), Value::from("GID"))]),
    };
    let set = EventSet::from_payload(registry(), payload);

    assert_eq!(set.len(), 1);
    assert_eq!(set.site_id(), Some("GID"));
    assert_eq!(set.to_payload().events.len(), 1);
}
