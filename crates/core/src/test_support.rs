// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{EventId, EventSet, Geometry, HazardEvent, TimeRange, ValidatorRegistry};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;

/// Site every helper-built event belongs to
pub const TEST_SITE: &str = "OAX";

/// Midnight UTC of the day test windows are placed on
pub fn test_day() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 20, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// `[start_hour, end_hour)` on the test day; an inverted pair collapses to an instant
pub fn window(start_hour: i64, end_hour: i64) -> TimeRange {
    let start = test_day() + Duration::hours(start_hour);
    let end = test_day() + Duration::hours(end_hour);
    TimeRange::new(start, end).unwrap_or_else(|_| TimeRange::instant(start))
}

/// Square polygon one degree on a side with its south-west corner at `(lon, lat)`
pub fn square(lon: f64, lat: f64) -> Geometry {
    Geometry::polygon([
        (lon, lat),
        (lon + 1.0, lat),
        (lon + 1.0, lat + 1.0),
        (lon, lat + 1.0),
    ])
}

/// Pending event over eastern Nebraska, valid 00Z-06Z on the test day
pub fn hazard(id: &str) -> HazardEvent {
    hazard_at(id, square(-96.5, 41.0), window(0, 6))
}

pub fn hazard_at(id: &str, geometry: Geometry, time_range: TimeRange) -> HazardEvent {
    HazardEvent::new(EventId::new(id), TEST_SITE, geometry, time_range)
}

/// Unvalidated event set holding the given events
pub fn event_set(events: impl IntoIterator<Item = HazardEvent>) -> EventSet {
    let mut set = EventSet::new(Arc::new(ValidatorRegistry::new()));
    for event in events {
        set.add(event);
    }
    set
}
