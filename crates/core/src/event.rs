// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hazard events: the records forecasters edit and recommenders produce.

use crate::geometry::Geometry;
use crate::time_range::TimeRange;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

crate::define_id! {
    /// Identifier of a hazard event, allocated by the event store.
    pub struct EventId;
}

/// Built-in fields that equality filters can address
pub mod fields {
    pub const EVENT_ID: &str = "eventId";
    pub const SITE_ID: &str = "siteId";
    pub const HAZARD_TYPE: &str = "hazardType";
    pub const STATUS: &str = "status";

    /// Fields with range semantics; these go through the spatial and
    /// temporal queries instead of equality filters.
    pub const RANGE_FIELDS: &[&str] = &["geometry", "startTime", "endTime", "timeRange"];

    pub fn is_range_field(name: &str) -> bool {
        RANGE_FIELDS.contains(&name)
    }
}

/// Lifecycle status of a hazard event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    #[default]
    Pending,
    Potential,
    Proposed,
    Issued,
    Ending,
    Ended,
    Elapsed,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Pending => "PENDING",
            EventStatus::Potential => "POTENTIAL",
            EventStatus::Proposed => "PROPOSED",
            EventStatus::Issued => "ISSUED",
            EventStatus::Ending => "ENDING",
            EventStatus::Ended => "ENDED",
            EventStatus::Elapsed => "ELAPSED",
        }
    }

    /// Ended and elapsed events are history; nothing edits them further
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventStatus::Ended | EventStatus::Elapsed)
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A geospatially and temporally scoped warning record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardEvent {
    pub id: EventId,
    pub site_id: String,
    /// Phenomenon and significance, e.g. `FF.W`; empty until classified
    #[serde(default)]
    pub hazard_type: String,
    #[serde(default)]
    pub status: EventStatus,
    pub geometry: Geometry,
    pub time_range: TimeRange,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    /// Stamped by the store on every stored version
    #[serde(default)]
    pub modified_at_ms: u64,
}

impl HazardEvent {
    pub fn new(
        id: impl Into<EventId>,
        site_id: impl Into<String>,
        geometry: Geometry,
        time_range: TimeRange,
    ) -> Self {
        Self {
            id: id.into(),
            site_id: site_id.into(),
            hazard_type: String::new(),
            status: EventStatus::default(),
            geometry,
            time_range,
            attributes: BTreeMap::new(),
            modified_at_ms: 0,
        }
    }

    pub fn with_hazard_type(mut self, hazard_type: impl Into<String>) -> Self {
        self.hazard_type = hazard_type.into();
        self
    }

    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Copy of this event under a different id; every other field carries over
    pub fn copy_as(&self, id: EventId) -> Self {
        Self {
            id,
            ..self.clone()
        }
    }

    /// Value of a built-in field or attribute, for equality filtering
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            fields::EVENT_ID => Some(Value::from(self.id.as_str())),
            fields::SITE_ID => Some(Value::from(self.site_id.as_str())),
            fields::HAZARD_TYPE => Some(Value::from(self.hazard_type.as_str())),
            fields::STATUS => Some(Value::from(self.status.as_str())),
            other => self.attributes.get(other).cloned(),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
