// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validated, attributed collections of hazard events.
//!
//! An `EventSet` is built per request (a recommender run, a store query)
//! and thrown away afterwards. Every member passed validation when it was
//! inserted; a rejected candidate is simply absent, never an error.

use crate::event::{EventId, HazardEvent};
use crate::time_range::TimeRange;
use crate::validation::ValidatorRegistry;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Well-known execution-context keys
pub mod attrs {
    pub const SITE_ID: &str = "siteId";
    pub const CURRENT_TIME: &str = "currentTime";
    pub const TIME_RANGE: &str = "timeRange";
}

/// Serializable form of an event set, for crossing process boundaries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventSetPayload {
    pub events: Vec<HazardEvent>,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default)]
pub struct EventSet {
    events: IndexMap<EventId, HazardEvent>,
    attributes: BTreeMap<String, Value>,
    validators: Arc<ValidatorRegistry>,
}

impl EventSet {
    pub fn new(validators: Arc<ValidatorRegistry>) -> Self {
        Self {
            events: IndexMap::new(),
            attributes: BTreeMap::new(),
            validators,
        }
    }

    /// Rebuild from a payload; members that fail validation are dropped
    pub fn from_payload(validators: Arc<ValidatorRegistry>, payload: EventSetPayload) -> Self {
        let mut set = Self::new(validators);
        set.attributes = payload.attributes;
        set.add_all(&payload.events);
        set
    }

    pub fn to_payload(&self) -> EventSetPayload {
        EventSetPayload {
            events: self.events.values().cloned().collect(),
            attributes: self.attributes.clone(),
        }
    }

    /// Empty set sharing this set's validators and execution context
    pub fn derive(&self) -> Self {
        Self {
            events: IndexMap::new(),
            attributes: self.attributes.clone(),
            validators: Arc::clone(&self.validators),
        }
    }

    pub fn validators(&self) -> &Arc<ValidatorRegistry> {
        &self.validators
    }

    /// Insert a candidate.
    ///
    /// Returns false, leaving the set unchanged, when the candidate fails
    /// validation or an event with the same id is already a member.
    pub fn add(&mut self, event: HazardEvent) -> bool {
        if self.events.contains_key(&event.id) {
            return false;
        }
        if let Err(e) = self.validators.check(&event) {
            tracing::debug!(
                event_id = %event.id,
                hazard_type = %event.hazard_type,
                error = %e,
                "candidate rejected"
            );
            return false;
        }
        self.events.insert(event.id.clone(), event);
        true
    }

    /// Insert every valid candidate; the caller's collection is not touched.
    ///
    /// Returns how many candidates were added.
    pub fn add_all<'a, I>(&mut self, candidates: I) -> usize
    where
        I: IntoIterator<Item = &'a HazardEvent>,
    {
        candidates
            .into_iter()
            .filter(|event| self.add((*event).clone()))
            .count()
    }

    pub fn remove(&mut self, id: &str) -> Option<HazardEvent> {
        self.events.shift_remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&HazardEvent> {
        self.events.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.events.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Members in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &HazardEvent> {
        self.events.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &EventId> {
        self.events.keys()
    }

    pub fn into_events(self) -> Vec<HazardEvent> {
        self.events.into_values().collect()
    }

    // -- attribute bag --

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn remove_attribute(&mut self, key: &str) -> Option<Value> {
        self.attributes.remove(key)
    }

    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    pub fn site_id(&self) -> Option<&str> {
        self.attribute(attrs::SITE_ID).and_then(Value::as_str)
    }

    pub fn set_site_id(&mut self, site_id: impl Into<String>) {
        self.set_attribute(attrs::SITE_ID, site_id.into());
    }

    pub fn current_time(&self) -> Option<DateTime<Utc>> {
        self.attribute(attrs::CURRENT_TIME)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn set_current_time(&mut self, at: DateTime<Utc>) {
        self.set_attribute(attrs::CURRENT_TIME, at.to_rfc3339());
    }

    pub fn time_range(&self) -> Option<TimeRange> {
        self.attribute(attrs::TIME_RANGE)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn set_time_range(&mut self, range: TimeRange) {
        if let Ok(value) = serde_json::to_value(range) {
            self.set_attribute(attrs::TIME_RANGE, value);
        }
    }
}

impl<'a> IntoIterator for &'a EventSet {
    type Item = &'a HazardEvent;
    type IntoIter = indexmap::map::Values<'a, EventId, HazardEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.values()
    }
}

#[cfg(test)]
#[path = "event_set_tests.rs"]
mod tests;
