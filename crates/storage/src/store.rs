// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event store: CRUD plus filtered retrieval over a pluggable backend.
//!
//! Mutating calls build one batch of [`Mutation`]s and hand it to the backend,
//! which applies it whole or not at all. Every stored version is stamped
//! with the clock's wall reading.

use crate::{EventBackend, Mutation, StorageError, VersionMap};
use chrono::{DateTime, Utc};
use hz_core::{
    fields, Clock, EventFilters, EventId, Geometry, HazardEvent, IdGen, SequentialIdGen,
    TimeRange,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub struct EventStore<C: Clock> {
    backend: Arc<dyn EventBackend>,
    clock: C,
    site_id: String,
    ids: SequentialIdGen,
}

impl<C: Clock> EventStore<C> {
    /// Open a store for `site_id`.
    ///
    /// Id numbering resumes past the highest id the backend already holds
    /// for this site.
    pub fn new(
        backend: Arc<dyn EventBackend>,
        clock: C,
        site_id: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let site_id = site_id.into();
        let ids = SequentialIdGen::new(site_id.clone());
        for id in backend.scan()?.keys() {
            if let Some(seq) = ids.sequence_of(id.as_str()) {
                ids.observe(seq);
            }
        }
        Ok(Self {
            backend,
            clock,
            site_id,
            ids,
        })
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    /// New pending event with a fresh id, empty geometry, valid from now.
    ///
    /// Not persisted until stored.
    pub fn create_event(&self) -> HazardEvent {
        HazardEvent::new(
            EventId::new(self.ids.next()),
            self.site_id.clone(),
            Geometry::Collection {
                members: Vec::new(),
            },
            TimeRange::instant(self.clock.utc()),
        )
    }

    /// Copy of `template` under a fresh id
    pub fn create_event_from(&self, template: &HazardEvent) -> HazardEvent {
        let mut event = template.copy_as(EventId::new(self.ids.next()));
        event.modified_at_ms = 0;
        event
    }

    pub fn store_event(&self, event: HazardEvent) -> Result<(), StorageError> {
        self.store_events(vec![event])
    }

    /// Store a batch; new ids are created, known ids gain a version
    pub fn store_events(&self, events: Vec<HazardEvent>) -> Result<(), StorageError> {
        for event in &events {
            if let Some(seq) = self.ids.sequence_of(event.id.as_str()) {
                self.ids.observe(seq);
            }
        }
        self.apply(events.into_iter().map(Mutation::Store).collect())
    }

    pub fn update_event(&self, event: HazardEvent) -> Result<(), StorageError> {
        self.update_events(vec![event])
    }

    /// Append versions to existing events; any unknown id fails the batch
    pub fn update_events(&self, events: Vec<HazardEvent>) -> Result<(), StorageError> {
        self.apply(events.into_iter().map(Mutation::Update).collect())
    }

    pub fn remove_event(&self, id: &EventId) -> Result<(), StorageError> {
        self.remove_events(vec![id.clone()])
    }

    pub fn remove_events(&self, ids: Vec<EventId>) -> Result<(), StorageError> {
        self.apply(ids.into_iter().map(Mutation::Remove).collect())
    }

    /// Latest version of one event
    pub fn get_event(&self, id: &EventId) -> Result<Option<HazardEvent>, StorageError> {
        Ok(self.backend.versions(id)?.pop())
    }

    /// Every stored version of one event, oldest first
    pub fn history(&self, id: &EventId) -> Result<Vec<HazardEvent>, StorageError> {
        let versions = self.backend.versions(id)?;
        if versions.is_empty() {
            return Err(StorageError::NotFound(id.clone()));
        }
        Ok(versions)
    }

    /// Versions matching every equality filter, grouped by event id.
    ///
    /// Ids with no matching version are absent from the result. Filters on
    /// range-like fields are rejected.
    pub fn get_events_by_filter(
        &self,
        filters: &EventFilters,
    ) -> Result<HashMap<EventId, Vec<HazardEvent>>, StorageError> {
        if let Some(field) = filters.keys().find(|name| fields::is_range_field(name)) {
            return Err(StorageError::InvalidFilter(field.clone()));
        }

        let mut matches = HashMap::new();
        for (id, versions) in self.backend.scan()? {
            let hits: Vec<HazardEvent> = versions
                .into_iter()
                .filter(|event| {
                    filters
                        .iter()
                        .all(|(name, expected)| event.field(name).as_ref() == Some(expected))
                })
                .collect();
            if !hits.is_empty() {
                matches.insert(id, hits);
            }
        }
        debug!(filters = filters.len(), matched = matches.len(), "filter query");
        Ok(matches)
    }

    /// Latest versions whose geometry intersects `geometry`
    pub fn get_by_geometry(&self, geometry: &Geometry) -> Result<Vec<HazardEvent>, StorageError> {
        Ok(self
            .latest()?
            .filter(|event| event.geometry.intersects(geometry))
            .collect())
    }

    /// Latest versions whose time range overlaps `[start, end)`
    pub fn get_by_time(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HazardEvent>, StorageError> {
        self.get_by_time_range(&TimeRange::new(start, end)?)
    }

    pub fn get_by_time_range(&self, range: &TimeRange) -> Result<Vec<HazardEvent>, StorageError> {
        Ok(self
            .latest()?
            .filter(|event| event.time_range.overlaps(range))
            .collect())
    }

    /// Latest version of every event, ordered by id.
    ///
    /// Unbounded: every event is returned, nothing is truncated.
    pub fn get_all(&self) -> Result<Vec<HazardEvent>, StorageError> {
        Ok(self.latest()?.collect())
    }

    /// Everything the backend holds, for snapshots
    pub fn export(&self) -> Result<VersionMap, StorageError> {
        self.backend.scan()
    }

    fn latest(&self) -> Result<impl Iterator<Item = HazardEvent>, StorageError> {
        Ok(self
            .backend
            .scan()?
            .into_values()
            .filter_map(|mut versions| versions.pop()))
    }

    fn apply(&self, mut batch: Vec<Mutation>) -> Result<(), StorageError> {
        if batch.is_empty() {
            return Ok(());
        }
        let stamp = self.clock.epoch_ms();
        for mutation in &mut batch {
            if let Mutation::Store(event) | Mutation::Update(event) = mutation {
                event.modified_at_ms = stamp;
            }
        }
        let count = batch.len();
        self.backend.apply(batch)?;
        debug!(count, "applied event batch");
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
