// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence collaborator behind the event store.
//!
//! A backend keeps every stored version of every event and applies a batch
//! of mutations atomically. Query execution beyond "give me the versions"
//! belongs to the store.

use crate::StorageError;
use hz_core::{EventId, HazardEvent};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};

/// Every stored version of each event, oldest first
pub type VersionMap = BTreeMap<EventId, Vec<HazardEvent>>;

/// One change inside a batch
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Append a version, creating the event if it is new
    Store(HazardEvent),
    /// Append a version to an event that must already exist
    Update(HazardEvent),
    /// Drop the event and all its versions
    Remove(EventId),
}

impl Mutation {
    pub fn event_id(&self) -> &EventId {
        match self {
            Mutation::Store(event) | Mutation::Update(event) => &event.id,
            Mutation::Remove(id) => id,
        }
    }
}

/// Data-access abstraction the store is constructed with
pub trait EventBackend: Send + Sync {
    /// Apply the whole batch or none of it
    fn apply(&self, batch: Vec<Mutation>) -> Result<(), StorageError>;

    /// All versions of one event, oldest first; empty if unknown
    fn versions(&self, id: &EventId) -> Result<Vec<HazardEvent>, StorageError>;

    /// All versions of every event
    fn scan(&self) -> Result<VersionMap, StorageError>;
}

/// In-process backend holding versions in memory
#[derive(Default)]
pub struct MemoryBackend {
    events: RwLock<VersionMap>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-populated from a snapshot
    pub fn restore(events: VersionMap) -> Self {
        Self {
            events: RwLock::new(events),
        }
    }
}

impl EventBackend for MemoryBackend {
    fn apply(&self, batch: Vec<Mutation>) -> Result<(), StorageError> {
        let mut events = self.events.write();

        // Check the whole batch before touching anything
        let mut seen = HashSet::new();
        for mutation in &batch {
            let id = mutation.event_id();
            if !seen.insert(id.clone()) {
                return Err(StorageError::Duplicate(id.clone()));
            }
            match mutation {
                Mutation::Store(_) => {}
                Mutation::Update(_) | Mutation::Remove(_) => {
                    if !events.contains_key(id) {
                        return Err(StorageError::NotFound(id.clone()));
                    }
                }
            }
        }

        for mutation in batch {
            match mutation {
                Mutation::Store(event) | Mutation::Update(event) => {
                    events.entry(event.id.clone()).or_default().push(event);
                }
                Mutation::Remove(id) => {
                    events.remove(&id);
                }
            }
        }
        Ok(())
    }

    fn versions(&self, id: &EventId) -> Result<Vec<HazardEvent>, StorageError> {
        Ok(self.events.read().get(id).cloned().unwrap_or_default())
    }

    fn scan(&self) -> Result<VersionMap, StorageError> {
        Ok(self.events.read().clone())
    }
}

#[cfg(test)]
#[path = "backend_tests.rs"]
mod tests;
