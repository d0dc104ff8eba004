// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-event mutual exclusion between workstations.
//!
//! The lock table is split into shards by event id. Every operation on one
//! id takes that id's shard lock, so operations on one id are linearized
//! while different ids rarely contend. State changes are posted to the
//! attached [`ActionRegistry`] after the shard lock is released.

use crate::ActionRegistry;
use hz_core::{EventId, LockInfo, WorkstationId};
use parking_lot::RwLock;
use serde_json::json;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use thiserror::Error;

pub const DEFAULT_LOCK_SHARDS: usize = 16;

/// Action names posted on lock state changes
pub mod actions {
    pub const ACQUIRED: &str = "lock.acquired";
    pub const RELEASED: &str = "lock.released";
    pub const BROKEN: &str = "lock.broken";
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LockError {
    #[error("event {event_id} is locked by {holder}")]
    Conflict {
        event_id: EventId,
        holder: WorkstationId,
    },
    #[error("{workstation} does not hold the lock on {event_id}")]
    NotOwner {
        event_id: EventId,
        workstation: WorkstationId,
        holder: Option<WorkstationId>,
    },
}

type Shard = RwLock<HashMap<EventId, WorkstationId>>;

pub struct LockManager {
    shards: Vec<Shard>,
    actions: Option<Arc<ActionRegistry>>,
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_SHARDS)
    }
}

impl LockManager {
    pub fn new(shard_count: usize) -> Self {
        Self {
            shards: (0..shard_count.max(1))
                .map(|_| RwLock::new(HashMap::new()))
                .collect(),
            actions: None,
        }
    }

    /// Post `lock.*` actions to `actions` on every state change
    pub fn with_actions(mut self, actions: Arc<ActionRegistry>) -> Self {
        self.actions = Some(actions);
        self
    }

    fn shard(&self, event_id: &EventId) -> &Shard {
        let mut hasher = DefaultHasher::new();
        event_id.hash(&mut hasher);
        let index = (hasher.finish() % self.shards.len() as u64) as usize;
        &self.shards[index]
    }

    /// Take the lock on `event_id` for `workstation`.
    ///
    /// Re-acquiring a lock already held by the caller succeeds without a
    /// state change.
    pub fn acquire(
        &self,
        event_id: &EventId,
        workstation: &WorkstationId,
    ) -> Result<LockInfo, LockError> {
        {
            let mut shard = self.shard(event_id).write();
            match shard.get(event_id) {
                Some(holder) if holder == workstation => {
                    return Ok(LockInfo::held(holder, workstation));
                }
                Some(holder) => {
                    return Err(LockError::Conflict {
                        event_id: event_id.clone(),
                        holder: holder.clone(),
                    });
                }
                None => {
                    shard.insert(event_id.clone(), workstation.clone());
                }
            }
        }
        tracing::debug!(%event_id, %workstation, "lock acquired");
        self.post(actions::ACQUIRED, event_id, workstation);
        Ok(LockInfo::held(workstation, workstation))
    }

    /// Release a lock the caller holds
    pub fn release(
        &self,
        event_id: &EventId,
        workstation: &WorkstationId,
    ) -> Result<(), LockError> {
        {
            let mut shard = self.shard(event_id).write();
            match shard.get(event_id) {
                Some(holder) if holder == workstation => {
                    shard.remove(event_id);
                }
                other => {
                    return Err(LockError::NotOwner {
                        event_id: event_id.clone(),
                        workstation: workstation.clone(),
                        holder: other.cloned(),
                    });
                }
            }
        }
        tracing::debug!(%event_id, %workstation, "lock released");
        self.post(actions::RELEASED, event_id, workstation);
        Ok(())
    }

    /// Lock state of `event_id` as seen by `viewer`
    pub fn query(&self, event_id: &EventId, viewer: &WorkstationId) -> LockInfo {
        match self.shard(event_id).read().get(event_id) {
            Some(holder) => LockInfo::held(holder, viewer),
            None => LockInfo::lockable(),
        }
    }

    pub fn holder(&self, event_id: &EventId) -> Option<WorkstationId> {
        self.shard(event_id).read().get(event_id).cloned()
    }

    /// Events `workstation` currently holds, sorted
    pub fn held_by(&self, workstation: &WorkstationId) -> Vec<EventId> {
        let mut held: Vec<EventId> = self
            .shards
            .iter()
            .flat_map(|shard| {
                shard
                    .read()
                    .iter()
                    .filter(|(_, holder)| *holder == workstation)
                    .map(|(id, _)| id.clone())
                    .collect::<Vec<_>>()
            })
            .collect();
        held.sort();
        held
    }

    /// Drop every lock `workstation` holds (its session ended)
    pub fn release_all(&self, workstation: &WorkstationId) -> Vec<EventId> {
        let mut released = Vec::new();
        for shard in &self.shards {
            shard.write().retain(|id, holder| {
                if *holder == *workstation {
                    released.push(id.clone());
                    false
                } else {
                    true
                }
            });
        }
        released.sort();
        for event_id in &released {
            self.post(actions::RELEASED, event_id, workstation);
        }
        if !released.is_empty() {
            tracing::info!(%workstation, count = released.len(), "released all locks");
        }
        released
    }

    /// Forcibly return `event_id` to lockable, whoever holds it.
    ///
    /// Returns the previous holder, if there was one.
    pub fn break_lock(&self, event_id: &EventId, by: &WorkstationId) -> Option<WorkstationId> {
        let previous = self.shard(event_id).write().remove(event_id);
        if let Some(holder) = &previous {
            tracing::warn!(%event_id, %holder, breaker = %by, "lock broken");
            if let Some(registry) = &self.actions {
                let args = json!({
                    "eventId": event_id,
                    "workstationId": holder,
                    "brokenBy": by,
                });
                if let Err(e) = registry.post_action(actions::BROKEN, &args) {
                    tracing::warn!(error = %e, "lock action handlers failed");
                }
            }
        }
        previous
    }

    fn post(&self, action: &str, event_id: &EventId, workstation: &WorkstationId) {
        let Some(registry) = &self.actions else {
            return;
        };
        let args = json!({ "eventId": event_id, "workstationId": workstation });
        if let Err(e) = registry.post_action(action, &args) {
            tracing::warn!(error = %e, "lock action handlers failed");
        }
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
