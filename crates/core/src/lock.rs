// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-event lock status as seen from one workstation

use serde::{Deserialize, Serialize};
use std::fmt;

crate::define_id! {
    /// Identity of a forecaster workstation session; locks are owned by it.
    pub struct WorkstationId;
}

/// Lock status relative to the viewing workstation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LockStatus {
    Lockable,
    LockedByMe,
    LockedByOther,
}

impl fmt::Display for LockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LockStatus::Lockable => "LOCKABLE",
            LockStatus::LockedByMe => "LOCKED_BY_ME",
            LockStatus::LockedByOther => "LOCKED_BY_OTHER",
        })
    }
}

/// Answer to a lock query: who holds it (if anyone) and what that means to the viewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockInfo {
    pub workstation_id: Option<WorkstationId>,
    pub lock_status: LockStatus,
}

impl LockInfo {
    pub fn lockable() -> Self {
        Self {
            workstation_id: None,
            lock_status: LockStatus::Lockable,
        }
    }

    /// Status of a lock held by `holder`, as seen by `viewer`
    pub fn held(holder: &WorkstationId, viewer: &WorkstationId) -> Self {
        let lock_status = if holder == viewer {
            LockStatus::LockedByMe
        } else {
            LockStatus::LockedByOther
        };
        Self {
            workstation_id: Some(holder.clone()),
            lock_status,
        }
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
