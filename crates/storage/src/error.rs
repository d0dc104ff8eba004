// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::SnapshotError;
use hz_core::{EventId, TimeRangeError};
use thiserror::Error;

/// Errors returned by the event store and its backends
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("event not found: {0}")]
    NotFound(EventId),
    #[error("event {0} appears more than once in one batch")]
    Duplicate(EventId),
    #[error("field '{0}' has range semantics; use the spatial or temporal queries")]
    InvalidFilter(String),
    #[error("invalid time range: {0}")]
    InvalidRange(#[from] TimeRangeError),
    #[error("persistence backend failed: {0}")]
    Backend(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}
