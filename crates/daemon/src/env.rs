// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Resolve state directory: HZ_STATE_DIR > XDG_STATE_HOME/hz > ~/.local/state/hz
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("HZ_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("hz"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/hz"))
}

/// Node name override
pub fn node() -> Option<String> {
    std::env::var("HZ_NODE").ok().filter(|s| !s.is_empty())
}

/// Concurrent recommender job limit override
pub fn max_jobs() -> Option<usize> {
    std::env::var("HZ_MAX_JOBS")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
}

/// Heartbeat period override
pub fn heartbeat() -> Option<Duration> {
    std::env::var("HZ_HEARTBEAT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}
