// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: state paths plus tunables from `hz.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use hz_engine::{EngineConfig, ShutdownPolicy, DEFAULT_LOCK_SHARDS};
use serde::{Deserialize, Serialize};

use crate::lifecycle::LifecycleError;

/// A service key served by another daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerConfig {
    pub key: String,
    pub socket: PathBuf,
}

/// Tunables read from `hz.toml`; every field has a default
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Name of this node in routing hop chains
    pub node: String,
    /// Site whose events this daemon stores
    pub site: String,
    pub max_jobs: usize,
    pub shutdown_policy: ShutdownPolicy,
    /// How long a routed recommender request waits for its job
    pub sync_timeout_ms: u64,
    pub lock_shards: usize,
    pub heartbeat_ms: u64,
    pub recommender_dir: Option<PathBuf>,
    pub peers: Vec<PeerConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            node: "local".to_string(),
            site: "XXX".to_string(),
            max_jobs: EngineConfig::default().max_concurrent_jobs,
            shutdown_policy: ShutdownPolicy::Drain,
            sync_timeout_ms: 30_000,
            lock_shards: DEFAULT_LOCK_SHARDS,
            heartbeat_ms: 60_000,
            recommender_dir: None,
            peers: Vec::new(),
        }
    }
}

impl Settings {
    /// Read `path`; a missing file yields the defaults
    pub fn read(path: &Path) -> Result<Self, LifecycleError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|source| LifecycleError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Environment overrides win over the file
    pub fn apply_env(&mut self) {
        if let Some(node) = crate::env::node() {
            self.node = node;
        }
        if let Some(max_jobs) = crate::env::max_jobs() {
            self.max_jobs = max_jobs;
        }
        if let Some(heartbeat) = crate::env::heartbeat() {
            self.heartbeat_ms = heartbeat.as_millis() as u64;
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_concurrent_jobs: self.max_jobs,
            shutdown_policy: self.shutdown_policy,
        }
    }

    pub fn sync_timeout(&self) -> Duration {
        Duration::from_millis(self.sync_timeout_ms)
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_millis(self.heartbeat_ms.max(1))
    }
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/hz)
    pub state_dir: PathBuf,
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Path to event snapshot file
    pub snapshot_path: PathBuf,
    /// Directory holding recommender scripts
    pub recommender_dir: PathBuf,
    pub settings: Settings,
}

impl Config {
    /// Load configuration for the user-level daemon.
    ///
    /// Uses fixed paths under `~/.local/state/hz/` (or `$XDG_STATE_HOME/hz/`).
    pub fn load() -> Result<Self, LifecycleError> {
        Self::for_state_dir(crate::env::state_dir()?)
    }

    /// Configuration rooted at `state_dir`, reading `hz.toml` there
    pub fn for_state_dir(state_dir: PathBuf) -> Result<Self, LifecycleError> {
        let mut settings = Settings::read(&state_dir.join("hz.toml"))?;
        settings.apply_env();
        Ok(Self::with_settings(state_dir, settings))
    }

    pub fn with_settings(state_dir: PathBuf, settings: Settings) -> Self {
        let recommender_dir = settings
            .recommender_dir
            .clone()
            .unwrap_or_else(|| state_dir.join("recommenders"));
        Self {
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.pid"),
            log_path: state_dir.join("daemon.log"),
            snapshot_path: state_dir.join("events.snapshot"),
            recommender_dir,
            settings,
            state_dir,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
