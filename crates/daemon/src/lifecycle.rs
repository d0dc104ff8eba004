// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, checkpoints, shutdown.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use fs2::FileExt;
use hz_adapters::{ProcessRecommenderHost, TracedRecommenderHost};
use hz_core::{SystemClock, ValidatorRegistry};
use hz_storage::{MemoryBackend, Snapshot, StorageError};
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

use crate::config::Config;
use crate::services::Services;

/// Recommender host with concrete adapter types (wrapped with tracing)
pub type DaemonHost = TracedRecommenderHost<ProcessRecommenderHost>;

/// Services with the daemon's concrete collaborators
pub type DaemonServices = Services<DaemonHost, SystemClock>;

/// Daemon state during operation.
///
/// The listener is returned separately from startup to be spawned as a Listener task.
pub struct DaemonState {
    /// Configuration
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub services: DaemonServices,
    /// When daemon started
    pub start_time: Instant,
}

/// Result of daemon startup - includes both the daemon state and the listener.
pub struct StartupResult {
    pub daemon: DaemonState,
    /// The Unix socket listener to spawn as a task
    pub listener: UnixListener,
}

impl DaemonState {
    /// Write every stored event version to the snapshot file
    pub fn save_snapshot(&self) -> Result<u64, LifecycleError> {
        let events = self.services.store.export()?;
        let count = events.len();
        let bytes = Snapshot::new(events).save(&self.config.snapshot_path)?;
        info!(events = count, bytes, "saved snapshot");
        Ok(bytes)
    }

    /// Shutdown the daemon gracefully.
    ///
    /// Recommender jobs are drained or cancelled per the configured policy
    /// before the final snapshot is taken.
    pub async fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        // 1. Stop admitting recommender jobs and settle the ones in flight
        let policy = self.config.settings.shutdown_policy;
        self.services.engine.shutdown(policy).await;

        // 2. Final snapshot so the next startup resumes with every event
        if let Err(e) = self.save_snapshot() {
            warn!("Failed to save shutdown snapshot: {}", e);
        }

        // 3. Remove socket file (listener task stops when tokio runtime exits)
        if self.config.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.socket_path) {
                warn!("Failed to remove socket file: {}", e);
            }
        }

        // 4. Remove PID file
        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }

        // 5. Lock file is released automatically when self.lock_file is dropped

        info!("Daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("Invalid config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] hz_storage::SnapshotError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    match startup_inner(config).await {
        Ok(result) => Ok(result),
        Err(e) => {
            // Files behind a held lock belong to the running daemon
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

/// Inner startup logic - cleanup_on_failure called if this fails
async fn startup_inner(config: &Config) -> Result<StartupResult, LifecycleError> {
    // 1. Create state directory (needed for socket, lock, etc.)
    std::fs::create_dir_all(&config.state_dir)?;

    // 2. Acquire lock file FIRST - prevents races
    // Use OpenOptions to avoid truncating the file before we hold the lock,
    // which would wipe the running daemon's PID.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    // Write PID to lock file (truncate now that we hold the lock)
    use std::io::Write;
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file; // Drop mutability

    // 3. Load events from snapshot (if exists)
    let backend = match Snapshot::load(&config.snapshot_path)? {
        Some(snapshot) => {
            info!(
                events = snapshot.events.len(),
                taken = %snapshot.created_at,
                "Loaded snapshot"
            );
            MemoryBackend::restore(snapshot.events)
        }
        None => {
            info!("No snapshot found, starting with empty store");
            MemoryBackend::new()
        }
    };

    // 4. Set up adapters (wrapped with tracing for observability)
    let host = TracedRecommenderHost::new(ProcessRecommenderHost::new(
        config.recommender_dir.clone(),
    ));
    let services = Services::new(
        &config.settings,
        Arc::new(backend),
        host,
        SystemClock,
        Arc::new(ValidatorRegistry::new()),
    )?;
    info!(
        node = %config.settings.node,
        site = %config.settings.site,
        max_jobs = config.settings.max_jobs,
        peers = config.settings.peers.len(),
        "services ready"
    );

    // 5. Remove stale socket and bind (LAST - only after all validation passes)
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    Ok(StartupResult {
        daemon: DaemonState {
            config: config.clone(),
            lock_file,
            services,
            start_time: Instant::now(),
        },
        listener,
    })
}

fn cleanup_on_failure(config: &Config) {
    // Remove socket if we created it
    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }

    // Remove PID/lock file
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
