// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compressed snapshots of the in-memory event versions.
//!
//! Written on shutdown and loaded at startup. The file is zstd-compressed
//! JSON, written to `.tmp`, fsynced, renamed into place, and the directory
//! fsynced so the rename itself survives a crash.

use crate::VersionMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

/// zstd level 3 balances speed and size for JSON
const COMPRESSION_LEVEL: i32 = 3;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub events: VersionMap,
    pub created_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(events: VersionMap) -> Self {
        Self {
            version: CURRENT_SNAPSHOT_VERSION,
            events,
            created_at: Utc::now(),
        }
    }

    /// Save atomically; returns the compressed size in bytes.
    pub fn save(&self, path: &Path) -> Result<u64, SnapshotError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec(self)?;
        let compressed = zstd::encode_all(json.as_slice(), COMPRESSION_LEVEL)?;

        let tmp_path = path.with_extension("tmp");
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&compressed)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, path)?;

        if let Some(parent) = path.parent() {
            File::open(parent)?.sync_all()?;
        }

        Ok(compressed.len() as u64)
    }

    /// Load the snapshot at `path`, if any.
    ///
    /// A file that cannot be decompressed or parsed is moved aside to `.bak`
    /// and `Ok(None)` is returned so startup proceeds with an empty store.
    pub fn load(path: &Path) -> Result<Option<Self>, SnapshotError> {
        if !path.exists() {
            return Ok(None);
        }

        match decode(path) {
            Ok(snapshot) if snapshot.version > CURRENT_SNAPSHOT_VERSION => {
                Err(SnapshotError::UnsupportedVersion {
                    found: snapshot.version,
                    supported: CURRENT_SNAPSHOT_VERSION,
                })
            }
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                let bak_path = rotate_bak_path(path);
                warn!(
                    error = %e,
                    path = %path.display(),
                    bak = %bak_path.display(),
                    "corrupt snapshot, moving to .bak and starting empty",
                );
                fs::rename(path, &bak_path)?;
                Ok(None)
            }
        }
    }
}

fn decode(path: &Path) -> Result<Snapshot, SnapshotError> {
    let bytes = zstd::decode_all(File::open(path)?)?;
    Ok(serde_json::from_slice(&bytes)?)
}

const MAX_BAK_FILES: u32 = 3;

/// Pick the next `.bak` path, shifting older backups to `.bak.2`, `.bak.3`.
///
/// The oldest backup is removed once [`MAX_BAK_FILES`] exist.
fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }

    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }

    bak(1)
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
