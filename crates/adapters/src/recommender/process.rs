// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recommenders as executables in a script directory.
//!
//! Each executable file in the directory is one recommender, named by its
//! file name. A run writes the invocation as JSON on the script's stdin and
//! reads `{"events": [...]}` from its stdout.

use super::{RecommenderError, RecommenderHost, RecommenderInvocation};
use crate::subprocess::run_with_input;
use async_trait::async_trait;
use hz_core::{DialogInfo, EventSetPayload, HazardEvent, RecommenderInfo, SpatialInfo};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

#[derive(Serialize)]
struct ScriptInput<'a> {
    name: &'a str,
    input: &'a EventSetPayload,
    spatial: &'a SpatialInfo,
    dialog: &'a DialogInfo,
}

#[derive(Deserialize)]
struct ScriptOutput {
    events: Vec<HazardEvent>,
}

/// Runs recommenders as child processes
#[derive(Debug, Clone)]
pub struct ProcessRecommenderHost {
    dir: PathBuf,
    timeout: Duration,
}

impl ProcessRecommenderHost {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            timeout: crate::env::recommender_timeout(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn script_path(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() || name.contains('/') || name.starts_with('.') {
            return None;
        }
        let path = self.dir.join(name);
        path.is_file().then_some(path)
    }
}

#[async_trait]
impl RecommenderHost for ProcessRecommenderHost {
    async fn recommenders(&self) -> Result<Vec<RecommenderInfo>, RecommenderError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(RecommenderError::Host(e.to_string())),
        };

        let mut found = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| RecommenderError::Host(e.to_string()))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if self.script_path(&name).is_some() {
                found.push(RecommenderInfo {
                    name,
                    description: String::new(),
                    hazard_types: Vec::new(),
                });
            }
        }
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    async fn execute(
        &self,
        invocation: RecommenderInvocation,
    ) -> Result<Vec<HazardEvent>, RecommenderError> {
        let path = self
            .script_path(&invocation.name)
            .ok_or_else(|| RecommenderError::UnknownRecommender(invocation.name.clone()))?;

        let input = serde_json::to_vec(&ScriptInput {
            name: &invocation.name,
            input: &invocation.input,
            spatial: &invocation.spatial,
            dialog: &invocation.dialog,
        })
        .map_err(|e| RecommenderError::Host(e.to_string()))?;

        let mut cmd = Command::new(&path);
        cmd.current_dir(&self.dir);
        let description = format!("recommender {}", invocation.name);

        // Dropping the run future kills the child
        let output = tokio::select! {
            result = run_with_input(cmd, &input, self.timeout, &description) => {
                result.map_err(RecommenderError::Host)?
            }
            _ = invocation.cancel.cancelled() => return Err(RecommenderError::Cancelled),
        };

        if !output.status.success() {
            return Err(RecommenderError::Exited {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let parsed: ScriptOutput = serde_json::from_slice(&output.stdout)
            .map_err(|e| RecommenderError::Output(e.to_string()))?;
        Ok(parsed.events)
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
