// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recommender job bookkeeping types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

crate::define_id! {
    /// Identifier of one recommender run.
    pub struct RecommenderJobId;
}

/// Where a job is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Running => "RUNNING",
            JobStatus::Succeeded => "SUCCEEDED",
            JobStatus::Failed => "FAILED",
            JobStatus::Cancelled => "CANCELLED",
        })
    }
}

macro_rules! info_map {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub BTreeMap<String, Value>);

        impl $name {
            pub fn new() -> Self {
                Self::default()
            }

            pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
                self.0.insert(key.into(), value.into());
                self
            }

            pub fn get(&self, key: &str) -> Option<&Value> {
                self.0.get(key)
            }
        }
    };
}

info_map! {
    /// Spatial input gathered from the map before a run (drawn shapes, selected points)
    SpatialInfo
}

info_map! {
    /// Values the forecaster entered in the recommender's dialog
    DialogInfo
}

/// What a recommender host can run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommenderInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Hazard types this recommender proposes
    #[serde(default)]
    pub hazard_types: Vec<String>,
}

#[cfg(test)]
#[path = "recommender_tests.rs"]
mod tests;
