// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error types

use hz_adapters::RecommenderError;
use hz_core::RecommenderJobId;
use std::time::Duration;
use thiserror::Error;

/// A recommender run that ended in failure, with the underlying cause
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("recommender {recommender} failed: {cause}")]
pub struct RecommenderFailure {
    pub recommender: String,
    #[source]
    pub cause: RecommenderError,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("recommender engine is stopped")]
    Stopped,
    #[error("unknown job: {0}")]
    UnknownJob(RecommenderJobId),
    #[error("job {0} already finished")]
    NotCancellable(RecommenderJobId),
    #[error("job {0} was cancelled")]
    Cancelled(RecommenderJobId),
    #[error("job {job_id} did not finish within {timeout:?}")]
    Timeout {
        job_id: RecommenderJobId,
        timeout: Duration,
    },
    #[error(transparent)]
    Failed(#[from] RecommenderFailure),
    #[error("recommender host: {0}")]
    Host(RecommenderError),
}
