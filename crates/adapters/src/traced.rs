// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::recommender::{RecommenderError, RecommenderHost, RecommenderInvocation};
use async_trait::async_trait;
use hz_core::{HazardEvent, RecommenderInfo};
use tracing::Instrument;

/// Wrapper that adds tracing to any RecommenderHost
#[derive(Clone)]
pub struct TracedRecommenderHost<H> {
    inner: H,
}

impl<H> TracedRecommenderHost<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }
}

#[async_trait]
impl<H: RecommenderHost> RecommenderHost for TracedRecommenderHost<H> {
    async fn recommenders(&self) -> Result<Vec<RecommenderInfo>, RecommenderError> {
        let result = self.inner.recommenders().await;
        match &result {
            Ok(list) => tracing::debug!(count = list.len(), "listed recommenders"),
            Err(e) => tracing::warn!(error = %e, "listing recommenders failed"),
        }
        result
    }

    async fn execute(
        &self,
        invocation: RecommenderInvocation,
    ) -> Result<Vec<HazardEvent>, RecommenderError> {
        let span = tracing::info_span!(
            "recommender.execute",
            job_id = %invocation.job_id,
            name = %invocation.name,
        );
        async {
            tracing::info!(input_events = invocation.input.events.len(), "starting");
            let start = std::time::Instant::now();
            let result = self.inner.execute(invocation).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(events) => tracing::info!(elapsed_ms, produced = events.len(), "finished"),
                Err(RecommenderError::Cancelled) => tracing::info!(elapsed_ms, "cancelled"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "recommender failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
