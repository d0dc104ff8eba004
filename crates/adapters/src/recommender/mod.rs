// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recommender execution hosts.
//!
//! A host runs the body of a named recommender against an event set and
//! returns the candidate events it produced. What a recommender computes is
//! the host's business; the engine only schedules and isolates it.

mod process;

pub use process::ProcessRecommenderHost;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeBehavior, FakeRecommenderHost, RecommenderCall};

use async_trait::async_trait;
use hz_core::{
    DialogInfo, EventSetPayload, HazardEvent, RecommenderInfo, RecommenderJobId, SpatialInfo,
};
use thiserror::Error;
use tokio::sync::watch;

/// Errors raised by a recommender or its host
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecommenderError {
    #[error("unknown recommender: {0}")]
    UnknownRecommender(String),
    #[error("recommender raised: {0}")]
    Raised(String),
    #[error("recommender exited with {code:?}: {stderr}")]
    Exited { code: Option<i32>, stderr: String },
    #[error("recommender produced unreadable output: {0}")]
    Output(String),
    #[error("recommender panicked: {0}")]
    Panicked(String),
    #[error("recommender host failed: {0}")]
    Host(String),
    #[error("recommender observed cancellation")]
    Cancelled,
}

/// Cooperative cancellation flag observed by a running recommender
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

/// Owner side of a [`CancelSignal`]
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl CancelSignal {
    /// A signal that never fires
    pub fn never() -> Self {
        cancel_pair().1
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested; pends forever if the handle
    /// is dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Everything a host needs to run one recommender job
#[derive(Debug, Clone)]
pub struct RecommenderInvocation {
    pub job_id: RecommenderJobId,
    pub name: String,
    pub input: EventSetPayload,
    pub spatial: SpatialInfo,
    pub dialog: DialogInfo,
    pub cancel: CancelSignal,
}

/// Adapter for running recommender bodies
#[async_trait]
pub trait RecommenderHost: Clone + Send + Sync + 'static {
    /// Recommenders this host can run
    async fn recommenders(&self) -> Result<Vec<RecommenderInfo>, RecommenderError>;

    /// Run one recommender to completion and return its candidate events
    async fn execute(
        &self,
        invocation: RecommenderInvocation,
    ) -> Result<Vec<HazardEvent>, RecommenderError>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
