// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake recommender host for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{RecommenderError, RecommenderHost, RecommenderInvocation};
use async_trait::async_trait;
use hz_core::{HazardEvent, RecommenderInfo, RecommenderJobId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// What a scripted recommender does when run
#[derive(Debug, Clone)]
pub enum FakeBehavior {
    /// Return these events
    Produce(Vec<HazardEvent>),
    /// Return the input events unchanged
    Echo,
    /// Raise an error
    Fail(String),
    /// Panic with this message
    Panic(String),
    /// Wait for [`FakeRecommenderHost::release`] (or cancellation), then echo
    Hold,
}

/// Recorded recommender run
#[derive(Debug, Clone)]
pub struct RecommenderCall {
    pub job_id: RecommenderJobId,
    pub name: String,
    pub input_ids: Vec<String>,
}

#[derive(Default)]
struct FakeHostState {
    behaviors: HashMap<String, FakeBehavior>,
    delays: HashMap<String, Duration>,
    calls: Vec<RecommenderCall>,
}

/// Fake recommender host for testing
#[derive(Clone)]
pub struct FakeRecommenderHost {
    inner: Arc<Mutex<FakeHostState>>,
    gate: Arc<Semaphore>,
    started: Arc<Semaphore>,
}

impl Default for FakeRecommenderHost {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeHostState::default())),
            gate: Arc::new(Semaphore::new(0)),
            started: Arc::new(Semaphore::new(0)),
        }
    }
}

impl FakeRecommenderHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script what `name` does; unscripted names are unknown recommenders
    pub fn set_behavior(&self, name: &str, behavior: FakeBehavior) {
        self.inner.lock().behaviors.insert(name.to_string(), behavior);
    }

    /// Sleep for `delay` before behaving (tokio time, so paused clocks apply)
    pub fn set_delay(&self, name: &str, delay: Duration) {
        self.inner.lock().delays.insert(name.to_string(), delay);
    }

    /// Let `n` held runs proceed
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    /// Wait until another run has started executing
    pub async fn wait_started(&self) {
        if let Ok(permit) = self.started.acquire().await {
            permit.forget();
        }
    }

    /// Get all recorded runs
    pub fn calls(&self) -> Vec<RecommenderCall> {
        self.inner.lock().calls.clone()
    }
}

#[async_trait]
impl RecommenderHost for FakeRecommenderHost {
    async fn recommenders(&self) -> Result<Vec<RecommenderInfo>, RecommenderError> {
        let mut names: Vec<String> = self.inner.lock().behaviors.keys().cloned().collect();
        names.sort();
        Ok(names
            .into_iter()
            .map(|name| RecommenderInfo {
                name,
                description: String::new(),
                hazard_types: Vec::new(),
            })
            .collect())
    }

    async fn execute(
        &self,
        invocation: RecommenderInvocation,
    ) -> Result<Vec<HazardEvent>, RecommenderError> {
        let (behavior, delay) = {
            let mut state = self.inner.lock();
            state.calls.push(RecommenderCall {
                job_id: invocation.job_id.clone(),
                name: invocation.name.clone(),
                input_ids: invocation
                    .input
                    .events
                    .iter()
                    .map(|e| e.id.to_string())
                    .collect(),
            });
            (
                state.behaviors.get(&invocation.name).cloned(),
                state.delays.get(&invocation.name).copied(),
            )
        };
        self.started.add_permits(1);

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match behavior {
            None => Err(RecommenderError::UnknownRecommender(invocation.name)),
            Some(FakeBehavior::Produce(events)) => Ok(events),
            Some(FakeBehavior::Echo) => Ok(invocation.input.events),
            Some(FakeBehavior::Fail(message)) => Err(RecommenderError::Raised(message)),
            Some(FakeBehavior::Panic(message)) => std::panic::panic_any(message),
            Some(FakeBehavior::Hold) => {
                tokio::select! {
                    permit = self.gate.acquire() => {
                        if let Ok(permit) = permit {
                            permit.forget();
                        }
                        Ok(invocation.input.events)
                    }
                    _ = invocation.cancel.cancelled() => Err(RecommenderError::Cancelled),
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
