// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Asynchronous recommender execution.
//!
//! Submissions go onto a FIFO queue drained by one dispatcher task, which
//! admits a job once a worker permit is free. Each admitted job runs its
//! recommender body in a task of its own, so a panic in the body surfaces
//! as a failure of that job only.
//!
//! Delivery contract: every job gets exactly one of
//! [`JobListener::job_finished`] / [`JobListener::job_failed`], unless it was
//! cancelled first, in which case it gets neither. The terminal transition
//! and the cancelled check happen under the job table lock, so once
//! [`RecommenderEngine::cancel`] returns `Ok` no callback will follow.

use crate::error::{EngineError, RecommenderFailure};
use hz_adapters::{
    cancel_pair, CancelHandle, CancelSignal, RecommenderError, RecommenderHost,
    RecommenderInvocation,
};
use hz_core::{
    describe_panic, DialogInfo, EventSet, IdGen, JobStatus, RecommenderInfo, RecommenderJobId,
    SpatialInfo, UuidIdGen,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Notify, OwnedSemaphorePermit, Semaphore};
use tokio::task::AbortHandle;

/// Terminal jobs kept around for status queries
const FINISHED_RETENTION: usize = 256;

/// Receives the outcome of a recommender job
pub trait JobListener: Send + Sync + 'static {
    fn job_finished(&self, job_id: &RecommenderJobId, result: EventSet);
    fn job_failed(&self, job_id: &RecommenderJobId, failure: RecommenderFailure);
}

/// What happens to in-flight jobs on shutdown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShutdownPolicy {
    /// Let queued and running jobs finish and deliver
    #[default]
    Drain,
    /// Cancel everything not yet terminal and abort bodies that ignore
    /// the cancel signal
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_concurrent_jobs: usize,
    pub shutdown_policy: ShutdownPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 4,
            shutdown_policy: ShutdownPolicy::Drain,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSummary {
    pub id: RecommenderJobId,
    pub name: String,
    pub status: JobStatus,
}

struct JobEntry {
    seq: u64,
    name: String,
    status: JobStatus,
    cancel: CancelHandle,
    /// Set while the recommender body task is alive
    body: Option<AbortHandle>,
}

#[derive(Default)]
struct JobTable {
    entries: HashMap<RecommenderJobId, JobEntry>,
    finished: VecDeque<RecommenderJobId>,
    next_seq: u64,
    /// Bodies currently executing, cancelled or not
    running: usize,
    /// Set by a cancelling shutdown; late bodies are aborted on spawn
    aborting: bool,
}

impl JobTable {
    fn settle(&mut self, id: &RecommenderJobId, status: JobStatus) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.status = status;
        }
        self.finished.push_back(id.clone());
        while self.finished.len() > FINISHED_RETENTION {
            if let Some(old) = self.finished.pop_front() {
                self.entries.remove(&old);
            }
        }
    }

    fn is_quiet(&self) -> bool {
        self.running == 0 && self.entries.values().all(|e| e.status.is_terminal())
    }
}

struct QueuedJob {
    id: RecommenderJobId,
    name: String,
    input: EventSet,
    spatial: SpatialInfo,
    dialog: DialogInfo,
    listener: Arc<dyn JobListener>,
    cancel: CancelSignal,
}

struct EngineInner<H> {
    host: H,
    ids: UuidIdGen,
    jobs: Mutex<JobTable>,
    queue: Mutex<Option<mpsc::UnboundedSender<QueuedJob>>>,
    idle: Notify,
    config: EngineConfig,
}

/// Runs named recommenders off the caller's path and reports back through
/// a [`JobListener`]
pub struct RecommenderEngine<H: RecommenderHost> {
    inner: Arc<EngineInner<H>>,
}

impl<H: RecommenderHost> Clone for RecommenderEngine<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H: RecommenderHost> RecommenderEngine<H> {
    /// Start an engine and its dispatcher task. Must be called inside a
    /// tokio runtime.
    pub fn new(host: H, config: EngineConfig) -> Self {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let inner = Arc::new(EngineInner {
            host,
            ids: UuidIdGen,
            jobs: Mutex::new(JobTable::default()),
            queue: Mutex::new(Some(queue_tx)),
            idle: Notify::new(),
            config,
        });
        let permits = Arc::new(Semaphore::new(inner.config.max_concurrent_jobs.max(1)));
        tokio::spawn(admit_jobs(Arc::downgrade(&inner), queue_rx, permits));
        Self { inner }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Queue `name` against `input` and return at once with the job id.
    ///
    /// The outcome arrives later on `listener`; recommender failures never
    /// come back through this call.
    pub fn run_recommender(
        &self,
        name: &str,
        input: EventSet,
        spatial: SpatialInfo,
        dialog: DialogInfo,
        listener: Arc<dyn JobListener>,
    ) -> Result<RecommenderJobId, EngineError> {
        // Held until the job is queued so shutdown cannot slip in between
        let queue = self.inner.queue.lock();
        let Some(tx) = queue.as_ref() else {
            return Err(EngineError::Stopped);
        };

        let id = RecommenderJobId::new(self.inner.ids.next());
        let (handle, signal) = cancel_pair();
        {
            let mut jobs = self.inner.jobs.lock();
            let seq = jobs.next_seq;
            jobs.next_seq += 1;
            jobs.entries.insert(
                id.clone(),
                JobEntry {
                    seq,
                    name: name.to_string(),
                    status: JobStatus::Pending,
                    cancel: handle,
                    body: None,
                },
            );
        }

        let job = QueuedJob {
            id: id.clone(),
            name: name.to_string(),
            input,
            spatial,
            dialog,
            listener,
            cancel: signal,
        };
        if tx.send(job).is_err() {
            self.inner.jobs.lock().entries.remove(&id);
            return Err(EngineError::Stopped);
        }
        drop(queue);

        tracing::info!(job_id = %id, recommender = name, "recommender job queued");
        Ok(id)
    }

    /// Run `name` and wait for its outcome, cancelling the job if `timeout`
    /// passes first
    pub async fn run_recommender_sync(
        &self,
        name: &str,
        input: EventSet,
        spatial: SpatialInfo,
        dialog: DialogInfo,
        timeout: Duration,
    ) -> Result<EventSet, EngineError> {
        let (tx, rx) = oneshot::channel();
        let listener = Arc::new(OneshotListener {
            tx: Mutex::new(Some(tx)),
        });
        let id = self.run_recommender(name, input, spatial, dialog, listener)?;

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(Ok(result))) => Ok(result),
            Ok(Ok(Err(failure))) => Err(EngineError::Failed(failure)),
            // Listener dropped without a callback: the job was cancelled
            Ok(Err(_)) => Err(EngineError::Cancelled(id)),
            Err(_) => {
                tracing::warn!(job_id = %id, ?timeout, "synchronous recommender wait timed out");
                let _ = self.cancel(&id);
                Err(EngineError::Timeout {
                    job_id: id,
                    timeout,
                })
            }
        }
    }

    /// Cancel a pending or running job.
    ///
    /// A running body is signalled but not preempted; its outcome is
    /// discarded. Cancelling an already-cancelled job succeeds again.
    pub fn cancel(&self, id: &RecommenderJobId) -> Result<(), EngineError> {
        {
            let mut jobs = self.inner.jobs.lock();
            let Some(entry) = jobs.entries.get(id) else {
                return Err(EngineError::UnknownJob(id.clone()));
            };
            match entry.status {
                JobStatus::Cancelled => return Ok(()),
                JobStatus::Succeeded | JobStatus::Failed => {
                    return Err(EngineError::NotCancellable(id.clone()));
                }
                JobStatus::Pending | JobStatus::Running => {
                    entry.cancel.cancel();
                    jobs.settle(id, JobStatus::Cancelled);
                }
            }
        }
        tracing::info!(job_id = %id, "recommender job cancelled");
        self.inner.idle.notify_waiters();
        Ok(())
    }

    pub fn status(&self, id: &RecommenderJobId) -> Option<JobStatus> {
        self.inner.jobs.lock().entries.get(id).map(|e| e.status)
    }

    /// Pending and running jobs in submission order
    pub fn active_jobs(&self) -> Vec<JobSummary> {
        let jobs = self.inner.jobs.lock();
        let mut active: Vec<(u64, JobSummary)> = jobs
            .entries
            .iter()
            .filter(|(_, e)| !e.status.is_terminal())
            .map(|(id, e)| {
                (
                    e.seq,
                    JobSummary {
                        id: id.clone(),
                        name: e.name.clone(),
                        status: e.status,
                    },
                )
            })
            .collect();
        active.sort_by_key(|(seq, _)| *seq);
        active.into_iter().map(|(_, summary)| summary).collect()
    }

    pub async fn recommenders(&self) -> Result<Vec<RecommenderInfo>, EngineError> {
        self.inner.host.recommenders().await.map_err(EngineError::Host)
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.queue.lock().is_none()
    }

    /// Refuse new submissions, then drain or cancel what is in flight.
    ///
    /// Returns once no job is pending or running and no recommender body
    /// is still executing. Under [`ShutdownPolicy::Cancel`] live bodies are
    /// aborted at their next await point.
    pub async fn shutdown(&self, policy: ShutdownPolicy) {
        if self.inner.queue.lock().take().is_some() {
            tracing::info!(?policy, "recommender engine shutting down");
        }

        if policy == ShutdownPolicy::Cancel {
            let pending: Vec<RecommenderJobId> =
                self.active_jobs().into_iter().map(|job| job.id).collect();
            for id in pending {
                let _ = self.cancel(&id);
            }
            let mut jobs = self.inner.jobs.lock();
            jobs.aborting = true;
            for (id, entry) in &jobs.entries {
                if let Some(body) = &entry.body {
                    tracing::debug!(job_id = %id, "aborting recommender body");
                    body.abort();
                }
            }
        }

        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.inner.jobs.lock().is_quiet() {
                break;
            }
            notified.await;
        }
        tracing::info!("recommender engine stopped");
    }
}

/// Dispatcher: admits queued jobs in order as permits free up
async fn admit_jobs<H: RecommenderHost>(
    engine: Weak<EngineInner<H>>,
    mut queue: mpsc::UnboundedReceiver<QueuedJob>,
    permits: Arc<Semaphore>,
) {
    while let Some(job) = queue.recv().await {
        let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
            break;
        };
        let Some(inner) = engine.upgrade() else {
            break;
        };

        let admitted = {
            let mut jobs = inner.jobs.lock();
            let pending = jobs
                .entries
                .get(&job.id)
                .is_some_and(|e| e.status == JobStatus::Pending);
            if pending {
                if let Some(entry) = jobs.entries.get_mut(&job.id) {
                    entry.status = JobStatus::Running;
                }
                jobs.running += 1;
            }
            pending
        };
        if !admitted {
            tracing::debug!(job_id = %job.id, "skipping cancelled job");
            continue;
        }

        tracing::debug!(job_id = %job.id, recommender = %job.name, "recommender job admitted");
        tokio::spawn(run_job(inner, job, permit));
    }
    tracing::debug!("recommender dispatcher finished");
}

async fn run_job<H: RecommenderHost>(
    inner: Arc<EngineInner<H>>,
    job: QueuedJob,
    permit: OwnedSemaphorePermit,
) {
    let QueuedJob {
        id,
        name,
        input,
        spatial,
        dialog,
        listener,
        cancel,
    } = job;

    let invocation = RecommenderInvocation {
        job_id: id.clone(),
        name: name.clone(),
        input: input.to_payload(),
        spatial,
        dialog,
        cancel,
    };
    let host = inner.host.clone();
    let body = tokio::spawn(async move { host.execute(invocation).await });
    {
        let mut jobs = inner.jobs.lock();
        if jobs.aborting {
            body.abort();
        } else if let Some(entry) = jobs.entries.get_mut(&id) {
            entry.body = Some(body.abort_handle());
        }
    }
    let outcome = match body.await {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(RecommenderError::Panicked(describe_panic(e.into_panic()))),
        Err(e) => Err(RecommenderError::Host(e.to_string())),
    };

    // Candidates go through the input set's validators and inherit its context
    let outcome = outcome
        .map(|events| {
            let mut result = input.derive();
            let accepted = result.add_all(&events);
            if accepted < events.len() {
                tracing::info!(
                    job_id = %id,
                    rejected = events.len() - accepted,
                    "dropped invalid candidates"
                );
            }
            result
        })
        .map_err(|cause| RecommenderFailure {
            recommender: name.clone(),
            cause,
        });

    let deliver = {
        let mut jobs = inner.jobs.lock();
        jobs.running = jobs.running.saturating_sub(1);
        if let Some(entry) = jobs.entries.get_mut(&id) {
            entry.body = None;
        }
        let running = jobs
            .entries
            .get(&id)
            .is_some_and(|e| e.status == JobStatus::Running);
        if running {
            let status = if outcome.is_ok() {
                JobStatus::Succeeded
            } else {
                JobStatus::Failed
            };
            jobs.settle(&id, status);
        }
        running
    };
    drop(permit);

    if deliver {
        let delivered = match outcome {
            Ok(result) => {
                tracing::info!(
                    job_id = %id,
                    recommender = %name,
                    events = result.len(),
                    "recommender job finished"
                );
                catch_unwind(AssertUnwindSafe(|| listener.job_finished(&id, result)))
            }
            Err(failure) => {
                tracing::warn!(job_id = %id, error = %failure, "recommender job failed");
                catch_unwind(AssertUnwindSafe(|| listener.job_failed(&id, failure)))
            }
        };
        if let Err(payload) = delivered {
            tracing::error!(
                job_id = %id,
                panic = %describe_panic(payload),
                "job listener panicked"
            );
        }
    } else {
        tracing::debug!(job_id = %id, "discarding outcome of cancelled job");
    }

    inner.idle.notify_waiters();
}

/// Listener that hands the outcome to a synchronous waiter
struct OneshotListener {
    tx: Mutex<Option<oneshot::Sender<Result<EventSet, RecommenderFailure>>>>,
}

impl JobListener for OneshotListener {
    fn job_finished(&self, _job_id: &RecommenderJobId, result: EventSet) {
        if let Some(tx) = self.tx.lock().take() {
            let _ = tx.send(Ok(result));
        }
    }

    fn job_failed(&self, _job_id: &RecommenderJobId, failure: RecommenderFailure) {
        if let Some(tx) = self.tx.lock().take() {
            let _ = tx.send(Err(failure));
        }
    }
}

#[cfg(test)]
#[path = "recommender_tests.rs"]
mod tests;
