// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Hazard coordination engine: actions, timers, locks, routing and
//! asynchronous recommender execution

mod action;
mod error;
mod lock;
mod recommender;
mod router;
mod timer;

pub use action::{ActionDispatchError, ActionError, ActionRegistry, HandlerFailure};
pub use error::{EngineError, RecommenderFailure};
pub use lock::{LockError, LockManager, DEFAULT_LOCK_SHARDS};
pub use recommender::{EngineConfig, JobListener, JobSummary, RecommenderEngine, ShutdownPolicy};
pub use router::{
    decode_payload, encode_payload, FnRoute, RemoteRoute, RequestRouter, Route, RouteContext,
    RoutingError,
};
pub use timer::{Timer, TimerNotice};
