// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hazard coordination daemon library
//!
//! The composition root: configuration, the service wiring that owns every
//! shared registry, the socket listener and startup/shutdown.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
mod env;
pub mod lifecycle;
pub mod listener;
pub mod services;

pub use config::{Config, PeerConfig, Settings};
pub use lifecycle::{startup, DaemonServices, DaemonState, LifecycleError, StartupResult};
pub use listener::Listener;
pub use services::{EventsRoute, LocksRoute, RecommenderRoute, Services};
