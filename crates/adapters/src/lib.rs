// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for the collaborators the coordination layer talks to:
//! recommender execution hosts and remote routing transports.

mod env;
pub mod recommender;
pub mod subprocess;
pub mod traced;
pub mod transport;

pub use recommender::{
    cancel_pair, CancelHandle, CancelSignal, ProcessRecommenderHost, RecommenderError,
    RecommenderHost, RecommenderInvocation,
};
pub use traced::TracedRecommenderHost;
pub use transport::{wire, SocketTransport, Transport, TransportError};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use recommender::{FakeBehavior, FakeRecommenderHost, RecommenderCall};
#[cfg(any(test, feature = "test-support"))]
pub use transport::FakeTransport;
