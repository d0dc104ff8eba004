// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transports that carry routed requests to another process

mod socket;
pub mod wire;

pub use socket::SocketTransport;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeTransport;

use async_trait::async_trait;
use hz_core::{RouteEnvelope, RouteReply};
use std::path::PathBuf;
use thiserror::Error;
use wire::ProtocolError;

/// Errors from transport operations
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("cannot reach {}: {source}", path.display())]
    Connect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// Carries an envelope to a remote router and returns its reply.
///
/// One call is one round trip; retries are the caller's decision.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn send(&self, envelope: RouteEnvelope) -> Result<RouteReply, TransportError>;

    /// Where requests go, for logs
    fn endpoint(&self) -> String;
}
