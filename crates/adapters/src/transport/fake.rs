// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake transport for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{Transport, TransportError};
use async_trait::async_trait;
use hz_core::{RouteEnvelope, RouteReply};
use parking_lot::Mutex;
use std::sync::Arc;

type Responder = dyn Fn(&RouteEnvelope) -> Result<RouteReply, String> + Send + Sync;

struct FakeTransportState {
    sent: Vec<RouteEnvelope>,
}

/// Fake transport: records envelopes and answers through a closure.
///
/// A responder returning `Err` surfaces as [`TransportError::Unavailable`].
#[derive(Clone)]
pub struct FakeTransport {
    name: String,
    inner: Arc<Mutex<FakeTransportState>>,
    responder: Arc<Responder>,
}

impl FakeTransport {
    pub fn new(
        name: impl Into<String>,
        responder: impl Fn(&RouteEnvelope) -> Result<RouteReply, String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            inner: Arc::new(Mutex::new(FakeTransportState { sent: Vec::new() })),
            responder: Arc::new(responder),
        }
    }

    /// Replies `Ok` with a fixed payload
    pub fn replying(name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self::new(name, move |_| {
            Ok(RouteReply::Ok {
                payload: payload.clone(),
            })
        })
    }

    /// Every send fails as if the peer were down
    pub fn unreachable(name: impl Into<String>) -> Self {
        Self::new(name, |_| Err("peer down".to_string()))
    }

    /// Get all envelopes sent so far
    pub fn sent(&self) -> Vec<RouteEnvelope> {
        self.inner.lock().sent.clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, envelope: RouteEnvelope) -> Result<RouteReply, TransportError> {
        let reply = (self.responder)(&envelope);
        self.inner.lock().sent.push(envelope);
        reply.map_err(TransportError::Unavailable)
    }

    fn endpoint(&self) -> String {
        format!("fake:{}", self.name)
    }
}
