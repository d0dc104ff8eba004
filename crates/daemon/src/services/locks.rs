// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hazards.locks`: event locking over the router

use async_trait::async_trait;
use hz_core::{LockRefusal, LockRequest, LockResponse, ServiceRequest};
use hz_engine::{
    decode_payload, encode_payload, LockError, LockManager, Route, RouteContext, RoutingError,
};
use serde_json::Value;
use std::sync::Arc;

pub struct LocksRoute {
    locks: Arc<LockManager>,
}

impl LocksRoute {
    pub fn new(locks: Arc<LockManager>) -> Self {
        Self { locks }
    }

    pub fn serve(&self, request: LockRequest) -> LockResponse {
        let locks = &self.locks;
        match request {
            LockRequest::Acquire {
                event_id,
                workstation,
            } => match locks.acquire(&event_id, &workstation) {
                Ok(info) => LockResponse::Info { info },
                Err(e) => refused(e),
            },
            LockRequest::Release {
                event_id,
                workstation,
            } => match locks.release(&event_id, &workstation) {
                Ok(()) => LockResponse::Released { count: 1 },
                Err(e) => refused(e),
            },
            LockRequest::Query { event_id, viewer } => LockResponse::Info {
                info: locks.query(&event_id, &viewer),
            },
            LockRequest::ReleaseAll { workstation } => LockResponse::Released {
                count: locks.release_all(&workstation).len(),
            },
            LockRequest::Break { event_id, by } => LockResponse::Broken {
                previous: locks.break_lock(&event_id, &by),
            },
        }
    }
}

fn refused(error: LockError) -> LockResponse {
    let refusal = match error {
        LockError::Conflict { holder, .. } => LockRefusal::Conflict { holder },
        LockError::NotOwner { holder, .. } => LockRefusal::NotOwner { holder },
    };
    LockResponse::Refused { refusal }
}

#[async_trait]
impl Route for LocksRoute {
    async fn handle(
        &self,
        request: ServiceRequest,
        _ctx: RouteContext,
    ) -> Result<Value, RoutingError> {
        let body: LockRequest = decode_payload(&request)?;
        encode_payload(&request.key, &self.serve(body))
    }
}

#[cfg(test)]
#[path = "locks_tests.rs"]
mod tests;
