// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Route that forwards requests to another process

use super::{Route, RouteContext, RoutingError};
use async_trait::async_trait;
use hz_adapters::Transport;
use hz_core::{RouteEnvelope, RouteReply, ServiceRequest};
use serde_json::Value;
use std::sync::Arc;

/// Forwards each request, with its hop chain, over a [`Transport`].
///
/// There is no retry here: a transport failure is returned as one
/// [`RoutingError::Transport`].
pub struct RemoteRoute {
    transport: Arc<dyn Transport>,
}

impl RemoteRoute {
    pub fn new(transport: impl Transport) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    pub fn endpoint(&self) -> String {
        self.transport.endpoint()
    }
}

#[async_trait]
impl Route for RemoteRoute {
    async fn handle(
        &self,
        request: ServiceRequest,
        ctx: RouteContext,
    ) -> Result<Value, RoutingError> {
        let key = request.key.clone();
        let endpoint = self.transport.endpoint();
        let envelope = RouteEnvelope {
            request,
            hops: ctx.hops().to_vec(),
        };

        tracing::debug!(%key, %endpoint, hops = envelope.hops.len(), "forwarding request");
        let reply = self
            .transport
            .send(envelope)
            .await
            .map_err(|e| RoutingError::Transport {
                key: key.clone(),
                endpoint: endpoint.clone(),
                message: e.to_string(),
            })?;

        match reply {
            RouteReply::Ok { payload } => Ok(payload),
            RouteReply::Err { kind, key, message } => {
                Err(RoutingError::from_reply(kind, key, message, &endpoint))
            }
        }
    }
}
